//! Library side of the `qc` command: logging setup, input loading and the
//! run pipeline shared by the binary and its tests.

pub mod loader;
pub mod logging;
pub mod pipeline;
