//! QC routines.
//!
//! A [`Routine`] is configured once from string parameters and then run
//! over a whole [`Dataset`](qc_model::Dataset), attaching messages to the
//! records that break its rule. Routines are looked up by name in a
//! [`RoutineRegistry`].
//!
//! Built-in routines:
//!
//! - `missing_value`: no value in a column
//! - `range_check`: questionable and bad numeric ranges
//! - `gradient`: jumps between consecutive values
//! - `constant_value`: values stuck for too long
//! - `flag_propagation`: copy a column's flag to a dependent column

pub mod error;
pub mod registry;
pub mod routine;
pub mod routines;

pub use error::{Result, RoutineError};
pub use registry::{RoutineDescriptor, RoutineFactory, RoutineRegistry};
pub use routine::{Parameters, Routine};
pub use routines::{
    ConstantValueRoutine, FlagPropagationRoutine, GradientRoutine, MissingValueRoutine,
    RangeCheckRoutine,
};
