//! QC routine engine.
//!
//! The [`RoutineRunner`] takes a dataset and an ordered list of initialised
//! routines, runs each routine over the whole dataset in turn, and returns
//! the flagged dataset together with any routine failures. A failing
//! routine never stops the routines after it.
//!
//! # Example
//!
//! ```ignore
//! use qc_engine::{RoutineRunner, RoutineSpec, build_routines};
//! use qc_routine::RoutineRegistry;
//!
//! let registry = RoutineRegistry::with_builtins();
//! let specs = vec![RoutineSpec::new("range_check", &["SST", "0", "30", "-2", "35"])];
//! let routines = build_routines(&registry, &specs)?;
//! let result = RoutineRunner::new(routines).run(dataset)?;
//! for record in result.dataset.records() {
//!     println!("{}: {}", record.line(), record.qc_flag());
//! }
//! ```

pub mod configured;
pub mod error;
pub mod progress;
pub mod report;
pub mod runner;

pub use configured::{ConfiguredRoutine, RoutineSpec, build_routines};
pub use error::{EngineError, Result};
pub use progress::{CancellationToken, NoProgress, ProgressSink, percent_complete};
pub use report::{FailureReport, MessageReport, RecordReport, RoutineReport, RunReport};
pub use runner::{
    RoutineFailure, RoutineOutcome, RoutineRunner, RoutineStatus, RunResult, RunState,
};
