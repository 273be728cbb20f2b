//! Load, configure and run: the path from files on disk to a finished run.

use std::path::Path;

use anyhow::{Context, Result};
use qc_engine::{ProgressSink, RoutineRunner, RunResult, RunState, build_routines};
use qc_model::Flag;
use qc_routine::RoutineRegistry;
use tracing::info;

use crate::loader::{load_columns, load_dataset, load_routine_specs};

/// Exit code for a run that finished with every routine completed.
pub const EXIT_COMPLETED: i32 = 0;
/// Exit code when the run could not start.
pub const EXIT_NOT_STARTED: i32 = 1;
/// Exit code when at least one routine failed or the run was cancelled.
pub const EXIT_PARTIALLY_FAILED: i32 = 2;
/// Exit code when a record reached the `--fail-on` flag.
pub const EXIT_FLAG_THRESHOLD: i32 = 3;

/// Input files for a run.
#[derive(Debug, Clone, Copy)]
pub struct RunInputs<'a> {
    pub data: &'a Path,
    pub columns: &'a Path,
    pub routines: &'a Path,
}

/// Load every input, initialise the routines and run them.
///
/// # Errors
///
/// Fails when an input cannot be loaded, a routine is unknown or rejects
/// its parameters. Routine failures during processing are not errors; they
/// are reported in the returned [`RunResult`].
pub fn run_pipeline(
    registry: &RoutineRegistry,
    inputs: RunInputs<'_>,
    progress: &mut dyn ProgressSink,
) -> Result<RunResult> {
    let columns = load_columns(inputs.columns)?;
    let specs = load_routine_specs(inputs.routines)?;
    let dataset = load_dataset(inputs.data, columns)?;
    let routines = build_routines(registry, &specs).context("configure routines")?;
    info!(routines = routines.len(), "routines initialised");
    let result = RoutineRunner::new(routines)
        .run_with_progress(dataset, progress)
        .context("start run")?;
    Ok(result)
}

/// Exit code for a finished run. The flag threshold wins over routine failures.
pub fn exit_code(state: RunState, worst: Flag, fail_on: Option<Flag>) -> i32 {
    if fail_on.is_some_and(|threshold| worst >= threshold) {
        return EXIT_FLAG_THRESHOLD;
    }
    match state {
        RunState::Completed => EXIT_COMPLETED,
        RunState::PartiallyFailed | RunState::Cancelled => EXIT_PARTIALLY_FAILED,
    }
}
