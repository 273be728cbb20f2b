//! The routine runner.
//!
//! A [`RoutineRunner`] is configured up front and consumed by
//! [`run`](RoutineRunner::run), which ends in one of the [`RunState`]s.
//! Routines run one after another over the whole dataset in configured
//! order, so a later routine sees every message left by earlier ones. A
//! routine that fails has its partial messages rolled back and the run
//! carries on with the next routine.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use qc_model::{Dataset, MessageCheckpoint};
use qc_routine::RoutineError;
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, info, info_span, warn};

use crate::configured::ConfiguredRoutine;
use crate::error::{EngineError, Result};
use crate::progress::{CancellationToken, NoProgress, ProgressSink};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Every routine ran to completion.
    Completed,
    /// At least one routine failed; the others still ran.
    PartiallyFailed,
    /// Cancellation was observed between routines.
    Cancelled,
}

impl RunState {
    pub fn as_str(self) -> &'static str {
        match self {
            RunState::Completed => "COMPLETED",
            RunState::PartiallyFailed => "PARTIALLY_FAILED",
            RunState::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutineStatus {
    Completed,
    Failed,
    /// Not run because the run was cancelled first.
    Skipped,
}

#[derive(Debug, Clone)]
pub struct RoutineOutcome {
    pub position: usize,
    pub name: String,
    pub status: RoutineStatus,
    /// Messages kept from this routine. Zero for failed routines.
    pub messages_added: usize,
    pub duration: Duration,
}

/// A routine that failed during processing, with the original error.
#[derive(Debug)]
pub struct RoutineFailure {
    pub position: usize,
    pub name: String,
    pub error: RoutineError,
}

impl fmt::Display for RoutineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "routine {} ('{}'): {}", self.position, self.name, self.error)
    }
}

/// Result of a run: the flagged dataset plus per-routine outcomes.
#[derive(Debug)]
pub struct RunResult {
    pub dataset: Dataset,
    pub state: RunState,
    pub outcomes: Vec<RoutineOutcome>,
    pub failures: Vec<RoutineFailure>,
    pub duration: Duration,
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        self.state == RunState::Completed
    }

    pub fn failed_routines(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|failure| failure.name.as_str())
    }
}

/// Runs an ordered list of routines over one dataset.
#[derive(Debug)]
pub struct RoutineRunner {
    routines: Vec<ConfiguredRoutine>,
    cancellation: CancellationToken,
}

impl RoutineRunner {
    pub fn new(routines: Vec<ConfiguredRoutine>) -> Self {
        Self {
            routines,
            cancellation: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn routines(&self) -> &[ConfiguredRoutine] {
        &self.routines
    }

    /// Refuse to start unless every routine was initialised.
    pub fn validate(&self) -> Result<()> {
        let uninitialised: Vec<String> = self
            .routines
            .iter()
            .filter(|routine| !routine.is_initialised())
            .map(|routine| routine.name().to_string())
            .collect();
        if uninitialised.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Configuration {
                routines: uninitialised,
            })
        }
    }

    pub fn run(self, dataset: Dataset) -> Result<RunResult> {
        self.run_with_progress(dataset, &mut NoProgress)
    }

    /// Run every routine in order and return the flagged dataset.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Configuration`] if any routine is not
    /// initialised. No record is touched in that case.
    pub fn run_with_progress(
        mut self,
        mut dataset: Dataset,
        progress: &mut dyn ProgressSink,
    ) -> Result<RunResult> {
        self.validate()?;

        let total = self.routines.len();
        let run_span = info_span!("qc_run", records = dataset.len(), routines = total);
        let _run_guard = run_span.enter();
        let started = Instant::now();
        debug!("qc run started");

        let mut outcomes = Vec::with_capacity(total);
        let mut failures = Vec::new();
        let mut cancelled = false;

        for (position, configured) in self.routines.iter_mut().enumerate() {
            if cancelled || self.cancellation.is_cancelled() {
                if !cancelled {
                    info!(position, "cancellation requested, skipping remaining routines");
                }
                cancelled = true;
                let outcome = RoutineOutcome {
                    position,
                    name: configured.name().to_string(),
                    status: RoutineStatus::Skipped,
                    messages_added: 0,
                    duration: Duration::ZERO,
                };
                progress.routine_finished(&outcome, total);
                outcomes.push(outcome);
                continue;
            }

            let name = configured.name().to_string();
            let routine_span = debug_span!("routine", position, name = %name);
            let _routine_guard = routine_span.enter();
            progress.routine_started(position, total, &name);

            let checkpoint = dataset.checkpoint();
            let routine_started = Instant::now();
            let result = run_isolated(configured, &mut dataset, &checkpoint);
            let duration = routine_started.elapsed();

            let outcome = match result {
                Ok(messages_added) => {
                    debug!(
                        messages_added,
                        duration_ms = duration.as_millis(),
                        "routine complete"
                    );
                    RoutineOutcome {
                        position,
                        name: name.clone(),
                        status: RoutineStatus::Completed,
                        messages_added,
                        duration,
                    }
                }
                Err(error) => {
                    dataset.rollback(&checkpoint);
                    warn!(error = %error, "routine failed, its messages were discarded");
                    failures.push(RoutineFailure {
                        position,
                        name: name.clone(),
                        error,
                    });
                    RoutineOutcome {
                        position,
                        name: name.clone(),
                        status: RoutineStatus::Failed,
                        messages_added: 0,
                        duration,
                    }
                }
            };
            progress.routine_finished(&outcome, total);
            outcomes.push(outcome);
        }

        let state = if cancelled {
            RunState::Cancelled
        } else if failures.is_empty() {
            RunState::Completed
        } else {
            RunState::PartiallyFailed
        };

        let duration = started.elapsed();
        info!(
            state = %state,
            failed = failures.len(),
            messages = dataset.message_count(),
            duration_ms = duration.as_millis(),
            "qc run finished"
        );

        Ok(RunResult {
            dataset,
            state,
            outcomes,
            failures,
            duration,
        })
    }
}

/// Run one routine, turning panics, lost records or messages and broken
/// cause links into errors. Returns the number of messages it attached.
fn run_isolated(
    configured: &mut ConfiguredRoutine,
    dataset: &mut Dataset,
    checkpoint: &MessageCheckpoint,
) -> std::result::Result<usize, RoutineError> {
    let routine = configured.routine_mut();
    let outcome =
        panic::catch_unwind(AssertUnwindSafe(|| routine.process_records(&mut dataset.view())));
    match outcome {
        Ok(result) => result?,
        Err(payload) => {
            return Err(RoutineError::processing(format!(
                "routine panicked: {}",
                panic_message(payload.as_ref())
            )));
        }
    }
    dataset.verify_checkpoint(checkpoint)?;
    dataset.verify_causes()?;
    Ok(dataset.message_count() - checkpoint.total())
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
