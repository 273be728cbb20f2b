//! Hooks for the job layer: cooperative cancellation and progress reports.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::runner::RoutineOutcome;

/// Shared cancellation flag, checked between routine invocations.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Receives routine-level progress from a run.
pub trait ProgressSink {
    fn routine_started(&mut self, _position: usize, _total: usize, _name: &str) {}

    fn routine_finished(&mut self, _outcome: &RoutineOutcome, _total: usize) {}
}

/// Discards progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {}

/// Percentage of routines finished. An empty run is complete.
pub fn percent_complete(finished: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    finished.min(total) as f64 * 100.0 / total as f64
}
