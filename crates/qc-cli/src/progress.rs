//! Terminal progress bar driven by the engine's progress callbacks.

use std::io::{self, IsTerminal};

use indicatif::{ProgressBar, ProgressStyle};
use qc_engine::{ProgressSink, RoutineOutcome, RoutineStatus};

const TEMPLATE: &str = "{spinner} [{bar:30}] {pos}/{len} {msg}";

pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    /// A bar on stderr, hidden when `hidden` is set or stderr is not a terminal.
    /// Its length is set once the engine reports the routine count.
    pub fn new(hidden: bool) -> Self {
        let bar = if hidden || !io::stderr().is_terminal() {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(0)
        };
        let style = ProgressStyle::with_template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(style);
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for BarProgress {
    fn routine_started(&mut self, _position: usize, total: usize, name: &str) {
        self.bar.set_length(total as u64);
        self.bar.set_message(name.to_string());
    }

    fn routine_finished(&mut self, outcome: &RoutineOutcome, total: usize) {
        self.bar.set_length(total as u64);
        if outcome.status == RoutineStatus::Failed {
            self.bar
                .println(format!("routine {} ('{}') failed", outcome.position, outcome.name));
        }
        self.bar.inc(1);
    }
}
