//! Serializable summary of a finished run, for persistence and display.

use std::collections::BTreeMap;

use qc_model::{DataRecord, Flag, Message, MessageId};
use serde::Serialize;

use crate::runner::{RoutineStatus, RunResult, RunState};

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub state: RunState,
    pub records: usize,
    pub messages: usize,
    pub duration_ms: u128,
    pub flag_counts: BTreeMap<Flag, usize>,
    pub routines: Vec<RoutineReport>,
    pub failures: Vec<FailureReport>,
    /// Records with at least one message, in line order.
    pub flagged_records: Vec<RecordReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoutineReport {
    pub position: usize,
    pub name: String,
    pub status: RoutineStatus,
    pub messages_added: usize,
    pub duration_ms: u128,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    pub position: usize,
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordReport {
    pub line: usize,
    pub flag: Flag,
    pub messages: Vec<MessageReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageReport {
    pub column_index: usize,
    pub column: String,
    pub flag: Flag,
    pub kind: String,
    pub value: String,
    pub summary: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<MessageId>,
}

impl From<&Message> for MessageReport {
    fn from(message: &Message) -> Self {
        Self {
            column_index: message.column_index(),
            column: message.column_name().to_string(),
            flag: message.flag(),
            kind: message.kind().to_string(),
            value: message.field_value().to_string(),
            summary: message.summary(),
            detail: message.detail(),
            cause: message.cause(),
        }
    }
}

impl From<&DataRecord> for RecordReport {
    fn from(record: &DataRecord) -> Self {
        Self {
            line: record.line(),
            flag: record.qc_flag(),
            messages: record.messages().iter().map(MessageReport::from).collect(),
        }
    }
}

impl RunReport {
    pub fn from_result(result: &RunResult) -> Self {
        let dataset = &result.dataset;
        Self {
            state: result.state,
            records: dataset.len(),
            messages: dataset.message_count(),
            duration_ms: result.duration.as_millis(),
            flag_counts: dataset.flag_counts(),
            routines: result
                .outcomes
                .iter()
                .map(|outcome| RoutineReport {
                    position: outcome.position,
                    name: outcome.name.clone(),
                    status: outcome.status,
                    messages_added: outcome.messages_added,
                    duration_ms: outcome.duration.as_millis(),
                })
                .collect(),
            failures: result
                .failures
                .iter()
                .map(|failure| FailureReport {
                    position: failure.position,
                    name: failure.name.clone(),
                    error: failure.error.to_string(),
                })
                .collect(),
            flagged_records: dataset
                .records()
                .iter()
                .filter(|record| !record.messages().is_empty())
                .map(RecordReport::from)
                .collect(),
        }
    }

    /// Messages of every flagged record, in line then attachment order.
    pub fn messages(&self) -> impl Iterator<Item = (usize, &MessageReport)> {
        self.flagged_records
            .iter()
            .flat_map(|record| record.messages.iter().map(move |m| (record.line, m)))
    }
}
