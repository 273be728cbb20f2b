//! Carries a column's flag over to a dependent column.

use qc_model::{DatasetView, Flag, Message, MessageFormat, MessageId};

use crate::error::{Result, RoutineError};
use crate::routine::{Parameters, Routine, store_config};

#[derive(Debug)]
struct PropagatedMessage;

impl MessageFormat for PropagatedMessage {
    fn kind(&self) -> &'static str {
        "flag_propagation"
    }

    fn summary(&self, message: &Message) -> String {
        format!("{} inherits {}", message.column_name(), message.flag())
    }

    fn detail(&self, message: &Message) -> String {
        format!(
            "Line {}: {} is {} because {}",
            message.line(),
            message.column_name(),
            message.flag(),
            message.note().unwrap_or("a source column was flagged")
        )
    }
}

static FORMAT: PropagatedMessage = PropagatedMessage;

#[derive(Debug)]
struct Config {
    source: String,
    target: String,
}

/// Parameters: `[source column, target column]`.
///
/// For each record whose source column already carries a non-GOOD message,
/// adds a message of the same severity on the target column, caused by the
/// worst source message (the first one, on ties). Only messages attached by
/// earlier routines are seen.
#[derive(Debug, Default)]
pub struct FlagPropagationRoutine {
    config: Option<Config>,
}

impl FlagPropagationRoutine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Routine for FlagPropagationRoutine {
    fn initialise(&mut self, parameters: &[String]) -> Result<()> {
        let params = Parameters::exact(parameters, 2)?;
        let source = params.text(0)?;
        let target = params.text(1)?;
        if source.eq_ignore_ascii_case(target) {
            return Err(RoutineError::InvalidConfiguration {
                reason: format!("source and target are both '{source}'"),
            });
        }
        let config = Config {
            source: source.to_string(),
            target: target.to_string(),
        };
        store_config(&mut self.config, config)
    }

    fn process_records(&mut self, dataset: &mut DatasetView<'_>) -> Result<()> {
        let config = self.config.as_ref().ok_or(RoutineError::NotInitialised)?;
        let source = dataset.columns().index_of(&config.source)?;
        let target = dataset.columns().index_of(&config.target)?;
        let source_name = dataset.columns().name(source)?.to_string();
        let target_name = dataset.columns().name(target)?.to_string();

        let mut findings = Vec::new();
        for record in dataset.records() {
            let mut worst: Option<(usize, Flag)> = None;
            for (index, message) in record.messages().iter().enumerate() {
                if message.column_index() != source || message.flag().is_good() {
                    continue;
                }
                if worst.is_none_or(|(_, flag)| message.flag().worse_than(flag)) {
                    worst = Some((index, message.flag()));
                }
            }
            let Some((index, flag)) = worst else {
                continue;
            };
            let cause = MessageId::new(record.line(), index);
            let value = record.get_value(target)?.to_string();
            let message = Message::new(target, target_name.as_str(), flag, record.line(), value)?
                .with_cause(cause)
                .with_note(format!("{source_name} is {flag}"))
                .with_format(&FORMAT);
            findings.push(message);
        }
        for message in findings {
            dataset.add_message(message)?;
        }
        Ok(())
    }
}
