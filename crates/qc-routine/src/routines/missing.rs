//! Flags records with no value in a column.

use qc_model::{DatasetView, Flag, Message, MessageFormat};

use crate::error::{Result, RoutineError};
use crate::routine::{Parameters, Routine, store_config};

#[derive(Debug)]
struct MissingValueMessage;

impl MessageFormat for MissingValueMessage {
    fn kind(&self) -> &'static str {
        "missing_value"
    }

    fn summary(&self, message: &Message) -> String {
        format!("{} missing", message.column_name())
    }

    fn detail(&self, message: &Message) -> String {
        format!(
            "Line {}: no value for column {}",
            message.line(),
            message.column_name()
        )
    }
}

static FORMAT: MissingValueMessage = MissingValueMessage;

#[derive(Debug)]
struct Config {
    column: String,
    flag: Flag,
}

/// Parameters: `[column, flag]`.
#[derive(Debug, Default)]
pub struct MissingValueRoutine {
    config: Option<Config>,
}

impl MissingValueRoutine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Routine for MissingValueRoutine {
    fn initialise(&mut self, parameters: &[String]) -> Result<()> {
        let params = Parameters::exact(parameters, 2)?;
        let config = Config {
            column: params.text(0)?.to_string(),
            flag: params.flag(1)?,
        };
        if config.flag.is_good() {
            return Err(RoutineError::InvalidParameter {
                index: 1,
                value: parameters[1].clone(),
                reason: "a missing value cannot be flagged GOOD".to_string(),
            });
        }
        store_config(&mut self.config, config)
    }

    fn process_records(&mut self, dataset: &mut DatasetView<'_>) -> Result<()> {
        let config = self.config.as_ref().ok_or(RoutineError::NotInitialised)?;
        let index = dataset.columns().index_of(&config.column)?;
        let name = dataset.columns().name(index)?.to_string();

        let mut findings = Vec::new();
        for record in dataset.records() {
            if !record.get_value(index)?.is_missing() {
                continue;
            }
            let message = Message::new(index, name.as_str(), config.flag, record.line(), "")?
                .with_format(&FORMAT);
            findings.push(message);
        }
        for message in findings {
            dataset.add_message(message)?;
        }
        Ok(())
    }
}
