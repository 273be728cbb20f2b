//! Spike detection: large jumps between consecutive values.

use qc_model::{DatasetView, Flag, Message, MessageFormat};

use crate::error::{Result, RoutineError};
use crate::routine::{Parameters, Routine, store_config};
use crate::routines::numeric_value;

#[derive(Debug)]
struct GradientMessage;

impl MessageFormat for GradientMessage {
    fn kind(&self) -> &'static str {
        "gradient"
    }

    fn summary(&self, message: &Message) -> String {
        format!("{} changes too quickly", message.column_name())
    }

    fn detail(&self, message: &Message) -> String {
        format!(
            "Line {}: {} value {} {}",
            message.line(),
            message.column_name(),
            message.field_value(),
            message.note().unwrap_or_default()
        )
    }
}

static FORMAT: GradientMessage = GradientMessage;

#[derive(Debug)]
struct Config {
    column: String,
    max_delta: f64,
}

/// Parameters: `[column, max_delta]`.
///
/// A value is QUESTIONABLE when it differs from the previous non-missing
/// value by more than `max_delta`.
#[derive(Debug, Default)]
pub struct GradientRoutine {
    config: Option<Config>,
}

impl GradientRoutine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Routine for GradientRoutine {
    fn initialise(&mut self, parameters: &[String]) -> Result<()> {
        let params = Parameters::exact(parameters, 2)?;
        let config = Config {
            column: params.text(0)?.to_string(),
            max_delta: params.positive_number(1)?,
        };
        store_config(&mut self.config, config)
    }

    fn process_records(&mut self, dataset: &mut DatasetView<'_>) -> Result<()> {
        let config = self.config.as_ref().ok_or(RoutineError::NotInitialised)?;
        let index = dataset.columns().index_of(&config.column)?;
        let name = dataset.columns().name(index)?.to_string();

        let mut findings = Vec::new();
        let mut previous: Option<f64> = None;
        for record in dataset.records() {
            // Non-finite values are treated as gaps.
            let Some(value) = numeric_value(record, index, &name)?.filter(|v| v.is_finite()) else {
                continue;
            };
            if let Some(last) = previous {
                let delta = (value - last).abs();
                if delta > config.max_delta {
                    let note = format!(
                        "changed by {delta} from {last} (limit {})",
                        config.max_delta
                    );
                    let message = Message::new(
                        index,
                        name.as_str(),
                        Flag::Questionable,
                        record.line(),
                        value.to_string(),
                    )?
                    .with_note(note)
                    .with_format(&FORMAT);
                    findings.push(message);
                }
            }
            previous = Some(value);
        }
        for message in findings {
            dataset.add_message(message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routines::test_support::{flags, numeric_dataset, params};

    #[test]
    fn flags_jumps_and_skips_gaps() {
        let mut routine = GradientRoutine::new();
        routine.initialise(&params(&["SST", "2"])).unwrap();
        let mut data = numeric_dataset(&[Some(10.0), Some(11.0), None, Some(15.0), Some(14.0), Some(10.0)]);
        routine.process_records(&mut data.view()).unwrap();

        assert_eq!(
            flags(&data),
            vec![
                Flag::Good,
                Flag::Good,
                Flag::Good,
                Flag::Questionable,
                Flag::Good,
                Flag::Questionable
            ]
        );
        assert_eq!(
            data.record(4).unwrap().messages()[0].detail(),
            "Line 4: SST value 15 changed by 4 from 11 (limit 2)"
        );
    }

    #[test]
    fn non_finite_values_are_gaps() {
        let mut routine = GradientRoutine::new();
        routine.initialise(&params(&["SST", "2"])).unwrap();
        let mut data = numeric_dataset(&[Some(10.0), Some(f64::NAN), Some(50.0), Some(90.0)]);
        routine.process_records(&mut data.view()).unwrap();

        assert_eq!(
            flags(&data),
            vec![Flag::Good, Flag::Good, Flag::Questionable, Flag::Questionable]
        );
        assert_eq!(
            data.record(3).unwrap().messages()[0].detail(),
            "Line 3: SST value 50 changed by 40 from 10 (limit 2)"
        );
    }

    #[test]
    fn delta_must_be_positive() {
        let mut routine = GradientRoutine::new();
        assert!(routine.initialise(&params(&["SST", "0"])).is_err());
    }

    #[test]
    fn initialise_twice_rejected() {
        let mut routine = GradientRoutine::new();
        routine.initialise(&params(&["SST", "1"])).unwrap();
        assert!(matches!(
            routine.initialise(&params(&["SST", "1"])),
            Err(RoutineError::AlreadyInitialised)
        ));
    }
}
