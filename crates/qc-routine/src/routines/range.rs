//! Two-tier range check on a numeric column.

use qc_model::{DatasetView, Flag, Message, MessageFormat};

use crate::error::{Result, RoutineError};
use crate::routine::{Parameters, Routine, store_config};
use crate::routines::numeric_value;

#[derive(Debug)]
struct RangeMessage;

impl MessageFormat for RangeMessage {
    fn kind(&self) -> &'static str {
        "range_check"
    }

    fn summary(&self, message: &Message) -> String {
        format!("{} out of range", message.column_name())
    }

    fn detail(&self, message: &Message) -> String {
        format!(
            "Line {}: {} value {} is outside the {} range {}",
            message.line(),
            message.column_name(),
            message.field_value(),
            message.flag(),
            message.note().unwrap_or_default()
        )
    }
}

static FORMAT: RangeMessage = RangeMessage;

#[derive(Debug, Clone, Copy)]
struct Bounds {
    min: f64,
    max: f64,
}

impl Bounds {
    fn contains(self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    fn describe(self) -> String {
        format!("[{}, {}]", self.min, self.max)
    }
}

#[derive(Debug)]
struct Config {
    column: String,
    questionable: Bounds,
    bad: Bounds,
}

/// Parameters: `[column, questionable_min, questionable_max, bad_min, bad_max]`.
///
/// Values outside the bad range are BAD, values outside only the
/// questionable range are QUESTIONABLE. Missing values are ignored.
#[derive(Debug, Default)]
pub struct RangeCheckRoutine {
    config: Option<Config>,
}

impl RangeCheckRoutine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Routine for RangeCheckRoutine {
    fn initialise(&mut self, parameters: &[String]) -> Result<()> {
        let params = Parameters::exact(parameters, 5)?;
        let questionable = Bounds {
            min: params.number(1)?,
            max: params.number(2)?,
        };
        let bad = Bounds {
            min: params.number(3)?,
            max: params.number(4)?,
        };
        if !(bad.min <= questionable.min
            && questionable.min <= questionable.max
            && questionable.max <= bad.max)
        {
            return Err(RoutineError::InvalidConfiguration {
                reason: format!(
                    "questionable range {} must lie within bad range {}",
                    questionable.describe(),
                    bad.describe()
                ),
            });
        }
        let config = Config {
            column: params.text(0)?.to_string(),
            questionable,
            bad,
        };
        store_config(&mut self.config, config)
    }

    fn process_records(&mut self, dataset: &mut DatasetView<'_>) -> Result<()> {
        let config = self.config.as_ref().ok_or(RoutineError::NotInitialised)?;
        let index = dataset.columns().index_of(&config.column)?;
        let name = dataset.columns().name(index)?.to_string();

        let mut findings = Vec::new();
        for record in dataset.records() {
            let Some(value) = numeric_value(record, index, &name)? else {
                continue;
            };
            let (flag, bounds) = if !config.bad.contains(value) {
                (Flag::Bad, config.bad)
            } else if !config.questionable.contains(value) {
                (Flag::Questionable, config.questionable)
            } else {
                continue;
            };
            let message = Message::new(index, name.as_str(), flag, record.line(), value.to_string())?
                .with_note(bounds.describe())
                .with_format(&FORMAT);
            findings.push(message);
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
    use qc_model::{ColumnConfig, ColumnSpec, ColumnType, FieldValue};

    fn routine() -> RangeCheckRoutine {
        let mut routine = RangeCheckRoutine::new();
        routine
            .initialise(&params(&["SST", "0", "30", "-2", "35"]))
            .unwrap();
        routine
    }

    #[test]
    fn two_tier_flags() {
        let mut data = numeric_dataset(&[Some(10.0), Some(31.0), Some(36.0), None, Some(-2.0), Some(-3.5)]);
        routine().process_records(&mut data.view()).unwrap();
        assert_eq!(
            flags(&data),
            vec![
                Flag::Good,
                Flag::Questionable,
                Flag::Bad,
                Flag::Good,
                Flag::Questionable,
                Flag::Bad
            ]
        );
        let message = &data.record(3).unwrap().messages()[0];
        assert_eq!(message.field_value(), "36");
        assert_eq!(
            message.detail(),
            "Line 3: SST value 36 is outside the BAD range [-2, 35]"
        );
    }

    #[test]
    fn boundaries_are_inclusive() {
        let mut data = numeric_dataset(&[Some(0.0), Some(30.0), Some(35.0)]);
        routine().process_records(&mut data.view()).unwrap();
        assert_eq!(flags(&data), vec![Flag::Good, Flag::Good, Flag::Questionable]);
    }

    #[test]
    fn inconsistent_ranges_rejected() {
        let mut routine = RangeCheckRoutine::new();
        let result = routine.initialise(&params(&["SST", "0", "40", "-2", "35"]));
        assert!(matches!(result, Err(RoutineError::InvalidConfiguration { .. })));
    }

    #[test]
    fn non_numeric_parameter_rejected() {
        let mut routine = RangeCheckRoutine::new();
        let result = routine.initialise(&params(&["SST", "low", "30", "-2", "35"]));
        assert!(matches!(result, Err(RoutineError::InvalidParameter { index: 1, .. })));
    }

    #[test]
    fn text_value_is_a_record_error() {
        let columns = ColumnConfig::new(vec![ColumnSpec::new("SST", ColumnType::Text)]).unwrap();
        let mut data = qc_model::Dataset::from_rows(
            columns,
            vec![vec![FieldValue::Text("warm".into())]],
        )
        .unwrap();
        assert!(matches!(
            routine().process_records(&mut data.view()),
            Err(RoutineError::Record { line: 1, .. })
        ));
    }
}
