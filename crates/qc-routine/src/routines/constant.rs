//! Stuck-sensor detection: a value that does not change for too long.

use chrono::NaiveDateTime;
use qc_model::{DatasetView, FieldValue, Flag, Message, MessageFormat};

use crate::error::{Result, RoutineError};
use crate::routine::{Parameters, Routine, store_config};

#[derive(Debug)]
struct ConstantValueMessage;

impl MessageFormat for ConstantValueMessage {
    fn kind(&self) -> &'static str {
        "constant_value"
    }

    fn summary(&self, message: &Message) -> String {
        format!("{} constant", message.column_name())
    }

    fn detail(&self, message: &Message) -> String {
        format!(
            "Line {}: {} stayed at {} {}",
            message.line(),
            message.column_name(),
            message.field_value(),
            message.note().unwrap_or_default()
        )
    }
}

static FORMAT: ConstantValueMessage = ConstantValueMessage;

#[derive(Debug)]
struct Config {
    column: String,
    time_column: String,
    max_minutes: f64,
}

/// Current run of identical values.
struct Run {
    value: FieldValue,
    start: NaiveDateTime,
    end: NaiveDateTime,
    lines: Vec<usize>,
}

impl Run {
    fn minutes(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64 / 60.0
    }
}

/// Parameters: `[value column, time column, max minutes]`.
///
/// Every record in a run of consecutive identical values is QUESTIONABLE
/// when the run spans more than `max minutes`. A missing value ends a run.
#[derive(Debug, Default)]
pub struct ConstantValueRoutine {
    config: Option<Config>,
}

impl ConstantValueRoutine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Routine for ConstantValueRoutine {
    fn initialise(&mut self, parameters: &[String]) -> Result<()> {
        let params = Parameters::exact(parameters, 3)?;
        let config = Config {
            column: params.text(0)?.to_string(),
            time_column: params.text(1)?.to_string(),
            max_minutes: params.positive_number(2)?,
        };
        store_config(&mut self.config, config)
    }

    fn process_records(&mut self, dataset: &mut DatasetView<'_>) -> Result<()> {
        let config = self.config.as_ref().ok_or(RoutineError::NotInitialised)?;
        let index = dataset.columns().index_of(&config.column)?;
        let time_index = dataset.columns().index_of(&config.time_column)?;
        let name = dataset.columns().name(index)?.to_string();

        let mut flagged: Vec<(usize, String, f64)> = Vec::new();
        let mut current: Option<Run> = None;
        let mut last_time: Option<NaiveDateTime> = None;
        for record in dataset.records() {
            let value = record.get_value(index)?;
            if value.is_missing() {
                close_run(current.take(), config.max_minutes, &mut flagged);
                continue;
            }
            let time = record
                .get_value(time_index)?
                .as_datetime()
                .ok_or_else(|| RoutineError::Record {
                    line: record.line(),
                    reason: format!("column {} has no timestamp", config.time_column),
                })?;
            if last_time.is_some_and(|last| time < last) {
                return Err(RoutineError::Record {
                    line: record.line(),
                    reason: "timestamps are not in ascending order".to_string(),
                });
            }
            last_time = Some(time);
            if let Some(run) = current.as_mut() {
                if run.value == *value {
                    run.end = time;
                    run.lines.push(record.line());
                    continue;
                }
            }
            close_run(current.take(), config.max_minutes, &mut flagged);
            current = Some(Run {
                value: value.clone(),
                start: time,
                end: time,
                lines: vec![record.line()],
            });
        }
        close_run(current, config.max_minutes, &mut flagged);

        for (line, value, minutes) in flagged {
            let message = Message::new(index, name.as_str(), Flag::Questionable, line, value)?
                .with_note(format!(
                    "for {minutes} minutes (limit {})",
                    config.max_minutes
                ))
                .with_format(&FORMAT);
            dataset.add_message(message)?;
        }
        Ok(())
    }
}

fn close_run(run: Option<Run>, max_minutes: f64, flagged: &mut Vec<(usize, String, f64)>) {
    let Some(run) = run else {
        return;
    };
    let minutes = run.minutes();
    if run.lines.len() < 2 || minutes <= max_minutes {
        return;
    }
    let value = run.value.to_string();
    flagged.extend(run.lines.into_iter().map(|line| (line, value.clone(), minutes)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routines::test_support::{flags, params};
    use qc_model::{ColumnConfig, ColumnSpec, ColumnType, Dataset};

    fn dataset(rows: &[(&str, Option<f64>)]) -> Dataset {
        let columns = ColumnConfig::new(vec![
            ColumnSpec::new("Time", ColumnType::DateTime),
            ColumnSpec::new("SST", ColumnType::Numeric),
        ])
        .unwrap();
        let rows = rows
            .iter()
            .map(|(time, value)| {
                vec![
                    ColumnType::DateTime.parse(time, 0, "Time").unwrap(),
                    value.map_or(FieldValue::Missing, FieldValue::Number),
                ]
            })
            .collect();
        Dataset::from_rows(columns, rows).unwrap()
    }

    fn routine(minutes: &str) -> ConstantValueRoutine {
        let mut routine = ConstantValueRoutine::new();
        routine
            .initialise(&params(&["SST", "Time", minutes]))
            .unwrap();
        routine
    }

    #[test]
    fn long_run_is_flagged() {
        let mut data = dataset(&[
            ("2024-05-01T10:00:00", Some(5.0)),
            ("2024-05-01T10:10:00", Some(5.0)),
            ("2024-05-01T10:20:00", Some(5.0)),
            ("2024-05-01T10:30:00", Some(6.0)),
            ("2024-05-01T10:40:00", Some(6.0)),
        ]);
        routine("15").process_records(&mut data.view()).unwrap();

        assert_eq!(
            flags(&data),
            vec![
                Flag::Questionable,
                Flag::Questionable,
                Flag::Questionable,
                Flag::Good,
                Flag::Good
            ]
        );
        assert_eq!(
            data.record(1).unwrap().messages()[0].detail(),
            "Line 1: SST stayed at 5 for 20 minutes (limit 15)"
        );
    }

    #[test]
    fn missing_value_breaks_run() {
        let mut data = dataset(&[
            ("2024-05-01T10:00:00", Some(5.0)),
            ("2024-05-01T10:10:00", None),
            ("2024-05-01T10:20:00", Some(5.0)),
            ("2024-05-01T10:30:00", Some(5.0)),
        ]);
        routine("15").process_records(&mut data.view()).unwrap();
        assert!(flags(&data).iter().all(|f| f.is_good()));
    }

    #[test]
    fn descending_time_is_an_error() {
        let mut data = dataset(&[
            ("2024-05-01T10:10:00", Some(5.0)),
            ("2024-05-01T10:00:00", Some(5.0)),
        ]);
        assert!(matches!(
            routine("5").process_records(&mut data.view()),
            Err(RoutineError::Record { line: 2, .. })
        ));
    }

    #[test]
    fn descending_time_after_a_gap_is_an_error() {
        let mut data = dataset(&[
            ("2024-05-01T10:10:00", Some(5.0)),
            ("2024-05-01T10:15:00", None),
            ("2024-05-01T10:00:00", Some(5.0)),
        ]);
        assert!(matches!(
            routine("5").process_records(&mut data.view()),
            Err(RoutineError::Record { line: 3, .. })
        ));
    }
}
