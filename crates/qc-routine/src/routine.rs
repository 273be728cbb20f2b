//! The routine interface and parameter parsing helpers.

use std::str::FromStr;

use qc_model::{DatasetView, Flag};

use crate::error::{Result, RoutineError};

/// A unit of QC logic.
///
/// A routine is configured once with [`initialise`](Routine::initialise) and
/// then run over a whole dataset with
/// [`process_records`](Routine::process_records). It sees the dataset through
/// a [`DatasetView`], so it can only read records and attach messages.
/// Routines must report every internal failure as a [`RoutineError`] rather
/// than panicking.
pub trait Routine: Send {
    /// Validate and store parameters. Called exactly once per instance.
    fn initialise(&mut self, parameters: &[String]) -> Result<()>;

    /// Scan the records and attach messages to those that fail the rule.
    fn process_records(&mut self, dataset: &mut DatasetView<'_>) -> Result<()>;
}

/// Positional access to routine parameters with typed parsing.
#[derive(Debug, Clone, Copy)]
pub struct Parameters<'a> {
    values: &'a [String],
}

impl<'a> Parameters<'a> {
    /// Wrap `values`, requiring exactly `expected` of them.
    pub fn exact(values: &'a [String], expected: usize) -> Result<Self> {
        if values.len() != expected {
            return Err(RoutineError::ParameterCount {
                expected,
                actual: values.len(),
            });
        }
        Ok(Self { values })
    }

    /// A non-blank string, trimmed.
    pub fn text(&self, index: usize) -> Result<&'a str> {
        let value = self.raw(index)?.trim();
        if value.is_empty() {
            return Err(self.invalid(index, "must not be empty"));
        }
        Ok(value)
    }

    pub fn number(&self, index: usize) -> Result<f64> {
        let value = self.parse::<f64>(index, "expected a number")?;
        if !value.is_finite() {
            return Err(self.invalid(index, "must be finite"));
        }
        Ok(value)
    }

    pub fn positive_number(&self, index: usize) -> Result<f64> {
        let value = self.number(index)?;
        if value <= 0.0 {
            return Err(self.invalid(index, "must be greater than zero"));
        }
        Ok(value)
    }

    pub fn flag(&self, index: usize) -> Result<Flag> {
        self.parse::<Flag>(index, "expected a flag name or code")
    }

    fn parse<T: FromStr>(&self, index: usize, reason: &str) -> Result<T> {
        self.raw(index)?
            .trim()
            .parse::<T>()
            .map_err(|_| self.invalid(index, reason))
    }

    fn raw(&self, index: usize) -> Result<&'a str> {
        self.values
            .get(index)
            .map(String::as_str)
            .ok_or(RoutineError::ParameterCount {
                expected: index + 1,
                actual: self.values.len(),
            })
    }

    fn invalid(&self, index: usize, reason: &str) -> RoutineError {
        RoutineError::InvalidParameter {
            index,
            value: self.values.get(index).cloned().unwrap_or_default(),
            reason: reason.to_string(),
        }
    }
}

/// Store a configuration, refusing a second initialisation.
pub(crate) fn store_config<T>(slot: &mut Option<T>, config: T) -> Result<()> {
    if slot.is_some() {
        return Err(RoutineError::AlreadyInitialised);
    }
    *slot = Some(config);
    Ok(())
}
