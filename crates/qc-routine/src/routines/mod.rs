//! Built-in routines.
//!
//! Each routine scans every record of the dataset in line order. None of
//! them assumes anything about the dataset's size or which lines exist.

mod constant;
mod gradient;
mod missing;
mod propagation;
mod range;

pub use constant::ConstantValueRoutine;
pub use gradient::GradientRoutine;
pub use missing::MissingValueRoutine;
pub use propagation::FlagPropagationRoutine;
pub use range::RangeCheckRoutine;

use qc_model::{DataRecord, FieldValue};

use crate::error::{Result, RoutineError};

/// Numeric value of a field; `None` when missing.
pub(crate) fn numeric_value(record: &DataRecord, index: usize, column: &str) -> Result<Option<f64>> {
    match record.get_value(index)? {
        FieldValue::Missing => Ok(None),
        FieldValue::Number(value) => Ok(Some(*value)),
        other => Err(RoutineError::Record {
            line: record.line(),
            reason: format!(
                "column {column} holds a {} value, expected numeric",
                other.type_name()
            ),
        }),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use qc_model::{ColumnConfig, ColumnSpec, ColumnType, Dataset, FieldValue, Flag};

    pub fn params(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    /// Single numeric column "SST".
    pub fn numeric_dataset(values: &[Option<f64>]) -> Dataset {
        let columns = ColumnConfig::new(vec![ColumnSpec::new("SST", ColumnType::Numeric)]).unwrap();
        let rows = values
            .iter()
            .map(|v| vec![v.map_or(FieldValue::Missing, FieldValue::Number)])
            .collect();
        Dataset::from_rows(columns, rows).unwrap()
    }

    pub fn flags(dataset: &Dataset) -> Vec<Flag> {
        dataset.records().iter().map(|r| r.qc_flag()).collect()
    }
}
