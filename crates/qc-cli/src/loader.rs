//! Loading of column configuration, routine lists and CSV data from disk.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result, bail};
use qc_engine::RoutineSpec;
use qc_model::{ColumnConfig, Dataset, FieldValue};
use tracing::{debug, info, trace};

use crate::logging::redact_value;

/// Maximum file size for CSV loading (500 MB).
pub const MAX_CSV_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// Load the column configuration from a JSON array of `{name, type}` objects.
pub fn load_columns(path: &Path) -> Result<ColumnConfig> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let columns: ColumnConfig = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parse column configuration {}", path.display()))?;
    if columns.is_empty() {
        bail!("column configuration {} lists no columns", path.display());
    }
    debug!(columns = columns.len(), "column configuration loaded");
    Ok(columns)
}

/// Load the routine list, in run order.
pub fn load_routine_specs(path: &Path) -> Result<Vec<RoutineSpec>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let specs: Vec<RoutineSpec> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parse routine configuration {}", path.display()))?;
    debug!(routines = specs.len(), "routine configuration loaded");
    Ok(specs)
}

/// Load a CSV file into a dataset. Data row N becomes record line N.
///
/// The header must name every configured column exactly once; matching is
/// case-insensitive and the CSV may order columns differently. Extra CSV
/// columns are an error.
pub fn load_dataset(path: &Path, columns: ColumnConfig) -> Result<Dataset> {
    check_file_size(path, MAX_CSV_FILE_SIZE)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("open {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("read header of {}", path.display()))?
        .clone();
    let positions = header_positions(&headers, &columns)
        .with_context(|| format!("match header of {}", path.display()))?;

    let mut rows = Vec::new();
    for (row_index, row) in reader.records().enumerate() {
        let line = row_index + 1;
        let row = row.with_context(|| format!("read data line {line} of {}", path.display()))?;
        let mut values = Vec::with_capacity(columns.len());
        for (spec, &position) in columns.iter().zip(&positions) {
            let raw = row.get(position).unwrap_or("");
            trace!(line, column = %spec.name, value = redact_value(raw), "parse cell");
            values.push(spec.column_type.parse(raw, line, &spec.name)?);
        }
        rows.push(values);
    }

    let missing = rows
        .iter()
        .flatten()
        .filter(|value| matches!(value, FieldValue::Missing))
        .count();
    let dataset = Dataset::from_rows(columns, rows)?;
    info!(
        records = dataset.len(),
        missing_values = missing,
        path = %path.display(),
        "dataset loaded"
    );
    Ok(dataset)
}

/// Maps each configured column (by index) to its position in the CSV header.
fn header_positions(headers: &csv::StringRecord, columns: &ColumnConfig) -> Result<Vec<usize>> {
    let mut positions: Vec<Option<usize>> = vec![None; columns.len()];
    for (position, header) in headers.iter().enumerate() {
        let Ok(index) = columns.index_of(header) else {
            bail!("header column '{header}' is not in the column configuration");
        };
        if positions[index].replace(position).is_some() {
            bail!("header names column '{header}' more than once");
        }
    }
    let mut resolved = Vec::with_capacity(positions.len());
    for (index, position) in positions.into_iter().enumerate() {
        match position {
            Some(position) => resolved.push(position),
            None => bail!("header has no column '{}'", columns.name(index)?),
        }
    }
    Ok(resolved)
}

fn check_file_size(path: &Path, max_size: u64) -> Result<()> {
    let metadata =
        std::fs::metadata(path).with_context(|| format!("read metadata of {}", path.display()))?;
    if metadata.len() > max_size {
        bail!(
            "{} is {} bytes, larger than the {} byte limit",
            path.display(),
            metadata.len(),
            max_size
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qc_model::{ColumnSpec, ColumnType};

    fn columns() -> ColumnConfig {
        ColumnConfig::new(vec![
            ColumnSpec::new("Time", ColumnType::DateTime),
            ColumnSpec::new("SST", ColumnType::Numeric),
        ])
        .unwrap()
    }

    #[test]
    fn header_positions_allow_reordering() {
        let headers = csv::StringRecord::from(vec!["sst", "TIME"]);
        assert_eq!(header_positions(&headers, &columns()).unwrap(), vec![1, 0]);
    }

    #[test]
    fn header_positions_reject_missing_and_unknown() {
        let missing = csv::StringRecord::from(vec!["Time"]);
        let error = header_positions(&missing, &columns()).unwrap_err();
        assert!(error.to_string().contains("no column 'SST'"));

        let unknown = csv::StringRecord::from(vec!["Time", "SST", "Salinity"]);
        let error = header_positions(&unknown, &columns()).unwrap_err();
        assert!(error.to_string().contains("Salinity"));
    }

    #[test]
    fn header_positions_reject_duplicates() {
        let headers = csv::StringRecord::from(vec!["Time", "SST", "sst"]);
        assert!(header_positions(&headers, &columns()).is_err());
    }
}
