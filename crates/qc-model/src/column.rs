//! Column configuration: the stable mapping from column index to name and
//! declared type for one dataset.
//!
//! Routines should resolve columns by name through [`ColumnConfig::index_of`]
//! rather than hard-coding indices. Nothing enforces this; it is a contract.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{QcError, Result};
use crate::lookup::CaseInsensitiveLookup;
use crate::record::FieldValue;

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Declared semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Numeric,
    Boolean,
    #[serde(alias = "timestamp")]
    DateTime,
}

impl ColumnType {
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Numeric => "numeric",
            ColumnType::Boolean => "boolean",
            ColumnType::DateTime => "datetime",
        }
    }

    /// Parse a raw cell into a typed value. Blank cells are missing.
    pub fn parse(self, raw: &str, line: usize, column: &str) -> Result<FieldValue> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(FieldValue::Missing);
        }
        let parse_error = || QcError::ValueParse {
            line,
            column: column.to_string(),
            value: trimmed.to_string(),
            expected: self.as_str(),
        };
        match self {
            ColumnType::Text => Ok(FieldValue::Text(trimmed.to_string())),
            ColumnType::Numeric => trimmed
                .parse::<f64>()
                .map(FieldValue::Number)
                .map_err(|_| parse_error()),
            ColumnType::Boolean => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "t" | "yes" | "y" | "1" => Ok(FieldValue::Boolean(true)),
                "false" | "f" | "no" | "n" | "0" => Ok(FieldValue::Boolean(false)),
                _ => Err(parse_error()),
            },
            ColumnType::DateTime => parse_datetime(trimmed)
                .map(FieldValue::DateTime)
                .ok_or_else(parse_error),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

/// Name and type of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Ordered column layout of a dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<ColumnSpec>", into = "Vec<ColumnSpec>")]
pub struct ColumnConfig {
    columns: Vec<ColumnSpec>,
    lookup: CaseInsensitiveLookup,
}

impl ColumnConfig {
    /// Build a configuration. Names must be unique ignoring case.
    pub fn new(columns: Vec<ColumnSpec>) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.trim().to_ascii_uppercase()) {
                return Err(QcError::DuplicateColumn {
                    name: column.name.clone(),
                });
            }
        }
        let lookup = CaseInsensitiveLookup::new(columns.iter().map(|c| c.name.as_str()));
        Ok(Self { columns, lookup })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&ColumnSpec> {
        self.columns.get(index).ok_or(QcError::ColumnNotFound {
            index,
            width: self.columns.len(),
        })
    }

    pub fn name(&self, index: usize) -> Result<&str> {
        self.get(index).map(|column| column.name.as_str())
    }

    /// Resolve a column index by name, ignoring case.
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.lookup.get(name).ok_or_else(|| QcError::UnknownColumn {
            name: name.to_string(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }
}

impl TryFrom<Vec<ColumnSpec>> for ColumnConfig {
    type Error = QcError;

    fn try_from(columns: Vec<ColumnSpec>) -> Result<Self> {
        Self::new(columns)
    }
}

impl From<ColumnConfig> for Vec<ColumnSpec> {
    fn from(config: ColumnConfig) -> Self {
        config.columns
    }
}
