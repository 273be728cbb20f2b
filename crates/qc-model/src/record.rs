//! Data records under validation.

use std::fmt;

use chrono::NaiveDateTime;

use crate::column::ColumnConfig;
use crate::error::{QcError, Result};
use crate::flag::Flag;
use crate::message::{Message, MessageId};

/// A typed field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Missing,
    Text(String),
    Number(f64),
    Boolean(bool),
    DateTime(NaiveDateTime),
}

impl FieldValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            FieldValue::DateTime(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Missing => "missing",
            FieldValue::Text(_) => "text",
            FieldValue::Number(_) => "numeric",
            FieldValue::Boolean(_) => "boolean",
            FieldValue::DateTime(_) => "datetime",
        }
    }
}

/// Raw rendering, as stored in [`Message::field_value`].
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Missing => Ok(()),
            FieldValue::Text(value) => f.write_str(value),
            FieldValue::Number(value) => write!(f, "{value}"),
            FieldValue::Boolean(value) => write!(f, "{value}"),
            FieldValue::DateTime(value) => write!(f, "{}", value.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

/// One row of a dataset with its accumulated QC messages.
///
/// The overall flag is a running maximum over the attached messages and is
/// only ever changed by attaching or rolling back messages.
#[derive(Debug, Clone)]
pub struct DataRecord {
    line: usize,
    values: Vec<FieldValue>,
    messages: Vec<Message>,
    flag: Flag,
}

impl DataRecord {
    pub fn new(line: usize, values: Vec<FieldValue>) -> Result<Self> {
        if line == 0 {
            return Err(QcError::InvalidLineNumber { line });
        }
        Ok(Self {
            line,
            values,
            messages: Vec::new(),
            flag: Flag::Good,
        })
    }

    /// 1-based line number, unique within a dataset.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn width(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    pub fn get_value(&self, index: usize) -> Result<&FieldValue> {
        self.values.get(index).ok_or(QcError::ColumnNotFound {
            index,
            width: self.values.len(),
        })
    }

    pub fn get_value_by_name(&self, columns: &ColumnConfig, name: &str) -> Result<&FieldValue> {
        self.get_value(columns.index_of(name)?)
    }

    /// Attach a message and fold its flag into the overall flag.
    ///
    /// Duplicates are not filtered. A cause on this same record must already
    /// be attached; causes on other records are checked by
    /// [`Dataset::add_message`](crate::Dataset::add_message) or by the engine.
    pub fn add_message(&mut self, message: Message) -> Result<MessageId> {
        if message.line() != self.line {
            return Err(QcError::LineMismatch {
                message_line: message.line(),
                record_line: self.line,
            });
        }
        if message.column_index() >= self.values.len() {
            return Err(QcError::ColumnNotFound {
                index: message.column_index(),
                width: self.values.len(),
            });
        }
        if let Some(cause) = message.cause() {
            if cause.line == self.line && cause.index >= self.messages.len() {
                return Err(QcError::UnresolvedCause { cause });
            }
        }
        self.flag = self.flag.max(message.flag());
        self.messages.push(message);
        Ok(MessageId::new(self.line, self.messages.len() - 1))
    }

    /// Worst flag among attached messages, `Good` if there are none.
    pub fn qc_flag(&self) -> Flag {
        self.flag
    }

    /// Messages in attachment order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    /// Drop messages beyond `len` and recompute the overall flag.
    pub(crate) fn truncate_messages(&mut self, len: usize) {
        if len >= self.messages.len() {
            return;
        }
        self.messages.truncate(len);
        self.flag = self
            .messages
            .iter()
            .map(Message::flag)
            .max()
            .unwrap_or_default();
    }
}
