use thiserror::Error;

use crate::message::MessageId;

/// Errors raised by the QC data model.
#[derive(Debug, Error)]
pub enum QcError {
    /// A severity outside the closed set of flags was requested.
    #[error("invalid flag value: {value}")]
    InvalidFlag { value: String },

    /// A column index beyond the record or schema width was addressed.
    #[error("column {index} not found (record has {width} columns)")]
    ColumnNotFound { index: usize, width: usize },

    /// A column name that the column configuration does not define.
    #[error("unknown column '{name}'")]
    UnknownColumn { name: String },

    /// Two columns in one configuration share a name.
    #[error("duplicate column name '{name}'")]
    DuplicateColumn { name: String },

    /// Line numbers are 1-based.
    #[error("invalid line number {line}")]
    InvalidLineNumber { line: usize },

    /// Records must arrive in strictly ascending line order.
    #[error("line {line} is out of order (previous line was {previous})")]
    LineOutOfOrder { line: usize, previous: usize },

    /// No record in the dataset carries this line number.
    #[error("no record with line number {line}")]
    RecordNotFound { line: usize },

    /// A record's width does not match the column configuration.
    #[error("line {line} has {actual} values, expected {expected}")]
    RecordWidth {
        line: usize,
        expected: usize,
        actual: usize,
    },

    /// A message was attached to a record with a different line number.
    #[error("message for line {message_line} attached to line {record_line}")]
    LineMismatch {
        message_line: usize,
        record_line: usize,
    },

    /// A cause link does not point at an already attached message.
    #[error("cause {cause} does not resolve to an attached message")]
    UnresolvedCause { cause: MessageId },

    /// Following cause links from this message leads back to itself.
    #[error("cause chain starting at {message} is cyclic")]
    CauseCycle { message: MessageId },

    /// The number of records changed while a routine ran.
    #[error("record count changed from {expected} to {actual}")]
    RecordCountChanged { expected: usize, actual: usize },

    /// A record was replaced by one with a different line number.
    #[error("expected line {expected}, found line {actual}")]
    LineChanged { expected: usize, actual: usize },

    /// A record lost messages that were attached before a routine ran.
    #[error("line {line} had {expected} messages, now has {actual}")]
    MessagesRemoved {
        line: usize,
        expected: usize,
        actual: usize,
    },

    /// A raw value could not be parsed into the declared column type.
    #[error("line {line}, column '{column}': cannot parse '{value}' as {expected}")]
    ValueParse {
        line: usize,
        column: String,
        value: String,
        expected: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, QcError>;
