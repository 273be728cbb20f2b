//! QC findings attached to record fields.
//!
//! A [`Message`] is immutable once built. Its summary and detail text are
//! rendered on demand by a [`MessageFormat`] chosen by the routine that
//! raised it, so routine-specific wording never needs a message subtype.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{QcError, Result};
use crate::flag::Flag;

/// Address of an attached message: the record's line number and the
/// message's position in that record's message list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId {
    pub line: usize,
    pub index: usize,
}

impl MessageId {
    pub fn new(line: usize, index: usize) -> Self {
        Self { line, index }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} message {}", self.line, self.index)
    }
}

/// Renders the text of a message.
pub trait MessageFormat: fmt::Debug + Send + Sync {
    /// Stable identifier for the kind of finding.
    fn kind(&self) -> &'static str;

    /// Short text. Must not depend on the message's cause.
    fn summary(&self, message: &Message) -> String;

    /// Full explanation. Should mention the column name and line number.
    fn detail(&self, message: &Message) -> String;
}

/// Format used when a routine does not supply its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericMessage;

impl MessageFormat for GenericMessage {
    fn kind(&self) -> &'static str {
        "generic"
    }

    fn summary(&self, message: &Message) -> String {
        format!("{} is {}", message.column_name(), message.flag())
    }

    fn detail(&self, message: &Message) -> String {
        let mut text = format!(
            "Line {}: column {} (index {}) value '{}' flagged {}",
            message.line(),
            message.column_name(),
            message.column_index(),
            message.field_value(),
            message.flag()
        );
        if let Some(note) = message.note() {
            text.push_str(": ");
            text.push_str(note);
        }
        text
    }
}

static GENERIC: GenericMessage = GenericMessage;

/// One QC finding for one field of one record.
#[derive(Debug, Clone)]
pub struct Message {
    column_index: usize,
    column_name: String,
    flag: Flag,
    line: usize,
    field_value: String,
    cause: Option<MessageId>,
    note: Option<String>,
    format: &'static dyn MessageFormat,
}

impl Message {
    /// Create a message. Line numbers are 1-based.
    pub fn new(
        column_index: usize,
        column_name: impl Into<String>,
        flag: Flag,
        line: usize,
        field_value: impl Into<String>,
    ) -> Result<Self> {
        if line == 0 {
            return Err(QcError::InvalidLineNumber { line });
        }
        Ok(Self {
            column_index,
            column_name: column_name.into(),
            flag,
            line,
            field_value: field_value.into(),
            cause: None,
            note: None,
            format: &GENERIC,
        })
    }

    /// Link this message to the message it depends on.
    #[must_use]
    pub fn with_cause(mut self, cause: MessageId) -> Self {
        self.cause = Some(cause);
        self
    }

    /// Attach free text for the format to include in the detail.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: &'static dyn MessageFormat) -> Self {
        self.format = format;
        self
    }

    pub fn column_index(&self) -> usize {
        self.column_index
    }

    /// Column name bound at construction, independent of later schemas.
    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    pub fn flag(&self) -> Flag {
        self.flag
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn field_value(&self) -> &str {
        &self.field_value
    }

    pub fn cause(&self) -> Option<MessageId> {
        self.cause
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn kind(&self) -> &'static str {
        self.format.kind()
    }

    pub fn summary(&self) -> String {
        self.format.summary(self)
    }

    pub fn detail(&self) -> String {
        self.format.detail(self)
    }
}

// Identity for deduplication: (column, line, flag, value).
impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.column_index == other.column_index
            && self.line == other.line
            && self.flag == other.flag
            && self.field_value == other.field_value
    }
}

impl Eq for Message {}

impl Hash for Message {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.column_index.hash(state);
        self.line.hash(state);
        self.flag.hash(state);
        self.field_value.hash(state);
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}
