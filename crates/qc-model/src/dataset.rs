//! The records of one run together with their column layout.
//!
//! A [`Dataset`] owns every record of a run. Routines only ever see it
//! through a [`DatasetView`], which can read records and attach messages
//! but cannot add, remove, reorder or replace records, nor drop messages.

use std::collections::{BTreeMap, HashSet};

use crate::column::ColumnConfig;
use crate::error::{QcError, Result};
use crate::flag::Flag;
use crate::message::{Message, MessageId};
use crate::record::{DataRecord, FieldValue};

/// Line numbers and message counts captured before a routine runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageCheckpoint(Vec<(usize, usize)>);

impl MessageCheckpoint {
    pub fn total(&self) -> usize {
        self.0.iter().map(|(_, count)| count).sum()
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    columns: ColumnConfig,
    records: Vec<DataRecord>,
}

impl Dataset {
    /// Build a dataset. Lines must be strictly ascending and every record
    /// must have one value per configured column.
    pub fn new(columns: ColumnConfig, records: Vec<DataRecord>) -> Result<Self> {
        let mut previous = 0;
        for record in &records {
            if record.line() <= previous {
                return Err(QcError::LineOutOfOrder {
                    line: record.line(),
                    previous,
                });
            }
            if record.width() != columns.len() {
                return Err(QcError::RecordWidth {
                    line: record.line(),
                    expected: columns.len(),
                    actual: record.width(),
                });
            }
            previous = record.line();
        }
        Ok(Self { columns, records })
    }

    /// Build a dataset from value rows, numbering lines from 1.
    pub fn from_rows(columns: ColumnConfig, rows: Vec<Vec<FieldValue>>) -> Result<Self> {
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(index, values)| DataRecord::new(index + 1, values))
            .collect::<Result<Vec<_>>>()?;
        Self::new(columns, records)
    }

    pub fn columns(&self) -> &ColumnConfig {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[DataRecord] {
        &self.records
    }

    /// The append-only view handed to routines.
    pub fn view(&mut self) -> DatasetView<'_> {
        DatasetView { dataset: self }
    }

    pub fn into_records(self) -> Vec<DataRecord> {
        self.records
    }

    pub fn record(&self, line: usize) -> Result<&DataRecord> {
        let position = self.position(line)?;
        Ok(&self.records[position])
    }

    pub(crate) fn record_mut(&mut self, line: usize) -> Result<&mut DataRecord> {
        let position = self.position(line)?;
        Ok(&mut self.records[position])
    }

    fn position(&self, line: usize) -> Result<usize> {
        self.records
            .binary_search_by_key(&line, DataRecord::line)
            .map_err(|_| QcError::RecordNotFound { line })
    }

    /// Attach a message to the record on `line`. Any cause must already
    /// resolve, which keeps cause chains acyclic.
    pub fn add_message(&mut self, line: usize, message: Message) -> Result<MessageId> {
        if let Some(cause) = message.cause() {
            if self.resolve(cause).is_none() {
                return Err(QcError::UnresolvedCause { cause });
            }
        }
        self.record_mut(line)?.add_message(message)
    }

    /// Look up an attached message.
    pub fn resolve(&self, id: MessageId) -> Option<&Message> {
        self.record(id.line).ok()?.message(id.index)
    }

    /// Walk the cause chain starting at `id`, nearest cause first.
    pub fn cause_chain(&self, id: MessageId) -> Result<Vec<MessageId>> {
        let mut chain = Vec::new();
        let mut visited = HashSet::from([id]);
        let mut current = self
            .resolve(id)
            .ok_or(QcError::UnresolvedCause { cause: id })?
            .cause();
        while let Some(cause) = current {
            if !visited.insert(cause) {
                return Err(QcError::CauseCycle { message: id });
            }
            let message = self
                .resolve(cause)
                .ok_or(QcError::UnresolvedCause { cause })?;
            chain.push(cause);
            current = message.cause();
        }
        Ok(chain)
    }

    /// Check that every cause link resolves and no chain loops.
    pub fn verify_causes(&self) -> Result<()> {
        let mut verified: HashSet<MessageId> = HashSet::new();
        for record in &self.records {
            for (index, message) in record.messages().iter().enumerate() {
                let id = MessageId::new(record.line(), index);
                if message.cause().is_none() || verified.contains(&id) {
                    continue;
                }
                let chain = self.cause_chain(id)?;
                verified.insert(id);
                verified.extend(chain);
            }
        }
        Ok(())
    }

    pub fn checkpoint(&self) -> MessageCheckpoint {
        MessageCheckpoint(
            self.records
                .iter()
                .map(|r| (r.line(), r.messages().len()))
                .collect(),
        )
    }

    /// Check that the dataset only grew since `checkpoint`: the same lines
    /// in the same order, and no record lost a message.
    pub fn verify_checkpoint(&self, checkpoint: &MessageCheckpoint) -> Result<()> {
        if self.records.len() != checkpoint.0.len() {
            return Err(QcError::RecordCountChanged {
                expected: checkpoint.0.len(),
                actual: self.records.len(),
            });
        }
        for (record, &(line, count)) in self.records.iter().zip(&checkpoint.0) {
            if record.line() != line {
                return Err(QcError::LineChanged {
                    expected: line,
                    actual: record.line(),
                });
            }
            if record.messages().len() < count {
                return Err(QcError::MessagesRemoved {
                    line,
                    expected: count,
                    actual: record.messages().len(),
                });
            }
        }
        Ok(())
    }

    /// Remove every message attached after `checkpoint` was taken. Records
    /// whose line no longer matches the checkpoint are left alone.
    pub fn rollback(&mut self, checkpoint: &MessageCheckpoint) {
        for (record, &(line, count)) in self.records.iter_mut().zip(&checkpoint.0) {
            if record.line() == line {
                record.truncate_messages(count);
            }
        }
    }

    /// Total number of attached messages.
    pub fn message_count(&self) -> usize {
        self.records.iter().map(|r| r.messages().len()).sum()
    }

    /// Number of records at each overall flag. Every flag is present.
    pub fn flag_counts(&self) -> BTreeMap<Flag, usize> {
        let mut counts: BTreeMap<Flag, usize> = Flag::ALL.iter().map(|f| (*f, 0)).collect();
        for record in &self.records {
            *counts.entry(record.qc_flag()).or_default() += 1;
        }
        counts
    }

    /// Worst overall flag in the dataset.
    pub fn worst_flag(&self) -> Flag {
        self.records
            .iter()
            .map(DataRecord::qc_flag)
            .max()
            .unwrap_or_default()
    }
}

/// What a routine sees of the dataset: read access to every record and an
/// append-only way to attach messages.
#[derive(Debug)]
pub struct DatasetView<'a> {
    dataset: &'a mut Dataset,
}

impl DatasetView<'_> {
    pub fn columns(&self) -> &ColumnConfig {
        self.dataset.columns()
    }

    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    pub fn records(&self) -> &[DataRecord] {
        self.dataset.records()
    }

    pub fn record(&self, line: usize) -> Result<&DataRecord> {
        self.dataset.record(line)
    }

    pub fn resolve(&self, id: MessageId) -> Option<&Message> {
        self.dataset.resolve(id)
    }

    /// Attach `message` to the record on its own line.
    pub fn add_message(&mut self, message: Message) -> Result<MessageId> {
        self.dataset.add_message(message.line(), message)
    }
}
