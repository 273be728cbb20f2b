//! Data model for the QC routine engine.
//!
//! - [`Flag`]: ordered severity levels with worse-wins merging
//! - [`Message`]: an immutable finding addressed to a column and line
//! - [`DataRecord`]: a row of typed values and its accumulated messages
//! - [`ColumnConfig`]: column index to name and type mapping
//! - [`Dataset`]: the records of one run, owned together
//! - [`DatasetView`]: the append-only access routines get to a dataset

pub mod column;
pub mod dataset;
pub mod error;
pub mod flag;
pub mod lookup;
pub mod message;
pub mod record;

pub use column::{ColumnConfig, ColumnSpec, ColumnType};
pub use dataset::{Dataset, DatasetView, MessageCheckpoint};
pub use error::{QcError, Result};
pub use flag::Flag;
pub use lookup::CaseInsensitiveLookup;
pub use message::{GenericMessage, Message, MessageFormat, MessageId};
pub use record::{DataRecord, FieldValue};
