//! Error types for flow-catalog

use crate::entry::EntryKind;

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error returned by third-party code (tasks, factories, importers).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while mutating or querying the catalog
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An entry with the same id is already registered in its category
    #[error("{kind} '{id}' is already registered")]
    DuplicateId { kind: EntryKind, id: String },

    /// No entry with this id exists in its category
    #[error("unknown {kind} '{id}'")]
    UnknownEntry { kind: EntryKind, id: String },

    /// A node type references a data type that is not (yet) registered
    #[error("node type '{node}' references unregistered data type '{data_type}'")]
    MissingDataType { node: String, data_type: String },

    /// A node factory failed to produce an instance
    #[error("cannot instantiate node type '{id}': {source}")]
    Instantiate {
        id: String,
        #[source]
        source: BoxError,
    },

    /// Third-party code panicked inside an isolation boundary
    #[error("panicked: {0}")]
    Panicked(String),
}
