//! Shared vocabulary for catalog entries

use std::fmt;

use serde::{Deserialize, Serialize};

/// The category a catalog entry belongs to.
///
/// Ids are unique per category, so a node type and a data type may share
/// the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryKind {
    /// A node type (`NodeInfo`)
    Node,
    /// A data type (`DataTypeInfo`)
    DataType,
    /// A parameter type (`ParameterTypeInfo`)
    ParameterType,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node => write!(f, "node type"),
            Self::DataType => write!(f, "data type"),
            Self::ParameterType => write!(f, "parameter type"),
        }
    }
}

/// Lightweight reference to a catalog entry, used in events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentRef {
    pub kind: EntryKind,
    pub id: String,
}

impl ContentRef {
    pub fn new(kind: EntryKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind, self.id)
    }
}

/// Common surface of everything stored in a [`TypeRegistry`](crate::TypeRegistry).
pub trait CatalogEntry: Clone {
    /// Category of this entry type.
    const KIND: EntryKind;

    /// Globally unique id within [`Self::KIND`].
    fn id(&self) -> &str;

    /// Id of the extension that contributed this entry.
    fn source(&self) -> &str;

    /// Attribute the entry to an extension.
    fn set_source(&mut self, source: &str);

    fn content_ref(&self) -> ContentRef {
        ContentRef::new(Self::KIND, self.id())
    }
}
