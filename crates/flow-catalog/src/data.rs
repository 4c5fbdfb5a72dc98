//! Data types
//!
//! Data flows between node slots. Every concrete data type documents how it
//! is laid out in storage and can be imported back from a storage folder.

use std::any::Any;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::entry::{CatalogEntry, EntryKind};
use crate::error::BoxError;

/// A piece of data produced or consumed by a node.
pub trait Data: fmt::Debug + Send + Sync {
    /// Id of the registered data type this value belongs to.
    fn data_type_id(&self) -> &str;

    fn as_any(&self) -> &dyn Any;
}

/// Imports a data value from a storage folder.
pub type Importer = Arc<dyn Fn(&Path) -> Result<Box<dyn Data>, BoxError> + Send + Sync>;

/// Registered data type.
#[derive(Clone)]
pub struct DataTypeInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Human-readable description of the storage layout.
    pub storage_documentation: Option<String>,
    /// Abstract types only group other types and are never imported.
    pub is_abstract: bool,
    source: String,
    importer: Option<Importer>,
}

impl DataTypeInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            storage_documentation: None,
            is_abstract: false,
            source: String::new(),
            importer: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_storage_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.storage_documentation = Some(documentation.into());
        self
    }

    pub fn with_importer<F>(mut self, importer: F) -> Self
    where
        F: Fn(&Path) -> Result<Box<dyn Data>, BoxError> + Send + Sync + 'static,
    {
        self.importer = Some(Arc::new(importer));
        self
    }

    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn has_importer(&self) -> bool {
        self.importer.is_some()
    }

    /// Import a value of this type from `storage`.
    pub fn import(&self, storage: &Path) -> Result<Box<dyn Data>, BoxError> {
        match &self.importer {
            Some(importer) => importer(storage),
            None => Err(format!("data type '{}' cannot be imported", self.id).into()),
        }
    }
}

impl CatalogEntry for DataTypeInfo {
    const KIND: EntryKind = EntryKind::DataType;

    fn id(&self) -> &str {
        &self.id
    }

    fn source(&self) -> &str {
        &self.source
    }

    fn set_source(&mut self, source: &str) {
        self.source = source.to_string();
    }
}

impl fmt::Debug for DataTypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataTypeInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("is_abstract", &self.is_abstract)
            .field("has_importer", &self.importer.is_some())
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
