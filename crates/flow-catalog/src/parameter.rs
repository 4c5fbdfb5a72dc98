//! Parameter types
//!
//! A parameter type describes the value type of a node parameter. Values are
//! carried as [`serde_json::Value`]; the type decides how a default value is
//! created and how a value is deep-copied.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::entry::{CatalogEntry, EntryKind};
use crate::error::BoxError;

/// Behaviour contributed by an extension for one parameter type.
pub trait ParameterType: Send + Sync {
    /// Create the default value for a freshly instantiated parameter.
    fn new_default(&self) -> Result<Value, BoxError>;

    /// Deep-copy a value of this type.
    fn duplicate(&self, value: &Value) -> Result<Value, BoxError> {
        Ok(value.clone())
    }
}

/// Parameter type whose default is a fixed value.
#[derive(Debug, Clone)]
pub struct DefaultValue(pub Value);

impl ParameterType for DefaultValue {
    fn new_default(&self) -> Result<Value, BoxError> {
        Ok(self.0.clone())
    }
}

/// Registered parameter type.
#[derive(Clone)]
pub struct ParameterTypeInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    source: String,
    handler: Arc<dyn ParameterType>,
}

impl ParameterTypeInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, handler: impl ParameterType + 'static) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            source: String::new(),
            handler: Arc::new(handler),
        }
    }

    /// Parameter type with a constant default value and clone-based duplication.
    pub fn with_default(id: impl Into<String>, name: impl Into<String>, default: Value) -> Self {
        Self::new(id, name, DefaultValue(default))
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn new_default(&self) -> Result<Value, BoxError> {
        self.handler.new_default()
    }

    pub fn duplicate(&self, value: &Value) -> Result<Value, BoxError> {
        self.handler.duplicate(value)
    }
}

impl CatalogEntry for ParameterTypeInfo {
    const KIND: EntryKind = EntryKind::ParameterType;

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

impl fmt::Debug for ParameterTypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterTypeInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
