//! Per-category registry storage

use std::collections::BTreeMap;

use crate::data::DataTypeInfo;
use crate::entry::CatalogEntry;
use crate::error::{Error, Result};
use crate::node::NodeInfo;
use crate::parameter::ParameterTypeInfo;

/// Registry of one category of catalog entries, keyed by id.
///
/// Unlike a plain map, registering an id twice is an error: ids stay unique
/// for the lifetime of the registry.
#[derive(Debug, Clone)]
pub struct TypeRegistry<T> {
    entries: BTreeMap<String, T>,
}

pub type NodeRegistry = TypeRegistry<NodeInfo>;
pub type DataTypeRegistry = TypeRegistry<DataTypeInfo>;
pub type ParameterTypeRegistry = TypeRegistry<ParameterTypeInfo>;

impl<T: CatalogEntry> TypeRegistry<T> {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Register an entry.
    pub fn register(&mut self, entry: T) -> Result<()> {
        if self.entries.contains_key(entry.id()) {
            return Err(Error::DuplicateId {
                kind: T::KIND,
                id: entry.id().to_string(),
            });
        }
        self.entries.insert(entry.id().to_string(), entry);
        Ok(())
    }

    /// Remove an entry, returning it if it was registered.
    pub fn unregister(&mut self, id: &str) -> Option<T> {
        self.entries.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All registered ids (sorted).
    pub fn ids(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Iterate over entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    /// Entries contributed by one extension (sorted by id).
    pub fn by_source(&self, source: &str) -> Vec<&T> {
        self.entries
            .values()
            .filter(|entry| entry.source() == source)
            .collect()
    }
}

impl<T: CatalogEntry> Default for TypeRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryKind;
    use serde_json::json;

    fn param(id: &str, source: &str) -> ParameterTypeInfo {
        let mut info = ParameterTypeInfo::with_default(id, id.to_uppercase(), json!(null));
        info.set_source(source);
        info
    }

    #[test]
    fn test_empty_registry() {
        let registry = ParameterTypeRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = ParameterTypeRegistry::new();
        registry.register(param("integer", "core:base")).unwrap();

        assert!(registry.contains("integer"));
        assert_eq!(registry.get("integer").unwrap().name, "INTEGER");
        assert!(!registry.contains("float"));
    }

    #[test]
    fn test_duplicate_is_rejected_and_keeps_first() {
        let mut registry = ParameterTypeRegistry::new();
        registry.register(param("integer", "core:base")).unwrap();
        let err = registry.register(param("integer", "vendor:other")).unwrap_err();

        assert!(matches!(
            err,
            Error::DuplicateId { kind: EntryKind::ParameterType, ref id } if id == "integer"
        ));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("integer").unwrap().source(), "core:base");
    }

    #[test]
    fn test_ids_sorted() {
        let mut registry = ParameterTypeRegistry::new();
        registry.register(param("zeta", "a:b")).unwrap();
        registry.register(param("alpha", "a:b")).unwrap();
        assert_eq!(registry.ids(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_unregister_and_by_source() {
        let mut registry = ParameterTypeRegistry::new();
        registry.register(param("one", "a:b")).unwrap();
        registry.register(param("two", "c:d")).unwrap();

        assert_eq!(registry.by_source("a:b").len(), 1);
        assert!(registry.unregister("one").is_some());
        assert!(registry.unregister("one").is_none());
        assert!(registry.by_source("a:b").is_empty());
    }
}
