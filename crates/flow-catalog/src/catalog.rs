//! The catalog aggregate: node, data and parameter types of one session.

use std::sync::Arc;

use crate::data::DataTypeInfo;
use crate::entry::{CatalogEntry, ContentRef, EntryKind};
use crate::error::{Error, Result};
use crate::events::{
    DatatypeRegistered, EventBus, ExtensionContentAdded, ExtensionContentRemoved,
    NodeInfoRegistered, SessionId,
};
use crate::node::{GraphNode, NodeExample, NodeInfo};
use crate::parameter::ParameterTypeInfo;
use crate::registry::{DataTypeRegistry, NodeRegistry, ParameterTypeRegistry};

/// All registered node types, data types and parameter types.
///
/// Every successful registration and every removal is published on the
/// [`EventBus`] the catalog was created with.
#[derive(Debug)]
pub struct Catalog {
    session: SessionId,
    events: Arc<EventBus>,
    nodes: NodeRegistry,
    data_types: DataTypeRegistry,
    parameter_types: ParameterTypeRegistry,
    examples: Vec<NodeExample>,
}

impl Catalog {
    pub fn new(session: SessionId, events: Arc<EventBus>) -> Self {
        Self {
            session,
            events,
            nodes: NodeRegistry::new(),
            data_types: DataTypeRegistry::new(),
            parameter_types: ParameterTypeRegistry::new(),
            examples: Vec::new(),
        }
    }

    /// Catalog with its own session and event bus.
    pub fn detached() -> Self {
        Self::new(SessionId::next(), Arc::new(EventBus::new()))
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn nodes(&self) -> &NodeRegistry {
        &self.nodes
    }

    pub fn data_types(&self) -> &DataTypeRegistry {
        &self.data_types
    }

    pub fn parameter_types(&self) -> &ParameterTypeRegistry {
        &self.parameter_types
    }

    /// Total number of registered entries across all categories.
    pub fn len(&self) -> usize {
        self.nodes.len() + self.data_types.len() + self.parameter_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, kind: EntryKind, id: &str) -> bool {
        match kind {
            EntryKind::Node => self.nodes.contains(id),
            EntryKind::DataType => self.data_types.contains(id),
            EntryKind::ParameterType => self.parameter_types.contains(id),
        }
    }

    /// Every entry contributed by `extension_id`.
    pub fn content_of(&self, extension_id: &str) -> Vec<ContentRef> {
        let mut content: Vec<ContentRef> = Vec::new();
        content.extend(self.nodes.by_source(extension_id).into_iter().map(CatalogEntry::content_ref));
        content.extend(
            self.data_types
                .by_source(extension_id)
                .into_iter()
                .map(CatalogEntry::content_ref),
        );
        content.extend(
            self.parameter_types
                .by_source(extension_id)
                .into_iter()
                .map(CatalogEntry::content_ref),
        );
        content
    }

    pub fn register_parameter_type(&mut self, info: ParameterTypeInfo) -> Result<()> {
        let content = info.content_ref();
        let source = info.source().to_string();
        self.parameter_types.register(info)?;
        tracing::debug!(extension = %source, "registered {}", content);
        self.content_added(source, content);
        Ok(())
    }

    pub fn register_data_type(&mut self, info: DataTypeInfo) -> Result<()> {
        let content = info.content_ref();
        let source = info.source().to_string();
        self.data_types.register(info.clone())?;
        tracing::debug!(extension = %source, "registered {}", content);
        self.events.datatype_registered.emit(&DatatypeRegistered {
            session: self.session,
            data_type: info,
        });
        self.content_added(source, content);
        Ok(())
    }

    /// Register a node type. Every data type used by its slots must already
    /// be registered.
    pub fn register_node(&mut self, info: NodeInfo) -> Result<()> {
        if let Some(missing) = self.missing_data_types(&info).into_iter().next() {
            return Err(Error::MissingDataType {
                node: info.id.clone(),
                data_type: missing,
            });
        }
        let content = info.content_ref();
        let source = info.source().to_string();
        self.nodes.register(info.clone())?;
        tracing::debug!(extension = %source, "registered {}", content);
        self.events.node_info_registered.emit(&NodeInfoRegistered {
            session: self.session,
            node: info,
        });
        self.content_added(source, content);
        Ok(())
    }

    /// Slot data types of `info` that are not registered yet (deduplicated).
    pub fn missing_data_types(&self, info: &NodeInfo) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        for data_type in info.data_types() {
            if !self.data_types.contains(data_type) && !missing.iter().any(|m| m == data_type) {
                missing.push(data_type.to_string());
            }
        }
        missing
    }

    pub fn unregister_node(&mut self, id: &str) -> Option<NodeInfo> {
        let removed = self.nodes.unregister(id)?;
        self.examples.retain(|example| example.node_type_id != id);
        self.content_removed(&removed);
        Some(removed)
    }

    pub fn unregister_data_type(&mut self, id: &str) -> Option<DataTypeInfo> {
        let removed = self.data_types.unregister(id)?;
        self.content_removed(&removed);
        Some(removed)
    }

    pub fn unregister_parameter_type(&mut self, id: &str) -> Option<ParameterTypeInfo> {
        let removed = self.parameter_types.unregister(id)?;
        self.content_removed(&removed);
        Some(removed)
    }

    /// Remove the referenced entry. Returns `false` if it was not registered.
    pub fn unregister(&mut self, content: &ContentRef) -> bool {
        match content.kind {
            EntryKind::Node => self.unregister_node(&content.id).is_some(),
            EntryKind::DataType => self.unregister_data_type(&content.id).is_some(),
            EntryKind::ParameterType => self.unregister_parameter_type(&content.id).is_some(),
        }
    }

    /// Create an instance of a registered node type.
    pub fn instantiate_node(&self, id: &str) -> Result<Box<dyn GraphNode>> {
        self.nodes
            .get(id)
            .ok_or_else(|| Error::UnknownEntry {
                kind: EntryKind::Node,
                id: id.to_string(),
            })?
            .instantiate()
    }

    /// Attach an example to a registered node type.
    pub fn register_example(&mut self, example: NodeExample) -> Result<()> {
        if !self.nodes.contains(&example.node_type_id) {
            return Err(Error::UnknownEntry {
                kind: EntryKind::Node,
                id: example.node_type_id,
            });
        }
        self.examples.push(example);
        Ok(())
    }

    pub fn examples(&self) -> &[NodeExample] {
        &self.examples
    }

    pub fn examples_for(&self, node_type_id: &str) -> Vec<&NodeExample> {
        self.examples
            .iter()
            .filter(|example| example.node_type_id == node_type_id)
            .collect()
    }

    fn content_added(&self, extension_id: String, content: ContentRef) {
        self.events.extension_content_added.emit(&ExtensionContentAdded {
            session: self.session,
            extension_id,
            content,
        });
    }

    fn content_removed<T: CatalogEntry>(&self, removed: &T) {
        tracing::debug!(extension = %removed.source(), "unregistered {}", removed.content_ref());
        self.events.extension_content_removed.emit(&ExtensionContentRemoved {
            session: self.session,
            extension_id: removed.source().to_string(),
            content: removed.content_ref(),
        });
    }
}
