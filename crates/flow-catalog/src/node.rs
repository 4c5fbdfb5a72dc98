//! Node types
//!
//! A [`NodeInfo`] is the registered description of a node type: its slots
//! and a factory producing [`GraphNode`] instances. The catalog never runs
//! nodes; it only needs to create, copy, serialize and compare them.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entry::{CatalogEntry, EntryKind};
use crate::error::{BoxError, Error, Result};

/// A parameter exposed by a node instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSlot {
    /// Unique key within the node.
    pub key: String,
    /// Id of the parameter type describing `value`.
    pub type_id: String,
    pub value: Value,
}

impl ParameterSlot {
    pub fn new(key: impl Into<String>, type_id: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            type_id: type_id.into(),
            value,
        }
    }
}

/// An instance of a node type, as placed into a pipeline graph.
pub trait GraphNode: fmt::Debug + Send {
    /// Id of the node type this instance was created from.
    fn node_type_id(&self) -> &str;

    /// Parameters exposed to the user.
    fn parameters(&self) -> Vec<ParameterSlot>;

    /// Deep copy of this instance.
    fn duplicate(&self) -> std::result::Result<Box<dyn GraphNode>, BoxError>;

    /// Canonical serialized form.
    fn to_json(&self) -> std::result::Result<Value, BoxError>;

    /// Restore state previously produced by [`GraphNode::to_json`].
    fn load_json(&mut self, value: &Value) -> std::result::Result<(), BoxError>;

    /// Whether both nodes would produce the same results (cache key equality).
    fn functionally_equals(&self, other: &dyn GraphNode) -> bool {
        if self.node_type_id() != other.node_type_id() {
            return false;
        }
        match (self.to_json(), other.to_json()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

/// Input or output slot of a node type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotInfo {
    pub name: String,
    /// Id of the data type accepted or produced by the slot.
    pub data_type: String,
}

pub type NodeFactory = Arc<dyn Fn() -> std::result::Result<Box<dyn GraphNode>, BoxError> + Send + Sync>;

/// Registered node type.
#[derive(Clone)]
pub struct NodeInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub inputs: Vec<SlotInfo>,
    pub outputs: Vec<SlotInfo>,
    source: String,
    factory: NodeFactory,
}

impl NodeInfo {
    pub fn new<F>(id: impl Into<String>, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> std::result::Result<Box<dyn GraphNode>, BoxError> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            category: String::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            source: String::new(),
            factory: Arc::new(factory),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_input(mut self, name: impl Into<String>, data_type: impl Into<String>) -> Self {
        self.inputs.push(SlotInfo {
            name: name.into(),
            data_type: data_type.into(),
        });
        self
    }

    pub fn with_output(mut self, name: impl Into<String>, data_type: impl Into<String>) -> Self {
        self.outputs.push(SlotInfo {
            name: name.into(),
            data_type: data_type.into(),
        });
        self
    }

    /// Data type ids referenced by any slot, in declaration order.
    pub fn data_types(&self) -> impl Iterator<Item = &str> {
        self.inputs
            .iter()
            .chain(self.outputs.iter())
            .map(|slot| slot.data_type.as_str())
    }

    /// Create a new instance using the registered factory.
    pub fn instantiate(&self) -> Result<Box<dyn GraphNode>> {
        (self.factory)().map_err(|source| Error::Instantiate {
            id: self.id.clone(),
            source,
        })
    }
}

impl CatalogEntry for NodeInfo {
    const KIND: EntryKind = EntryKind::Node;

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

impl fmt::Debug for NodeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// A pre-configured parameter set offered as a starting point for a node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeExample {
    pub node_type_id: String,
    pub name: String,
    #[serde(default)]
    pub parameters: Value,
}
