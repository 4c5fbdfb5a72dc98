//! Catalog entries with controllable defects.
//!
//! Every node created here exposes a single `value` parameter of type
//! `integer`, so a catalog used with these nodes should register
//! [`test_parameter_type`]`("integer", ..)`.

use std::any::Any;

use flow_catalog::{
    BoxError, CatalogEntry, Data, DataTypeInfo, GraphNode, NodeInfo, ParameterSlot,
    ParameterTypeInfo,
};
use serde_json::{Value, json};

/// How a [`TestNode`] misbehaves during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeBehavior {
    /// Passes every check.
    Healthy,
    /// Reloading saved state changes it.
    LossyRoundTrip,
    /// Exposes a parameter whose type nobody registered.
    UnregisteredParameter,
    /// Cannot be copied.
    DuplicateFails,
    /// Cannot be serialized.
    SerializeFails,
    /// Is not functionally equal to itself.
    NotSelfEqual,
    /// The factory returns an error.
    FactoryFails,
    /// The factory panics.
    FactoryPanics,
}

#[derive(Debug, Clone)]
pub struct TestNode {
    type_id: String,
    value: i64,
    behavior: NodeBehavior,
}

impl TestNode {
    pub fn new(type_id: impl Into<String>, behavior: NodeBehavior) -> Self {
        Self {
            type_id: type_id.into(),
            value: 0,
            behavior,
        }
    }
}

impl GraphNode for TestNode {
    fn node_type_id(&self) -> &str {
        &self.type_id
    }

    fn parameters(&self) -> Vec<ParameterSlot> {
        let type_id = match self.behavior {
            NodeBehavior::UnregisteredParameter => "unregistered",
            _ => "integer",
        };
        vec![ParameterSlot::new("value", type_id, json!(self.value))]
    }

    fn duplicate(&self) -> Result<Box<dyn GraphNode>, BoxError> {
        if self.behavior == NodeBehavior::DuplicateFails {
            return Err("copy constructor is missing".into());
        }
        Ok(Box::new(self.clone()))
    }

    fn to_json(&self) -> Result<Value, BoxError> {
        if self.behavior == NodeBehavior::SerializeFails {
            return Err("value is not serializable".into());
        }
        Ok(json!({ "value": self.value }))
    }

    fn load_json(&mut self, value: &Value) -> Result<(), BoxError> {
        let stored = value
            .get("value")
            .and_then(Value::as_i64)
            .ok_or("missing 'value'")?;
        self.value = match self.behavior {
            NodeBehavior::LossyRoundTrip => stored + 1,
            _ => stored,
        };
        Ok(())
    }

    fn functionally_equals(&self, other: &dyn GraphNode) -> bool {
        if self.behavior == NodeBehavior::NotSelfEqual {
            return false;
        }
        match (self.to_json(), other.to_json()) {
            (Ok(a), Ok(b)) => self.node_type_id() == other.node_type_id() && a == b,
            _ => false,
        }
    }
}

/// Node type producing [`TestNode`]s, attributed to `source`.
pub fn test_node_info(id: &str, source: &str, behavior: NodeBehavior) -> NodeInfo {
    let type_id = id.to_string();
    let mut info = NodeInfo::new(id, id, move || match behavior {
        NodeBehavior::FactoryFails => Err("node has no default constructor".into()),
        NodeBehavior::FactoryPanics => panic!("node constructor crashed"),
        _ => Ok(Box::new(TestNode::new(type_id.clone(), behavior)) as Box<dyn GraphNode>),
    })
    .with_category("Testing");
    info.set_source(source);
    info
}

/// Value produced by the importer of [`test_data_type`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestData {
    pub type_id: String,
}

impl Data for TestData {
    fn data_type_id(&self) -> &str {
        &self.type_id
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Documented, importable data type attributed to `source`.
pub fn test_data_type(id: &str, source: &str) -> DataTypeInfo {
    let type_id = id.to_string();
    let mut info = DataTypeInfo::new(id, id)
        .with_storage_documentation("an empty folder")
        .with_importer(move |_| {
            Ok(Box::new(TestData {
                type_id: type_id.clone(),
            }))
        });
    info.set_source(source);
    info
}

/// Parameter type defaulting to `0`, attributed to `source`.
pub fn test_parameter_type(id: &str, source: &str) -> ParameterTypeInfo {
    let mut info = ParameterTypeInfo::with_default(id, id, json!(0));
    info.set_source(source);
    info
}
