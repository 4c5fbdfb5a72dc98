//! The `text` data type and the node implementation shared by text nodes.

use std::any::Any;
use std::path::Path;

use flow_catalog::{BoxError, Data, GraphNode, ParameterSlot};
use serde_json::{Map, Value};

/// Id of the text data type.
pub const TEXT_DATA_TYPE: &str = "text";

/// File holding the content inside a text storage folder.
pub const TEXT_FILE: &str = "text.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextData {
    pub content: String,
}

impl TextData {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Read `text.txt` from a storage folder.
    pub fn import(storage: &Path) -> Result<Box<dyn Data>, BoxError> {
        let path = storage.join(TEXT_FILE);
        let content = std::fs::read_to_string(&path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        Ok(Box::new(Self { content }))
    }
}

impl Data for TextData {
    fn data_type_id(&self) -> &str {
        TEXT_DATA_TYPE
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A node whose whole state is its parameter values.
///
/// Serialized as a JSON object mapping parameter keys to values.
#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    type_id: String,
    parameters: Vec<ParameterSlot>,
}

impl TextNode {
    pub fn new(type_id: impl Into<String>, parameters: Vec<ParameterSlot>) -> Self {
        Self {
            type_id: type_id.into(),
            parameters,
        }
    }

    pub fn parameter(&self, key: &str) -> Option<&Value> {
        self.parameters
            .iter()
            .find(|slot| slot.key == key)
            .map(|slot| &slot.value)
    }

    /// Returns `false` if the node has no parameter `key`.
    pub fn set_parameter(&mut self, key: &str, value: Value) -> bool {
        match self.parameters.iter_mut().find(|slot| slot.key == key) {
            Some(slot) => {
                slot.value = value;
                true
            }
            None => false,
        }
    }
}

impl GraphNode for TextNode {
    fn node_type_id(&self) -> &str {
        &self.type_id
    }

    fn parameters(&self) -> Vec<ParameterSlot> {
        self.parameters.clone()
    }

    fn duplicate(&self) -> Result<Box<dyn GraphNode>, BoxError> {
        Ok(Box::new(self.clone()))
    }

    fn to_json(&self) -> Result<Value, BoxError> {
        let values: Map<String, Value> = self
            .parameters
            .iter()
            .map(|slot| (slot.key.clone(), slot.value.clone()))
            .collect();
        Ok(Value::Object(values))
    }

    fn load_json(&mut self, value: &Value) -> Result<(), BoxError> {
        let values = value.as_object().ok_or("expected a JSON object")?;
        for (key, value) in values {
            if !self.set_parameter(key, value.clone()) {
                return Err(format!("'{}' has no parameter '{key}'", self.type_id).into());
            }
        }
        Ok(())
    }
}
