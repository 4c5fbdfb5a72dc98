//! Text processing nodes.

use flow_catalog::{BoxError, GraphNode, NodeExample, NodeInfo, ParameterSlot};
use flow_extensions::{
    ActivationContext, Dependency, Extension, ExtensionMetadata, PostprocessContext, Registrar,
};
use serde_json::{Value, json};

use crate::base::CORE_ID;
use crate::text::{TEXT_DATA_TYPE, TextNode};

pub const UTILS_ID: &str = "org.flow:utils";

const CATEGORY: &str = "Text";

#[derive(Debug, Clone)]
pub struct UtilitiesExtension {
    metadata: ExtensionMetadata,
}

impl UtilitiesExtension {
    pub fn new() -> Self {
        Self {
            metadata: ExtensionMetadata::new("Flow utilities")
                .with_description("Nodes for working with text")
                .with_author("Flow developers")
                .with_license("MIT")
                .with_category("Utilities"),
        }
    }
}

impl Default for UtilitiesExtension {
    fn default() -> Self {
        Self::new()
    }
}

fn text_node(id: &'static str, name: &str, parameters: Vec<(&'static str, &'static str, Value)>) -> NodeInfo {
    NodeInfo::new(id, name, move || {
        let slots = parameters
            .iter()
            .map(|(key, type_id, value)| ParameterSlot::new(*key, *type_id, value.clone()))
            .collect();
        Ok(Box::new(TextNode::new(id, slots)) as Box<dyn GraphNode>)
    })
    .with_category(CATEGORY)
}

impl Extension for UtilitiesExtension {
    fn id(&self) -> &str {
        UTILS_ID
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn metadata(&self) -> &ExtensionMetadata {
        &self.metadata
    }

    fn dependencies(&self) -> Vec<Dependency> {
        vec![Dependency::at_least(CORE_ID, "0.1")]
    }

    fn activate(&mut self, context: &ActivationContext<'_>) -> Result<(), BoxError> {
        if !context.loaded.contains(CORE_ID) {
            return Err(format!("{CORE_ID} is not loaded").into());
        }
        Ok(())
    }

    fn register(&self, registrar: &mut Registrar<'_>) -> Result<(), BoxError> {
        registrar.schedule_node(
            text_node("text-constant", "Define text", vec![("value", "string", json!(""))])
                .with_description("Outputs a fixed text")
                .with_output("output", TEXT_DATA_TYPE),
        );
        registrar.schedule_node(
            text_node("text-join", "Join texts", vec![("separator", "string", json!(" "))])
                .with_description("Concatenates two texts")
                .with_input("left", TEXT_DATA_TYPE)
                .with_input("right", TEXT_DATA_TYPE)
                .with_output("output", TEXT_DATA_TYPE),
        );
        registrar.schedule_node(
            text_node("text-repeat", "Repeat text", vec![("count", "integer", json!(2))])
                .with_description("Repeats a text a number of times")
                .with_input("input", TEXT_DATA_TYPE)
                .with_output("output", TEXT_DATA_TYPE),
        );
        Ok(())
    }

    fn postprocess(&self, context: &mut PostprocessContext<'_>) -> Result<(), BoxError> {
        for (node_type_id, name, parameters) in [
            ("text-join", "Comma separated", json!({ "separator": ", " })),
            ("text-join", "Line by line", json!({ "separator": "\n" })),
            ("text-repeat", "Three times", json!({ "count": 3 })),
        ] {
            context.register_example(NodeExample {
                node_type_id: node_type_id.to_string(),
                name: name.to_string(),
                parameters,
            })?;
        }
        Ok(())
    }
}
