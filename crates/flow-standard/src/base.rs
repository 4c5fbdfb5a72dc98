//! The core extension: standard parameter types and the text data type.

use flow_catalog::{BoxError, DataTypeInfo, ParameterType, ParameterTypeInfo};
use flow_extensions::{Extension, ExtensionMetadata, Registrar};
use serde_json::{Value, json};

use crate::text::{TEXT_DATA_TYPE, TEXT_FILE, TextData};

pub const CORE_ID: &str = "org.flow:core";

/// File system path parameter. Values are strings.
#[derive(Debug, Clone, Copy)]
struct PathParameter;

impl ParameterType for PathParameter {
    fn new_default(&self) -> Result<Value, BoxError> {
        Ok(json!(""))
    }

    fn duplicate(&self, value: &Value) -> Result<Value, BoxError> {
        match value {
            Value::String(path) => Ok(Value::String(path.clone())),
            other => Err(format!("path must be a string, got {other}").into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CoreExtension {
    metadata: ExtensionMetadata,
}

impl CoreExtension {
    pub fn new() -> Self {
        Self {
            metadata: ExtensionMetadata::new("Flow core")
                .with_description("Standard parameter types and data types")
                .with_author("Flow developers")
                .with_license("MIT")
                .with_category("Core"),
        }
    }
}

impl Default for CoreExtension {
    fn default() -> Self {
        Self::new()
    }
}

impl Extension for CoreExtension {
    fn id(&self) -> &str {
        CORE_ID
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn metadata(&self) -> &ExtensionMetadata {
        &self.metadata
    }

    fn is_core(&self) -> bool {
        true
    }

    fn register(&self, registrar: &mut Registrar<'_>) -> Result<(), BoxError> {
        for (id, name, default) in [
            ("boolean", "Boolean", json!(false)),
            ("integer", "Integer", json!(0)),
            ("float", "Floating point number", json!(0.0)),
            ("string", "String", json!("")),
        ] {
            registrar.register_parameter_type(ParameterTypeInfo::with_default(id, name, default))?;
        }
        registrar.register_parameter_type(
            ParameterTypeInfo::new("path", "Path", PathParameter)
                .with_description("A file system path"),
        )?;

        registrar.register_data_type(
            DataTypeInfo::new(TEXT_DATA_TYPE, "Text")
                .with_description("A piece of text")
                .with_storage_documentation(format!("A folder containing a UTF-8 file named {TEXT_FILE}"))
                .with_importer(TextData::import),
        )?;
        tracing::debug!(extension = CORE_ID, "standard types registered");
        Ok(())
    }
}
