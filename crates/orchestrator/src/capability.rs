use async_trait::async_trait;
use oracle::CapabilityDecl;
use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::{HomeContext, PipelineError};

/// Something the oracle can choose to run mid-generation.
#[async_trait]
pub trait Capability: Send + Sync {
    fn declaration(&self) -> CapabilityDecl;

    async fn invoke(&self, ctx: &HomeContext, args: Value) -> Result<Value, PipelineError>;
}

/// The capabilities offered to one generation call, looked up by name.
#[derive(Default)]
pub struct CapabilityRegistry {
    capabilities: Vec<Box<dyn Capability>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, capability: impl Capability + 'static) -> Self {
        self.capabilities.push(Box::new(capability));
        self
    }

    pub fn declarations(&self) -> Vec<CapabilityDecl> {
        self.capabilities.iter().map(|c| c.declaration()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&dyn Capability> {
        self.capabilities
            .iter()
            .find(|c| c.declaration().name == name)
            .map(|c| c.as_ref())
    }
}

/// Declares a capability whose arguments parse into `T`.
pub(crate) fn declaration<T: JsonSchema>(name: &str, description: &str) -> CapabilityDecl {
    CapabilityDecl {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: input_schema::<T>(),
    }
}

/// Input schema derived from the type `args` are parsed into, without the
/// `$schema` and `title` keys the oracle does not accept.
pub(crate) fn input_schema<T: JsonSchema>() -> Value {
    let Ok(Value::Object(mut schema)) = serde_json::to_value(schema_for!(T)) else {
        return json!({ "type": "object" });
    };
    schema.remove("$schema");
    schema.remove("title");
    Value::Object(schema)
}

pub(crate) fn parse_args<T: DeserializeOwned>(
    capability: &str,
    args: Value,
) -> Result<T, PipelineError> {
    serde_json::from_value(args).map_err(|err| PipelineError::InvalidArguments {
        capability: capability.to_string(),
        reason: err.to_string(),
    })
}
