use serde_json::Value;

/// An operation the oracle may ask to have run during a generation call.
///
/// `description` is what the oracle reads to decide whether the capability
/// applies, so its wording is part of the contract.
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityDecl {
    pub name: String,
    pub description: String,
    /// JSON Schema object describing the expected arguments.
    pub input_schema: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
    Tool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityCall {
    pub name: String,
    pub args: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    Call(CapabilityCall),
    Result { name: String, output: Value },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::Text(text.into())],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub messages: Vec<Message>,
    pub capabilities: Vec<CapabilityDecl>,
}

impl GenerateRequest {
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(text)],
            capabilities: Vec::new(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: Vec<CapabilityDecl>) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Text of the opening user message.
    pub fn prompt_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|message| message.role == Role::User)
            .and_then(|message| {
                message.parts.iter().find_map(|part| match part {
                    Part::Text(text) => Some(text.as_str()),
                    _ => None,
                })
            })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OracleReply {
    pub parts: Vec<Part>,
}

impl OracleReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn call(name: impl Into<String>, args: Value) -> Self {
        Self {
            parts: vec![Part::Call(CapabilityCall {
                name: name.into(),
                args,
            })],
        }
    }

    pub fn and_call(mut self, name: impl Into<String>, args: Value) -> Self {
        self.parts.push(Part::Call(CapabilityCall {
            name: name.into(),
            args,
        }));
        self
    }

    /// All text parts joined together.
    pub fn joined_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn calls(&self) -> Vec<CapabilityCall> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Call(call) => Some(call.clone()),
                _ => None,
            })
            .collect()
    }
}
