//! Gemini `generateContent` adapter.
//!
//! Capabilities are offered as function declarations; function calls in the
//! reply come back as [`Part::Call`], and results are sent back as
//! `functionResponse` parts.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;
use url::Url;

use crate::{
    CapabilityCall, GenerateRequest, Message, Oracle, OracleError, OracleReply, Part, Role,
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: Url,
    pub temperature: f32,
    pub request_timeout: Duration,
}

pub struct GeminiOracle {
    client: Client,
    endpoint: Url,
    api_key: String,
    temperature: f32,
}

impl GeminiOracle {
    pub fn new(config: GeminiConfig) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let endpoint = generate_endpoint(&config.base_url, &config.model)?;
        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key,
            temperature: config.temperature,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Oracle for GeminiOracle {
    async fn generate(&self, request: &GenerateRequest) -> Result<OracleReply, OracleError> {
        let body = request_body(request, self.temperature);
        debug!(
            endpoint = %self.endpoint,
            messages = request.messages.len(),
            capabilities = request.capabilities.len(),
            "calling gemini"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = response.json().await?;
        parse_reply(payload)
    }
}

pub fn generate_endpoint(base_url: &Url, model: &str) -> Result<Url, OracleError> {
    let base = base_url.as_str().trim_end_matches('/');
    Ok(Url::parse(&format!("{base}/models/{model}:generateContent"))?)
}

pub fn request_body(request: &GenerateRequest, temperature: f32) -> Value {
    let contents: Vec<Value> = request.messages.iter().map(content_json).collect();
    let mut body = json!({
        "contents": contents,
        "generationConfig": { "temperature": temperature },
    });

    if !request.capabilities.is_empty() {
        let declarations: Vec<Value> = request
            .capabilities
            .iter()
            .map(|decl| {
                json!({
                    "name": decl.name,
                    "description": decl.description,
                    "parameters": decl.input_schema,
                })
            })
            .collect();
        body["tools"] = json!([{ "functionDeclarations": declarations }]);
    }

    body
}

fn content_json(message: &Message) -> Value {
    // Gemini carries function responses on user turns.
    let role = match message.role {
        Role::User | Role::Tool => "user",
        Role::Model => "model",
    };
    let parts: Vec<Value> = message
        .parts
        .iter()
        .map(|part| match part {
            Part::Text(text) => json!({ "text": text }),
            Part::Call(call) => json!({
                "functionCall": { "name": call.name, "args": call.args }
            }),
            Part::Result { name, output } => json!({
                "functionResponse": {
                    "name": name,
                    "response": { "name": name, "content": output },
                }
            }),
        })
        .collect();
    json!({ "role": role, "parts": parts })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<WireContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireContent {
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    text: Option<String>,
    function_call: Option<WireFunctionCall>,
}

#[derive(Debug, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    args: Option<Value>,
}

pub fn parse_reply(payload: Value) -> Result<OracleReply, OracleError> {
    let response: GenerateContentResponse = serde_json::from_value(payload)?;

    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
            .unwrap_or_else(|| "no reason given".to_string());
        return Err(OracleError::EmptyReply { reason });
    };

    let Some(content) = candidate.content else {
        let reason = candidate
            .finish_reason
            .unwrap_or_else(|| "candidate had no content".to_string());
        return Err(OracleError::EmptyReply { reason });
    };

    let mut parts = Vec::new();
    for part in content.parts {
        if let Some(call) = part.function_call {
            parts.push(Part::Call(CapabilityCall {
                name: call.name,
                args: call.args.unwrap_or_else(|| Value::Object(Map::new())),
            }));
        }
        if let Some(text) = part.text {
            parts.push(Part::Text(text));
        }
    }
    Ok(OracleReply { parts })
}

#[cfg(test)]
#[path = "tests/gemini_tests.rs"]
mod tests;
