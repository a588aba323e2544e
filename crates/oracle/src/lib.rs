use async_trait::async_trait;
use thiserror::Error;

mod conversation;
pub mod gemini;
mod scripted;

pub use conversation::{
    CapabilityCall, CapabilityDecl, GenerateRequest, Message, OracleReply, Part, Role,
};
pub use gemini::{GeminiConfig, GeminiOracle};
pub use scripted::{ScriptStep, ScriptedOracle};

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle is not configured; set GOOGLE_GENAI_API_KEY")]
    NotConfigured,
    #[error("oracle request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("oracle returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode oracle reply: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("oracle returned an empty reply ({reason})")]
    EmptyReply { reason: String },
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
    #[error("invalid oracle endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

/// The natural-language engine behind every judgement call in the pipeline.
///
/// One call is one model turn: it either answers with text or asks for some
/// of the offered capabilities to be run.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<OracleReply, OracleError>;
}

/// Stand-in used when no model credentials are configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredOracle;

#[async_trait]
impl Oracle for UnconfiguredOracle {
    async fn generate(&self, _request: &GenerateRequest) -> Result<OracleReply, OracleError> {
        Err(OracleError::NotConfigured)
    }
}
