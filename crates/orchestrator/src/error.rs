use std::time::Duration;

use oracle::OracleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error("oracle did not answer within {0:?}")]
    OracleTimeout(Duration),
    #[error("normalization failed for {attribute}: {reason} (oracle said {raw:?})")]
    NormalizationFailed {
        attribute: &'static str,
        raw: String,
        reason: String,
    },
    #[error("invalid arguments for {capability}: {reason}")]
    InvalidArguments { capability: String, reason: String },
    #[error("oracle asked for unknown capability {0:?}")]
    UnknownCapability(String),
    #[error("oracle kept calling capabilities after {0} rounds")]
    TooManyRounds(usize),
}
