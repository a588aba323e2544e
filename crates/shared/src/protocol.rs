use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{HexColor, HomeState, Temperature};

/// A request to change exactly one field of the home state.
///
/// Event types this build does not know about deserialize to
/// [`HomeEvent::Unknown`] and are ignored by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HomeEvent {
    #[serde(rename = "SETCOLOR")]
    SetColor { value: HexColor },
    #[serde(rename = "SETTEMP")]
    SetTemp { value: Temperature },
    #[serde(other)]
    Unknown,
}

impl HomeEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            HomeEvent::SetColor { .. } => "SETCOLOR",
            HomeEvent::SetTemp { .. } => "SETTEMP",
            HomeEvent::Unknown => "UNKNOWN",
        }
    }
}

/// Published after every applied event, carrying the state it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    pub event: HomeEvent,
    pub state: HomeState,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateUpdateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<HexColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp: Option<Temperature>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub response: String,
    #[serde(flatten)]
    pub state: HomeState,
}
