use std::{fmt::Display, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Html,
    Json,
};
use orchestrator::handle_command;
use serde_json::Value;
use shared::{
    domain::HomeState,
    error::{ApiError, ErrorCode, ValidationErrors, ValidationIssue},
    protocol::{CommandResponse, HomeEvent},
    validation::{parse_command, parse_state_update},
};
use tracing::{error, info_span, Instrument};
use uuid::Uuid;

use crate::app_state::AppState;

const INDEX_HTML: &str = include_str!("../../static/index.html");

type ApiFailure = (StatusCode, Json<ApiError>);

pub(crate) async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub(crate) async fn healthz() -> &'static str {
    "ok"
}

pub(crate) async fn get_state(State(state): State<Arc<AppState>>) -> Json<HomeState> {
    Json(state.home.store.snapshot())
}

/// Direct update, no oracle involved. Color is applied before temperature,
/// each as its own transition.
pub(crate) async fn post_state(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<HomeState>, ApiFailure> {
    let Json(body) = body.map_err(rejected_body)?;
    let update = parse_state_update(&body).map_err(validation_failed)?;

    let store = &state.home.store;
    if let Some(color) = update.color {
        store.send(HomeEvent::SetColor { value: color });
    }
    if let Some(temp) = update.temp {
        store.send(HomeEvent::SetTemp { value: temp });
    }
    Ok(Json(store.snapshot()))
}

pub(crate) async fn post_command(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<CommandResponse>, ApiFailure> {
    let Json(body) = body.map_err(rejected_body)?;
    let request = parse_command(&body).map_err(validation_failed)?;

    let span = info_span!("command", request_id = %Uuid::new_v4());
    let response = handle_command(&state.home, &request.command)
        .instrument(span)
        .await
        .map_err(internal)?;

    Ok(Json(CommandResponse {
        response,
        state: state.home.store.snapshot(),
    }))
}

// Every failure, including bad input, answers 500; clients already rely on it.
fn validation_failed(errors: ValidationErrors) -> ApiFailure {
    error!(%errors, "request validation failed");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiError::from(errors)))
}

fn rejected_body(rejection: JsonRejection) -> ApiFailure {
    validation_failed(ValidationErrors {
        issues: vec![ValidationIssue::new("body", rejection.body_text())],
    })
}

fn internal(err: impl Display) -> ApiFailure {
    error!(%err, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError::new(ErrorCode::Internal, err.to_string())),
    )
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
