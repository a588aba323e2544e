//! Field-by-field checking of JSON request bodies.
//!
//! Bodies are walked as [`serde_json::Value`] instead of being deserialized
//! straight into the request types so that every bad field is reported, not
//! only the first one serde trips over.

use serde_json::{Map, Value};

use crate::{
    domain::{HexColor, Temperature},
    error::{ValidationErrors, ValidationIssue},
    protocol::{CommandRequest, StateUpdateRequest},
};

pub fn parse_state_update(body: &Value) -> Result<StateUpdateRequest, ValidationErrors> {
    let fields = expect_object(body)?;
    let mut issues = Vec::new();
    let mut update = StateUpdateRequest::default();

    if let Some(raw) = fields.get("color") {
        match raw.as_str() {
            Some(text) => match HexColor::parse(text) {
                Ok(color) => update.color = Some(color),
                Err(err) => issues.push(ValidationIssue::new("color", err.to_string())),
            },
            None => issues.push(type_mismatch("color", "string", raw)),
        }
    }

    if let Some(raw) = fields.get("temp") {
        match raw.as_f64() {
            Some(value) => match Temperature::new(value) {
                Ok(temp) => update.temp = Some(temp),
                Err(err) => issues.push(ValidationIssue::new("temp", err.to_string())),
            },
            None => issues.push(type_mismatch("temp", "number", raw)),
        }
    }

    finish(update, issues)
}

pub fn parse_command(body: &Value) -> Result<CommandRequest, ValidationErrors> {
    let fields = expect_object(body)?;
    match fields.get("command") {
        Some(Value::String(command)) => Ok(CommandRequest {
            command: command.clone(),
        }),
        Some(other) => Err(single(type_mismatch("command", "string", other))),
        None => Err(single(ValidationIssue::new("command", "Required"))),
    }
}

pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expect_object(body: &Value) -> Result<&Map<String, Value>, ValidationErrors> {
    body.as_object()
        .ok_or_else(|| single(type_mismatch("", "object", body)))
}

fn type_mismatch(path: &str, expected: &str, received: &Value) -> ValidationIssue {
    ValidationIssue::new(
        path,
        format!("Expected {expected}, received {}", kind_of(received)),
    )
}

fn single(issue: ValidationIssue) -> ValidationErrors {
    ValidationErrors {
        issues: vec![issue],
    }
}

fn finish<T>(value: T, issues: Vec<ValidationIssue>) -> Result<T, ValidationErrors> {
    if issues.is_empty() {
        Ok(value)
    } else {
        Err(ValidationErrors { issues })
    }
}
