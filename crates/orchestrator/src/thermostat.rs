//! Thermostat: temperature extractor (which also normalizes), setter and the
//! thermostat controller.
//!
//! Relative requests ("a bit warmer") are resolved against a snapshot taken
//! when the extractor runs. A concurrent write that lands between that read
//! and the setter is overwritten; last write wins.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use oracle::CapabilityDecl;
use regex::Regex;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use shared::{
    domain::{Temperature, MAX_TEMPERATURE, MIN_TEMPERATURE},
    protocol::HomeEvent,
};
use tracing::info;

use crate::{
    capability::{declaration, parse_args, Capability, CapabilityRegistry},
    generation::{generate_text, generate_with_capabilities},
    HomeContext, PipelineError,
};

pub const SET_THERMOSTAT: &str = "setThermostat";
pub const EXTRACT_TEMPERATURE: &str = "extractTemperature";
pub const SET_THERMOSTAT_TEMPERATURE: &str = "setThermostatTemperature";

const SET_THERMOSTAT_DESCRIPTION: &str = "Sets the temperature of the room's thermostat.";
const EXTRACT_TEMPERATURE_DESCRIPTION: &str = "Extracts what temperature number the user wants. Uses the context of the conversation and any objects mentioned to pick a temperature for the thermostat. Has access to the current temperature and can make adjustments to it.";
const SET_THERMOSTAT_TEMPERATURE_DESCRIPTION: &str =
    "Sets the temperature of the room's thermostat by sending commands to the fixture's bluetooth API.";

// Sign, digits with an optional fraction, optional exponent.
static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("leading number regex")
});

pub async fn set_thermostat(ctx: &HomeContext, command: &str) -> Result<String, PipelineError> {
    let registry = CapabilityRegistry::new()
        .with(ExtractTemperature)
        .with(SetThermostatTemperature);
    generate_with_capabilities(
        ctx,
        format!(
            "Please respond to this command to set the temperature of the room : {command}"
        ),
        &registry,
    )
    .await
}

/// Works out the temperature `context` asks for, relative to the current one.
pub async fn extract_temperature(
    ctx: &HomeContext,
    context: &str,
) -> Result<Temperature, PipelineError> {
    let current = ctx.store.snapshot().temp;
    let raw = generate_text(
        ctx,
        format!(
            "The current temperature is {current}. The following text may refer to a discrete \
             temperature or an adjustment to the current temperature. What temperature is the \
             following text referring to? : {context}"
        ),
    )
    .await?;
    normalize_temperature(&raw)
}

/// Reads the number the oracle answered with.
///
/// Only the leading number counts ("72 degrees" is 72). Values outside
/// `[0, 100]` fail instead of being clamped.
pub fn normalize_temperature(raw: &str) -> Result<Temperature, PipelineError> {
    let failed = |reason: String| PipelineError::NormalizationFailed {
        attribute: "temperature",
        raw: raw.to_string(),
        reason,
    };

    let value = leading_number(raw).ok_or_else(|| failed("no leading number".to_string()))?;
    Temperature::new(value).map_err(|err| {
        failed(format!(
            "{err} (allowed range {MIN_TEMPERATURE}-{MAX_TEMPERATURE}, got {value})"
        ))
    })
}

pub fn set_thermostat_temperature(ctx: &HomeContext, temperature: Temperature) -> bool {
    info!(%temperature, "set the temperature of the thermostat");
    ctx.store.send(HomeEvent::SetTemp { value: temperature });
    true
}

fn leading_number(text: &str) -> Option<f64> {
    let found = LEADING_NUMBER.find(text)?;
    found.as_str().trim_start().parse().ok()
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct CommandInput {
    #[schemars(description = "The user's request for a room temperature change.")]
    command: String,
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct TemperatureContextInput {
    #[schemars(
        description = "Text that refers to a number temperature or any object that has a temperature."
    )]
    temperature_context: String,
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct TemperatureInput {
    #[schemars(range(min = 0, max = 100))]
    temperature: f64,
}

pub struct SetThermostat;

#[async_trait]
impl Capability for SetThermostat {
    fn declaration(&self) -> CapabilityDecl {
        declaration::<CommandInput>(SET_THERMOSTAT, SET_THERMOSTAT_DESCRIPTION)
    }

    async fn invoke(&self, ctx: &HomeContext, args: Value) -> Result<Value, PipelineError> {
        let input: CommandInput = parse_args(SET_THERMOSTAT, args)?;
        let response = set_thermostat(ctx, &input.command).await?;
        Ok(Value::String(response))
    }
}

pub struct ExtractTemperature;

#[async_trait]
impl Capability for ExtractTemperature {
    fn declaration(&self) -> CapabilityDecl {
        declaration::<TemperatureContextInput>(EXTRACT_TEMPERATURE, EXTRACT_TEMPERATURE_DESCRIPTION)
    }

    async fn invoke(&self, ctx: &HomeContext, args: Value) -> Result<Value, PipelineError> {
        let input: TemperatureContextInput = parse_args(EXTRACT_TEMPERATURE, args)?;
        let temperature = extract_temperature(ctx, &input.temperature_context).await?;
        Ok(json!({ "temperature": temperature }))
    }
}

pub struct SetThermostatTemperature;

#[async_trait]
impl Capability for SetThermostatTemperature {
    fn declaration(&self) -> CapabilityDecl {
        declaration::<TemperatureInput>(
            SET_THERMOSTAT_TEMPERATURE,
            SET_THERMOSTAT_TEMPERATURE_DESCRIPTION,
        )
    }

    async fn invoke(&self, ctx: &HomeContext, args: Value) -> Result<Value, PipelineError> {
        let input: TemperatureInput = parse_args(SET_THERMOSTAT_TEMPERATURE, args)?;
        let temperature =
            Temperature::new(input.temperature).map_err(|err| PipelineError::InvalidArguments {
                capability: SET_THERMOSTAT_TEMPERATURE.to_string(),
                reason: format!("temperature - {err}"),
            })?;
        Ok(Value::Bool(set_thermostat_temperature(ctx, temperature)))
    }
}

#[cfg(test)]
#[path = "tests/thermostat_tests.rs"]
mod tests;
