//! Light color: extractor, hex normalizer, LED setter and the lights
//! controller that offers all three to the oracle.

use async_trait::async_trait;
use oracle::CapabilityDecl;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use shared::{domain::HexColor, protocol::HomeEvent};
use tracing::info;

use crate::{
    capability::{declaration, parse_args, Capability, CapabilityRegistry},
    generation::{generate_text, generate_with_capabilities},
    HomeContext, PipelineError,
};

pub const SET_LIGHTS: &str = "setLights";
pub const EXTRACT_COLOR: &str = "extractColor";
pub const CONVERT_COLOR_TO_HEX: &str = "convertColorToHex";
pub const SET_LED_COLOR: &str = "setLEDColor";

const SET_LIGHTS_DESCRIPTION: &str = "Sets the color of the lights in the room. This command can determine which color to use even if a specific color is not mentioned.";
const EXTRACT_COLOR_DESCRIPTION: &str = "Extracts what color the user wants. Uses the context of the conversation and any objects mentioned to pick a color.";
const CONVERT_COLOR_TO_HEX_DESCRIPTION: &str =
    "Converts a color string to hex. For example, an input of \"blue\" outputs \"0000FF\"";
const SET_LED_COLOR_DESCRIPTION: &str =
    "Sets the color of the room's lighting by sending commands to the fixture's bluetooth API.";

/// Lights controller: lets the oracle drive extraction, conversion and the
/// LED write for one command, and returns its closing remark.
pub async fn set_lights(ctx: &HomeContext, command: &str) -> Result<String, PipelineError> {
    let registry = CapabilityRegistry::new()
        .with(ExtractColor)
        .with(ConvertColorToHex)
        .with(SetLedColor);
    generate_with_capabilities(
        ctx,
        format!("Please respond to this command to set the color of lights in the room : {command}"),
        &registry,
    )
    .await
}

/// Asks which color `context` refers to. The answer is a description, not
/// yet a hex code.
pub async fn extract_color(ctx: &HomeContext, context: &str) -> Result<String, PipelineError> {
    generate_text(
        ctx,
        format!("What color is this text referring to? : {context}"),
    )
    .await
}

/// Converts a color description into six hex digits.
///
/// A leading `#` is dropped. Anything else that is not exactly six hex digits
/// is a normalization failure; the value is never padded or cut down.
pub async fn normalize_color(ctx: &HomeContext, color: &str) -> Result<HexColor, PipelineError> {
    let raw = generate_text(ctx, format!("Please convert this color to a hex code : {color}")).await?;
    let trimmed = raw.trim();
    let candidate = trimmed.strip_prefix('#').unwrap_or(trimmed);
    HexColor::parse(candidate).map_err(|err| PipelineError::NormalizationFailed {
        attribute: "color",
        raw: raw.clone(),
        reason: err.to_string(),
    })
}

/// Writes the color to the (simulated) fixture.
///
/// Always `true` here; a real backend would report the device ack.
pub fn set_led_color(ctx: &HomeContext, color: HexColor) -> bool {
    info!(%color, "set the color of the lights");
    ctx.store.send(HomeEvent::SetColor { value: color });
    true
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct CommandInput {
    #[schemars(description = "The user's request for a lighting color change.")]
    command: String,
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ColorContextInput {
    #[schemars(description = "Text that refers to a color or any object that has a color.")]
    color_context: String,
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ColorStringInput {
    color_string: String,
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct HexColorInput {
    #[schemars(length(equal = 6))]
    hex_color_code: String,
}

pub struct SetLights;

#[async_trait]
impl Capability for SetLights {
    fn declaration(&self) -> CapabilityDecl {
        declaration::<CommandInput>(SET_LIGHTS, SET_LIGHTS_DESCRIPTION)
    }

    async fn invoke(&self, ctx: &HomeContext, args: Value) -> Result<Value, PipelineError> {
        let input: CommandInput = parse_args(SET_LIGHTS, args)?;
        let response = set_lights(ctx, &input.command).await?;
        Ok(Value::String(response))
    }
}

pub struct ExtractColor;

#[async_trait]
impl Capability for ExtractColor {
    fn declaration(&self) -> CapabilityDecl {
        declaration::<ColorContextInput>(EXTRACT_COLOR, EXTRACT_COLOR_DESCRIPTION)
    }

    async fn invoke(&self, ctx: &HomeContext, args: Value) -> Result<Value, PipelineError> {
        let input: ColorContextInput = parse_args(EXTRACT_COLOR, args)?;
        let color = extract_color(ctx, &input.color_context).await?;
        Ok(json!({ "color": color }))
    }
}

pub struct ConvertColorToHex;

#[async_trait]
impl Capability for ConvertColorToHex {
    fn declaration(&self) -> CapabilityDecl {
        declaration::<ColorStringInput>(CONVERT_COLOR_TO_HEX, CONVERT_COLOR_TO_HEX_DESCRIPTION)
    }

    async fn invoke(&self, ctx: &HomeContext, args: Value) -> Result<Value, PipelineError> {
        let input: ColorStringInput = parse_args(CONVERT_COLOR_TO_HEX, args)?;
        let hex = normalize_color(ctx, &input.color_string).await?;
        Ok(json!({ "hexColorCode": hex }))
    }
}

pub struct SetLedColor;

#[async_trait]
impl Capability for SetLedColor {
    fn declaration(&self) -> CapabilityDecl {
        declaration::<HexColorInput>(SET_LED_COLOR, SET_LED_COLOR_DESCRIPTION)
    }

    async fn invoke(&self, ctx: &HomeContext, args: Value) -> Result<Value, PipelineError> {
        let input: HexColorInput = parse_args(SET_LED_COLOR, args)?;
        let color =
            HexColor::parse(&input.hex_color_code).map_err(|err| PipelineError::InvalidArguments {
                capability: SET_LED_COLOR.to_string(),
                reason: format!("hexColorCode - {err}"),
            })?;
        Ok(Value::Bool(set_led_color(ctx, color)))
    }
}

#[cfg(test)]
#[path = "tests/lights_tests.rs"]
mod tests;
