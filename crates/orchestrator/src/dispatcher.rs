use tracing::info;

use crate::{
    capability::CapabilityRegistry, generation::generate_with_capabilities, lights::SetLights,
    thermostat::SetThermostat, HomeContext, PipelineError,
};

/// Top-level entry: the oracle decides whether the command is about the
/// lights, the thermostat, both or neither.
///
/// A reply with no capability call (a question back, a refusal) is returned
/// as-is. Domains are not transactional: if the second domain fails, the
/// first one's change stays and the error is returned.
pub async fn handle_command(ctx: &HomeContext, command: &str) -> Result<String, PipelineError> {
    let registry = CapabilityRegistry::new()
        .with(SetLights)
        .with(SetThermostat);
    info!(command, "handling command");
    generate_with_capabilities(ctx, command.to_string(), &registry).await
}
