use oracle::{GenerateRequest, Message, OracleReply, Part, Role};
use tokio::time::timeout;
use tracing::debug;

use crate::{capability::CapabilityRegistry, HomeContext, PipelineError};

/// One bounded oracle call.
pub async fn ask(ctx: &HomeContext, request: &GenerateRequest) -> Result<OracleReply, PipelineError> {
    let limit = ctx.options.oracle_timeout;
    match timeout(limit, ctx.oracle.generate(request)).await {
        Ok(reply) => Ok(reply?),
        Err(_) => Err(PipelineError::OracleTimeout(limit)),
    }
}

/// Plain prompt, no capabilities; returns the reply text.
pub async fn generate_text(ctx: &HomeContext, prompt: String) -> Result<String, PipelineError> {
    let reply = ask(ctx, &GenerateRequest::prompt(prompt)).await?;
    Ok(reply.joined_text())
}

/// Runs a prompt with `registry` on offer until the oracle answers in text.
///
/// Calls requested in one reply run sequentially in the order given, and a
/// failing call aborts the whole generation; transitions made by earlier
/// calls stay applied.
pub async fn generate_with_capabilities(
    ctx: &HomeContext,
    prompt: String,
    registry: &CapabilityRegistry,
) -> Result<String, PipelineError> {
    let mut request = GenerateRequest::prompt(prompt).with_capabilities(registry.declarations());
    let max_rounds = ctx.options.max_tool_rounds;
    let mut rounds = 0;

    loop {
        let reply = ask(ctx, &request).await?;
        let calls = reply.calls();
        if calls.is_empty() {
            return Ok(reply.joined_text());
        }
        if rounds == max_rounds {
            return Err(PipelineError::TooManyRounds(max_rounds));
        }
        rounds += 1;

        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            let capability = registry
                .get(&call.name)
                .ok_or_else(|| PipelineError::UnknownCapability(call.name.clone()))?;
            debug!(capability = %call.name, args = %call.args, round = rounds, "invoking capability");
            let output = capability.invoke(ctx, call.args).await?;
            results.push(Part::Result {
                name: call.name,
                output,
            });
        }

        request.messages.push(Message {
            role: Role::Model,
            parts: reply.parts,
        });
        request.messages.push(Message {
            role: Role::Tool,
            parts: results,
        });
    }
}
