use std::time::Duration;

use oracle::{OracleReply, Part, Role, ScriptStep, ScriptedOracle};
use serde_json::json;

use super::*;

pub(crate) fn scripted_context<I, S>(steps: I) -> (HomeContext, Arc<ScriptedOracle>)
where
    I: IntoIterator<Item = S>,
    S: Into<ScriptStep>,
{
    let oracle = Arc::new(ScriptedOracle::new(steps));
    let ctx = HomeContext::new(HomeStore::new(), oracle.clone());
    (ctx, oracle)
}

#[tokio::test]
async fn reply_without_capability_call_is_returned_as_is() {
    let (ctx, oracle) = scripted_context([OracleReply::text(
        "Which room do you mean?",
    )]);

    let response = handle_command(&ctx, "make it nice").await.expect("response");

    assert_eq!(response, "Which room do you mean?");
    assert_eq!(ctx.store.snapshot(), shared::domain::HomeState::default());
    let requests = oracle.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].prompt_text(), Some("make it nice"));
}

#[tokio::test]
async fn dispatcher_offers_both_controllers_with_their_descriptions() {
    let (ctx, oracle) = scripted_context([OracleReply::text("ok")]);
    handle_command(&ctx, "hello").await.expect("response");

    let offered = &oracle.requests()[0].capabilities;
    let names: Vec<_> = offered.iter().map(|decl| decl.name.as_str()).collect();
    assert_eq!(names, vec!["setLights", "setThermostat"]);
    assert_eq!(
        offered[1].description,
        "Sets the temperature of the room's thermostat."
    );
    assert_eq!(
        offered[0].input_schema["properties"]["command"]["description"],
        "The user's request for a lighting color change."
    );
}

#[tokio::test]
async fn set_the_temperature_to_72() {
    let (ctx, oracle) = scripted_context([
        OracleReply::call("setThermostat", json!({ "command": "set the temperature to 72" })),
        OracleReply::call("extractTemperature", json!({ "temperatureContext": "72" })),
        OracleReply::text("72"),
        OracleReply::call("setThermostatTemperature", json!({ "temperature": 72 })),
        OracleReply::text("The thermostat is set to 72."),
        OracleReply::text("Done, it is 72 degrees now."),
    ]);

    let response = handle_command(&ctx, "set the temperature to 72")
        .await
        .expect("response");

    assert_eq!(response, "Done, it is 72 degrees now.");
    let state = ctx.store.snapshot();
    assert_eq!(state.temp.value(), 72.0);
    assert_eq!(state.color.as_str(), "FF0000");
    assert_eq!(oracle.remaining(), 0);
}

#[tokio::test]
async fn one_command_can_touch_both_domains() {
    let (ctx, _oracle) = scripted_context([
        OracleReply::call("setLights", json!({ "command": "make the lights blue" }))
            .and_call("setThermostat", json!({ "command": "warm it up" })),
        OracleReply::call("setLEDColor", json!({ "hexColorCode": "0000FF" })),
        OracleReply::text("Lights are blue."),
        OracleReply::call("setThermostatTemperature", json!({ "temperature": 70 })),
        OracleReply::text("Thermostat is at 70."),
        OracleReply::text("All set."),
    ]);

    let response = handle_command(&ctx, "make the lights blue and warm it up")
        .await
        .expect("response");

    assert_eq!(response, "All set.");
    let state = ctx.store.snapshot();
    assert_eq!(state.color.as_str(), "0000FF");
    assert_eq!(state.temp.value(), 70.0);
}

#[tokio::test]
async fn second_domain_failure_keeps_first_domain_change() {
    let (ctx, _oracle) = scripted_context([
        ScriptStep::Reply(
            OracleReply::call("setLights", json!({ "command": "blue" }))
                .and_call("setThermostat", json!({ "command": "warmer" })),
        ),
        ScriptStep::Reply(OracleReply::call(
            "setLEDColor",
            json!({ "hexColorCode": "0000FF" }),
        )),
        ScriptStep::Reply(OracleReply::text("Lights are blue.")),
        ScriptStep::Fail("backend overloaded".into()),
    ]);

    let err = handle_command(&ctx, "blue and warmer")
        .await
        .expect_err("should fail");

    assert!(matches!(err, PipelineError::Oracle(_)));
    let state = ctx.store.snapshot();
    assert_eq!(state.color.as_str(), "0000FF");
    assert_eq!(state.temp.value(), 67.0);
}

#[tokio::test]
async fn capability_results_are_fed_back_to_the_oracle() {
    let (ctx, oracle) = scripted_context([
        OracleReply::call("setLEDColor", json!({ "hexColorCode": "00FF00" })),
        OracleReply::text("Green it is."),
    ]);

    lights::set_lights(&ctx, "green please").await.expect("response");

    let requests = oracle.requests();
    let follow_up = &requests[1];
    assert_eq!(follow_up.messages.len(), 3);
    assert_eq!(follow_up.messages[1].role, Role::Model);
    assert_eq!(follow_up.messages[2].role, Role::Tool);
    assert_eq!(
        follow_up.messages[2].parts,
        vec![Part::Result {
            name: "setLEDColor".into(),
            output: json!(true),
        }]
    );
}

#[tokio::test]
async fn unknown_capability_is_an_error() {
    let (ctx, _oracle) = scripted_context([OracleReply::call(
        "openGarageDoor",
        json!({}),
    )]);

    let err = handle_command(&ctx, "open the garage")
        .await
        .expect_err("should fail");
    assert!(matches!(err, PipelineError::UnknownCapability(ref name) if name == "openGarageDoor"));
}

#[tokio::test]
async fn round_limit_stops_a_looping_oracle() {
    let (ctx, _oracle) = scripted_context([
        OracleReply::call("setLEDColor", json!({ "hexColorCode": "000001" })),
        OracleReply::call("setLEDColor", json!({ "hexColorCode": "000002" })),
    ]);
    let ctx = ctx.with_options(PipelineOptions {
        max_tool_rounds: 1,
        ..PipelineOptions::default()
    });

    let err = lights::set_lights(&ctx, "cycle colors")
        .await
        .expect_err("should fail");
    assert!(matches!(err, PipelineError::TooManyRounds(1)));
    assert_eq!(ctx.store.snapshot().color.as_str(), "000001");
}

#[tokio::test(start_paused = true)]
async fn slow_oracle_times_out() {
    let (ctx, _oracle) = scripted_context([ScriptStep::Delayed(
        Duration::from_secs(60),
        Box::new(ScriptStep::Reply(OracleReply::text("too late"))),
    )]);
    let ctx = ctx.with_options(PipelineOptions {
        oracle_timeout: Duration::from_secs(5),
        ..PipelineOptions::default()
    });

    let err = handle_command(&ctx, "lights blue")
        .await
        .expect_err("should time out");
    assert!(matches!(err, PipelineError::OracleTimeout(limit) if limit == Duration::from_secs(5)));
}

#[tokio::test]
async fn unconfigured_oracle_fails_every_command() {
    let ctx = HomeContext::new(HomeStore::new(), Arc::new(oracle::UnconfiguredOracle));
    let err = handle_command(&ctx, "lights blue")
        .await
        .expect_err("should fail");
    assert!(matches!(
        err,
        PipelineError::Oracle(oracle::OracleError::NotConfigured)
    ));
}
