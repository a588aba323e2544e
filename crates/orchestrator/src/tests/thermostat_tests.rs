use oracle::OracleReply;
use serde_json::json;

use super::*;
use crate::tests::scripted_context;

fn temp(value: f64) -> Temperature {
    Temperature::new(value).expect("temp")
}

#[test]
fn normalize_reads_the_leading_number() {
    assert_eq!(normalize_temperature("72").expect("72").value(), 72.0);
    assert_eq!(
        normalize_temperature("  68.5 degrees").expect("68.5").value(),
        68.5
    );
    assert_eq!(normalize_temperature("1e2").expect("1e2").value(), 100.0);
    assert_eq!(normalize_temperature("0").expect("0").value(), 0.0);
    assert_eq!(normalize_temperature(".5").expect(".5").value(), 0.5);
    assert_eq!(normalize_temperature("+70.").expect("+70.").value(), 70.0);
    assert_eq!(normalize_temperature("3e1F").expect("3e1F").value(), 30.0);
    assert_eq!(normalize_temperature("45e").expect("45e").value(), 45.0);
}

#[test]
fn normalize_rejects_out_of_range_without_clamping() {
    for raw in ["150", "-5", "100.01", "1e400"] {
        let err = normalize_temperature(raw).expect_err(raw);
        assert!(
            matches!(err, PipelineError::NormalizationFailed { attribute: "temperature", .. }),
            "unexpected error for {raw:?}: {err}"
        );
    }
}

#[test]
fn normalize_rejects_answers_without_a_number() {
    for raw in ["warm", "about 70", "", "-", ".", "+", "e5"] {
        assert!(normalize_temperature(raw).is_err(), "{raw:?} should fail");
    }
}

#[tokio::test]
async fn extractor_reads_a_fresh_snapshot_each_time() {
    let (ctx, oracle) = scripted_context([OracleReply::text("62"), OracleReply::text("72")]);

    ctx.store.send(HomeEvent::SetTemp { value: temp(60.0) });
    let first = extract_temperature(&ctx, "a bit warmer").await.expect("first");
    assert_eq!(first.value(), 62.0);

    ctx.store.send(HomeEvent::SetTemp { value: temp(70.0) });
    let second = extract_temperature(&ctx, "a bit warmer").await.expect("second");
    assert_eq!(second.value(), 72.0);

    let requests = oracle.requests();
    assert!(requests[0]
        .prompt_text()
        .unwrap_or_default()
        .starts_with("The current temperature is 60. "));
    assert!(requests[1]
        .prompt_text()
        .unwrap_or_default()
        .starts_with("The current temperature is 70. "));
    assert!(requests[1]
        .prompt_text()
        .unwrap_or_default()
        .ends_with("What temperature is the following text referring to? : a bit warmer"));
}

#[tokio::test]
async fn thermostat_controller_sets_extracted_temperature() {
    let (ctx, oracle) = scripted_context([
        OracleReply::call("extractTemperature", json!({ "temperatureContext": "a hot summer day" })),
        OracleReply::text("85"),
        OracleReply::call("setThermostatTemperature", json!({ "temperature": 85 })),
        OracleReply::text("Set to 85 degrees."),
    ]);

    let response = set_thermostat(&ctx, "make it feel like a hot summer day")
        .await
        .expect("response");

    assert_eq!(response, "Set to 85 degrees.");
    assert_eq!(ctx.store.snapshot().temp.value(), 85.0);
    assert_eq!(ctx.store.snapshot().color.as_str(), "FF0000");

    let requests = oracle.requests();
    let names: Vec<_> = requests[0]
        .capabilities
        .iter()
        .map(|decl| decl.name.as_str())
        .collect();
    assert_eq!(names, vec!["extractTemperature", "setThermostatTemperature"]);
    assert_eq!(
        requests[2].messages.last().map(|m| m.parts.clone()),
        Some(vec![oracle::Part::Result {
            name: "extractTemperature".into(),
            output: json!({ "temperature": 85 }),
        }])
    );
}

#[tokio::test]
async fn out_of_range_extraction_leaves_temperature_unchanged() {
    let (ctx, _oracle) = scripted_context([
        OracleReply::call("extractTemperature", json!({ "temperatureContext": "boiling" })),
        OracleReply::text("212"),
    ]);

    let err = set_thermostat(&ctx, "make it boiling")
        .await
        .expect_err("should fail");

    assert!(matches!(err, PipelineError::NormalizationFailed { .. }));
    assert_eq!(ctx.store.snapshot().temp.value(), 67.0);
}

#[tokio::test]
async fn setter_rejects_out_of_range_arguments() {
    let (ctx, _oracle) = scripted_context([OracleReply::call(
        "setThermostatTemperature",
        json!({ "temperature": 150 }),
    )]);

    let err = set_thermostat(&ctx, "150 please")
        .await
        .expect_err("should fail");

    assert_eq!(
        err.to_string(),
        "invalid arguments for setThermostatTemperature: temperature - Number must be less than or equal to 100"
    );
    assert_eq!(ctx.store.snapshot().temp.value(), 67.0);
}

#[test]
fn declarations_keep_their_descriptions() {
    let decl = ExtractTemperature.declaration();
    assert!(decl
        .description
        .ends_with("Has access to the current temperature and can make adjustments to it."));
    assert_eq!(
        decl.input_schema["properties"]["temperatureContext"]["description"],
        "Text that refers to a number temperature or any object that has a temperature."
    );
    assert_eq!(decl.input_schema["required"], json!(["temperatureContext"]));

    let setter = SetThermostatTemperature.declaration();
    let temperature = &setter.input_schema["properties"]["temperature"];
    assert_eq!(temperature["type"], "number");
    assert_eq!(temperature["minimum"], 0.0);
    assert_eq!(temperature["maximum"], 100.0);
    assert!(setter.input_schema.get("$schema").is_none());
    assert!(setter.input_schema.get("title").is_none());

    let controller = SetThermostat.declaration();
    assert_eq!(
        controller.input_schema["properties"]["command"]["description"],
        "The user's request for a room temperature change."
    );
}
