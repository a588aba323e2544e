use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use reqwest::{Client, Response};
use serde_json::{json, Map, Value};
use shared::{
    domain::HomeState,
    error::ApiError,
    protocol::{CommandRequest, CommandResponse},
};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    server_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current temperature and light color.
    State,
    /// Set the home state directly, bypassing the oracle.
    Set {
        #[arg(long)]
        color: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        temp: Option<f64>,
    },
    /// Send a natural-language command.
    Command { text: Vec<String> },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let server_url = cli.server_url.trim_end_matches('/');
    let http = Client::new();

    match cli.command {
        Command::State => {
            let res = http.get(format!("{server_url}/state")).send().await?;
            let state: HomeState = success(res).await?.json().await?;
            print_state(&state);
        }
        Command::Set { color, temp } => {
            let body = update_body(color, temp)?;
            let res = http
                .post(format!("{server_url}/state"))
                .json(&body)
                .send()
                .await?;
            let state: HomeState = success(res).await?.json().await?;
            print_state(&state);
        }
        Command::Command { text } => {
            let command = text.join(" ");
            if command.trim().is_empty() {
                bail!("nothing to send");
            }
            let res = http
                .post(format!("{server_url}/command"))
                .json(&CommandRequest { command })
                .send()
                .await?;
            let reply: CommandResponse = success(res).await?.json().await?;
            println!("{}", reply.response);
            print_state(&reply.state);
        }
    }

    Ok(())
}

/// Only the flags that were given end up in the body; the server validates them.
fn update_body(color: Option<String>, temp: Option<f64>) -> Result<Value> {
    let mut body = Map::new();
    if let Some(color) = color {
        body.insert("color".into(), json!(color.trim_start_matches('#')));
    }
    if let Some(temp) = temp {
        body.insert("temp".into(), json!(temp));
    }
    if body.is_empty() {
        bail!("pass --color and/or --temp");
    }
    Ok(Value::Object(body))
}

async fn success(res: Response) -> Result<Response> {
    if res.status().is_success() {
        return Ok(res);
    }
    let status = res.status();
    let text = res.text().await.unwrap_or_default();
    Err(anyhow!(error_message(status.as_u16(), &text)))
}

fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ApiError>(body) {
        Ok(err) => err.message,
        Err(_) if body.trim().is_empty() => format!("server answered {status}"),
        Err(_) => format!("server answered {status}: {}", body.trim()),
    }
}

fn print_state(state: &HomeState) {
    println!("temp={} color={}", state.temp, state.color);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_body_has_only_given_fields() {
        let body = update_body(Some("#00ff00".into()), None).expect("body");
        assert_eq!(body, json!({ "color": "00ff00" }));

        let body = update_body(None, Some(72.0)).expect("body");
        assert_eq!(body, json!({ "temp": 72.0 }));
    }

    #[test]
    fn update_body_needs_a_field() {
        assert!(update_body(None, None).is_err());
    }

    #[test]
    fn api_errors_show_their_message() {
        let body = r#"{"code":"validation","message":"temp - Number must be less than or equal to 100"}"#;
        assert_eq!(
            error_message(500, body),
            "temp - Number must be less than or equal to 100"
        );
        assert_eq!(error_message(502, "bad gateway"), "server answered 502: bad gateway");
        assert_eq!(error_message(404, ""), "server answered 404");
    }

    #[test]
    fn command_words_are_joined() {
        let cli = Cli::try_parse_from(["homectl", "command", "make", "it", "blue"]).expect("cli");
        match cli.command {
            Command::Command { text } => assert_eq!(text.join(" "), "make it blue"),
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.server_url, "http://127.0.0.1:3000");
    }
}
