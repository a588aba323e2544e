use std::{collections::HashMap, fs, time::Duration};

use orchestrator::PipelineOptions;

const SETTINGS_FILE: &str = "server.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub server_bind: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub oracle_temperature: f32,
    pub oracle_timeout_secs: u64,
    pub max_tool_rounds: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:3000".into(),
            gemini_api_key: None,
            gemini_model: oracle::gemini::DEFAULT_MODEL.into(),
            gemini_base_url: oracle::gemini::DEFAULT_BASE_URL.into(),
            oracle_temperature: 0.0,
            oracle_timeout_secs: 30,
            max_tool_rounds: 5,
        }
    }
}

impl Settings {
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            oracle_timeout: self.oracle_timeout(),
            max_tool_rounds: self.max_tool_rounds,
        }
    }
}

/// Defaults, then `server.toml`, then the environment (a `.env` file counts).
pub fn load_settings() -> Settings {
    let _ = dotenvy::dotenv();
    let file = fs::read_to_string(SETTINGS_FILE).ok();
    resolve_settings(file.as_deref(), |key| std::env::var(key).ok())
}

pub fn resolve_settings(file: Option<&str>, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Some(file_cfg) = file.and_then(parse_settings_file) {
        if let Some(v) = file_cfg.get("bind_addr") {
            settings.server_bind = v.clone();
        }
        if let Some(v) = file_cfg.get("gemini_model") {
            settings.gemini_model = v.clone();
        }
        if let Some(v) = file_cfg.get("gemini_base_url") {
            settings.gemini_base_url = v.clone();
        }
        if let Some(v) = file_cfg.get("oracle_temperature") {
            set_parsed(&mut settings.oracle_temperature, v);
        }
        if let Some(v) = file_cfg.get("oracle_timeout_secs") {
            set_nonzero(&mut settings.oracle_timeout_secs, v);
        }
        if let Some(v) = file_cfg.get("max_tool_rounds") {
            set_nonzero(&mut settings.max_tool_rounds, v);
        }
    }

    if let Some(port) = env("PORT") {
        settings.server_bind = with_port(&settings.server_bind, &port);
    }
    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    for key in ["GOOGLE_GENAI_API_KEY", "GOOGLE_API_KEY", "APP__GEMINI_API_KEY"] {
        if let Some(v) = env(key).filter(|v| !v.trim().is_empty()) {
            settings.gemini_api_key = Some(v);
        }
    }

    if let Some(v) = env("APP__GEMINI_MODEL") {
        settings.gemini_model = v;
    }
    if let Some(v) = env("APP__GEMINI_BASE_URL") {
        settings.gemini_base_url = v;
    }
    if let Some(v) = env("APP__ORACLE_TEMPERATURE") {
        set_parsed(&mut settings.oracle_temperature, &v);
    }
    if let Some(v) = env("APP__ORACLE_TIMEOUT_SECS") {
        set_nonzero(&mut settings.oracle_timeout_secs, &v);
    }
    if let Some(v) = env("APP__MAX_TOOL_ROUNDS") {
        set_nonzero(&mut settings.max_tool_rounds, &v);
    }

    settings
}

/// Flat `key = value` table; non-string values are kept in their TOML text form.
fn parse_settings_file(raw: &str) -> Option<HashMap<String, String>> {
    let table = toml::from_str::<HashMap<String, toml::Value>>(raw).ok()?;
    Some(
        table
            .into_iter()
            .map(|(key, value)| {
                let text = match value {
                    toml::Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, text)
            })
            .collect(),
    )
}

fn set_parsed<T: std::str::FromStr>(slot: &mut T, raw: &str) {
    if let Ok(parsed) = raw.trim().parse::<T>() {
        *slot = parsed;
    }
}

/// Like `set_parsed`, but zero keeps the current value.
fn set_nonzero<T: std::str::FromStr + Default + PartialEq>(slot: &mut T, raw: &str) {
    if let Ok(parsed) = raw.trim().parse::<T>() {
        if parsed != T::default() {
            *slot = parsed;
        }
    }
}

fn with_port(bind: &str, port: &str) -> String {
    let host = bind.rsplit_once(':').map_or(bind, |(host, _)| host);
    format!("{host}:{}", port.trim())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
