use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use home_state::HomeStore;
use oracle::{GeminiConfig, GeminiOracle, Oracle, UnconfiguredOracle};
use orchestrator::HomeContext;
use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

mod api;
mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, Settings};

const MAX_BODY_BYTES: usize = 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    let oracle = build_oracle(&settings)?;
    let store = HomeStore::new();
    spawn_transition_log(&store);

    let home = HomeContext::new(store, oracle).with_options(settings.pipeline_options());
    let app = build_router(Arc::new(AppState { home }));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(api::index))
        .route("/healthz", get(api::healthz))
        .route("/state", get(api::get_state).post(api::post_state))
        .route("/command", post(api::post_command))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

fn build_oracle(settings: &Settings) -> anyhow::Result<Arc<dyn Oracle>> {
    let Some(api_key) = settings.gemini_api_key.clone() else {
        warn!("no Gemini API key configured; /command will fail until one is set");
        return Ok(Arc::new(UnconfiguredOracle));
    };

    let oracle = GeminiOracle::new(GeminiConfig {
        api_key,
        model: settings.gemini_model.clone(),
        base_url: Url::parse(&settings.gemini_base_url)?,
        temperature: settings.oracle_temperature,
        request_timeout: settings.oracle_timeout(),
    })?;
    info!(endpoint = %oracle.endpoint(), "using gemini oracle");
    Ok(Arc::new(oracle))
}

/// Logs every home state change.
fn spawn_transition_log(store: &HomeStore) -> JoinHandle<()> {
    let mut transitions = store.subscribe();
    tokio::spawn(async move {
        loop {
            match transitions.recv().await {
                Ok(transition) => info!(
                    event = transition.event.kind(),
                    temp = %transition.state.temp,
                    color = %transition.state.color,
                    "home state changed"
                ),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "state change log fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
