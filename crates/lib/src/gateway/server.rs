//! Gateway HTTP server: LINE webhook callback and health probe on a single port.

use crate::answers::{CannedAnswers, Dice};
use crate::channels::{self, LineClient, WebhookError};
use crate::config::{self, Config};
use crate::places::GooglePlacesClient;
use crate::routing::{EventRouter, RouterSettings};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

/// Shared state for the gateway (channel secret and the event router).
#[derive(Clone)]
pub struct GatewayState {
    /// Secret the webhook signature is checked against.
    pub channel_secret: Arc<str>,
    pub router: Arc<EventRouter>,
    /// Port reported by the health probe.
    pub port: u16,
}

impl GatewayState {
    pub fn new(channel_secret: impl Into<Arc<str>>, router: Arc<EventRouter>, port: u16) -> Self {
        Self {
            channel_secret: channel_secret.into(),
            router,
            port,
        }
    }
}

/// HTTP routes: `GET /` health, `POST /callback` webhook.
pub fn build_app(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/callback", post(callback))
        .with_state(state)
}

/// Build the production router from config: LINE reply client, Google Places client, canned answers, entropy-seeded dice.
pub fn build_state(config: &Config, credentials: &config::Credentials) -> GatewayState {
    let line = LineClient::new(
        credentials.channel_access_token.clone(),
        config.line.api_base.clone(),
    );
    let places = GooglePlacesClient::new(
        credentials.places_api_key.clone(),
        config.places.api_base.clone(),
    );
    let answers = CannedAnswers::new(config::resolve_answers_with(config, |k| {
        std::env::var(k).ok()
    }));
    if answers.configured() < CannedAnswers::key_range().count() {
        log::warn!(
            "only {} of {} canned answers configured; missing ones reply empty",
            answers.configured(),
            CannedAnswers::key_range().count()
        );
    }
    let router = EventRouter::new(
        Arc::new(line),
        Arc::new(places),
        answers,
        Dice::from_entropy(),
        RouterSettings::from(&config.places),
    );
    GatewayState::new(
        credentials.channel_secret.as_str(),
        Arc::new(router),
        config.gateway.port,
    )
}

/// Run the gateway server; binds to config.gateway.bind:config.gateway.port.
/// Fails before binding when the channel secret, access token or places key is missing.
/// Blocks until shutdown (e.g. Ctrl+C).
pub async fn run_gateway(config: Config) -> Result<()> {
    let credentials = config::resolve_credentials(&config)?;
    let state = build_state(&config, &credentials);
    let app = build_app(state);

    let bind_addr = format!("{}:{}", config.gateway.bind.trim(), config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {} (webhook at /callback)", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// POST /callback — verifies X-Line-Signature, parses the event batch, routes every event.
/// 400 on a bad or missing signature, 500 on an unparseable body, 200 otherwise.
async fn callback(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let signature = headers
        .get(channels::SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    let events = match channels::parse_request(&state.channel_secret, signature, &body) {
        Ok(events) => events,
        Err(e @ WebhookError::InvalidSignature) => {
            log::warn!("callback rejected: {}", e);
            return StatusCode::BAD_REQUEST;
        }
        Err(e @ WebhookError::Malformed(_)) => {
            log::warn!("callback rejected: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    };
    let summary = state.router.route_batch(&events).await;
    log::info!(
        "callback: {} event(s): {} replied, {} silent, {} ignored, {} failed",
        events.len(),
        summary.replied,
        summary.silent,
        summary.ignored,
        summary.failed
    );
    StatusCode::OK
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.port,
    }))
}
