//! Gateway HTTP server: health probe and the message relay endpoint.

use crate::assistant::AssistantError;
use crate::config::{self, Config};
use crate::forward::InboundMessage;
use crate::provision::ProvisionError;
use crate::service::{AssistantService, ServiceError};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared state for the gateway.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    pub service: Arc<AssistantService>,
}

/// Routes: `GET /` health, `POST /api/message` relay.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/api/message", post(message_http))
        .with_state(state)
}

/// Run the gateway server; binds to config.gateway.bind:config.gateway.port.
/// Blocks until shutdown (e.g. Ctrl+C).
/// `config_path` is the path to the config file (used to resolve a relative training file).
/// The assistant is not contacted until the first message arrives.
pub async fn run_gateway(config: Config, config_path: PathBuf) -> Result<()> {
    let mut settings = config::resolve_assistant_settings(&config);
    settings.training_file = config::resolve_training_file(&config, &config_path);
    if settings.url.is_none() {
        log::warn!(
            "assistant url is not configured (set assistant.url or {}); messages will fail",
            config::ENV_SERVICE_URL
        );
    }
    let state = GatewayState {
        config: Arc::new(config.clone()),
        service: Arc::new(AssistantService::new(settings)),
    };
    let app = router(state);

    let bind_addr = format!("{}:{}", config.gateway.bind.trim(), config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

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
            log::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                log::error!("failed to install SIGTERM handler: {}", e);
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

/// GET / returns a simple health JSON (for probes). `workspace` is null until the first message initializes it.
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.config.gateway.port,
        "workspace": state.service.workspace_id(),
    }))
}

/// POST /api/message — forwards `{ input: { text }, context }` and returns the assistant response as-is.
/// An empty or `null` body yields 200 with no body.
async fn message_http(State(state): State<GatewayState>, body: Bytes) -> Response {
    let inbound = match parse_inbound(&body) {
        Ok(m) => m,
        Err(e) => {
            log::debug!("rejecting malformed message body: {}", e);
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };
    match state.service.message(inbound).await {
        Ok(Some(response)) => Json(response).into_response(),
        Ok(None) => StatusCode::OK.into_response(),
        Err(e) => error_response(e),
    }
}

fn parse_inbound(body: &[u8]) -> Result<Option<InboundMessage>, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
}

/// Remote API errors keep the remote status and body. Transport failures map to 502, local failures to 500.
fn error_response(err: ServiceError) -> Response {
    log::error!("message failed: {}", err);
    let remote = match &err {
        ServiceError::Remote(e) => Some(e),
        ServiceError::Provisioning(ProvisionError::List(e))
        | ServiceError::Provisioning(ProvisionError::Create(e)) => Some(e),
        _ => None,
    };
    match remote {
        Some(AssistantError::Api { status, body }) => {
            let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY);
            let content_type = if serde_json::from_str::<serde_json::Value>(body).is_ok() {
                "application/json"
            } else {
                "text/plain; charset=utf-8"
            };
            (status, [(header::CONTENT_TYPE, content_type)], body.clone()).into_response()
        }
        Some(AssistantError::Request(_)) => {
            (StatusCode::BAD_GATEWAY, err.to_string()).into_response()
        }
        None => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}
