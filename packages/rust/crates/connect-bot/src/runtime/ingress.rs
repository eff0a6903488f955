//! Webhook ingress: validate, acknowledge, enqueue. Dialogue work happens off this path.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::config::normalize_webhook_path;
use crate::event::InboundMessage;
use crate::observability::DialogueEvent;

use super::worker_pool::InFlightLimit;

/// Router plus the normalized webhook route it serves.
pub struct IngressApp {
    pub app: Router,
    pub path: String,
}

#[derive(Clone)]
struct IngressState {
    tx: mpsc::Sender<InboundMessage>,
    limit: InFlightLimit,
}

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub queue_capacity: usize,
    pub queued_events: usize,
    pub max_in_flight_events: usize,
    pub in_flight_events: usize,
}

/// Build the ingress router: `POST <webhook_path>` and `GET /health`.
pub fn build_ingress_app(
    webhook_path: &str,
    tx: mpsc::Sender<InboundMessage>,
    limit: InFlightLimit,
) -> IngressApp {
    let path = normalize_webhook_path(webhook_path);
    let app = Router::new()
        .route("/health", get(health_handler))
        .route(&path, post(webhook_handler))
        .with_state(IngressState { tx, limit });
    IngressApp { app, path }
}

async fn webhook_handler(
    State(state): State<IngressState>,
    Json(msg): Json<InboundMessage>,
) -> Result<StatusCode, (StatusCode, String)> {
    if msg.is_foreign_content() {
        tracing::debug!(
            event = DialogueEvent::EventDropped.as_str(),
            user_id = %msg.user_id,
            message_id = %msg.message_id,
            "dropped message not written by the subscriber"
        );
        return Ok(StatusCode::OK);
    }
    tracing::info!(
        user_id = %msg.user_id,
        line_id = %msg.line_id,
        message_type = i64::from(msg.message_type),
        "webhook event accepted"
    );
    if state.tx.send(msg).await.is_err() {
        tracing::error!("inbound queue unavailable");
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "inbound queue unavailable".to_string(),
        ));
    }
    Ok(StatusCode::OK)
}

async fn health_handler(State(state): State<IngressState>) -> Json<HealthResponse> {
    let queue_capacity = state.tx.max_capacity();
    Json(HealthResponse {
        status: "healthy",
        queue_capacity,
        queued_events: queue_capacity.saturating_sub(state.tx.capacity()),
        max_in_flight_events: state.limit.max(),
        in_flight_events: state.limit.in_flight(),
    })
}
