//! HTTP routes for SupportDesk Gateway

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use supportdesk_context::Turn;

use crate::error::GatewayError;
use crate::metrics;
use crate::service::{ChatReply, ChatService};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageRequest {
    /// Any JSON type; a non-string message is invalid input.
    #[serde(default)]
    pub message: Option<Value>,
    /// String or null.
    #[serde(default)]
    pub session_id: Option<Value>,
}

impl ChatMessageRequest {
    fn session_id(&self) -> Result<Option<&str>, GatewayError> {
        match &self.session_id {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(id)) => Ok(Some(id.as_str())),
            Some(_) => Err(GatewayError::invalid_input("sessionId must be a string.")),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<Turn>,
}

/// Build the main router for the gateway
pub fn build_routes(service: Arc<ChatService>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/chat/message", post(chat_message))
        .route("/chat/history/:session_id", get(chat_history))
        .with_state(service)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::export(),
    )
}

async fn chat_message(
    State(service): State<Arc<ChatService>>,
    payload: Result<Json<ChatMessageRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, GatewayError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "rejected chat request body");
        GatewayError::invalid_input(format!("Invalid request body: {}", rejection.body_text()))
    })?;
    let session_id = request.session_id()?;
    let reply = service
        .send_message(request.message.as_ref().and_then(Value::as_str), session_id)
        .await?;
    Ok(Json(reply))
}

async fn chat_history(
    State(service): State<Arc<ChatService>>,
    Path(session_id): Path<String>,
) -> Response {
    match service.history(&session_id).await {
        Ok(history) => Json(HistoryResponse { history }).into_response(),
        Err(e) => {
            tracing::error!(session_id = %session_id, error = %e, "history lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch history." })),
            )
                .into_response()
        }
    }
}
