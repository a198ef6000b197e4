//! HTTP surface
//!
//! Routes:
//! - `POST   /chat`           answer a message, creating a session id when absent
//! - `DELETE /sessions/{id}`  forget a session (idempotent, 204)
//! - `GET    /health`         liveness plus session/tool counts
//! - `GET    /stats`          document statistics via the registry

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::ChatHandler;
use crate::error::{DocentError, Result};
use crate::session::Message;

/// Body of `POST /chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
    /// Replaces stored history as model context for this message
    #[serde(default)]
    pub chat_history: Option<Vec<Message>>,
}

/// Response of `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
    pub status: String,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub active_sessions: usize,
    pub tools: Vec<String>,
    pub model: String,
    pub provider: String,
}

/// A request the handler never sees.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

type SharedHandler = Arc<ChatHandler>;

/// Build the router over a shared handler.
pub fn router(handler: SharedHandler) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/sessions/{id}", delete(clear_session))
        .route("/health", get(health))
        .route("/stats", get(stats))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(handler)
}

/// Bind `host:port` and serve until Ctrl-C.
pub async fn serve(handler: SharedHandler, host: &str, port: u16) -> Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    crate::log_component!(info, "gateway", "Gateway listening", addr = addr.as_str());

    axum::serve(listener, router(handler))
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received shutdown signal");
            }
        })
        .await
        .map_err(DocentError::Io)
}

async fn chat(
    State(handler): State<SharedHandler>,
    Json(request): Json<ChatRequest>,
) -> std::result::Result<Json<ChatResponse>, ApiError> {
    if request.message.trim().is_empty() {
        return Err(ApiError::bad_request("message must not be empty"));
    }
    let session_id = request
        .session_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let response = handler
        .handle_message(&session_id, &request.message, request.chat_history)
        .await;

    Ok(Json(ChatResponse {
        response,
        session_id,
        status: "success".to_string(),
    }))
}

async fn clear_session(State(handler): State<SharedHandler>, Path(id): Path<String>) -> StatusCode {
    handler.clear_session(&id).await;
    StatusCode::NO_CONTENT
}

async fn health(State(handler): State<SharedHandler>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        active_sessions: handler.active_sessions().await,
        tools: handler
            .registry()
            .names()
            .into_iter()
            .map(String::from)
            .collect(),
        model: handler.model().to_string(),
        provider: handler.agent().provider_name().to_string(),
    })
}

async fn stats(State(handler): State<SharedHandler>) -> Json<Value> {
    let raw = handler
        .registry()
        .dispatch("get_document_stats", Map::new())
        .await;
    let document_stats = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
    Json(json!({
        "system": "docent",
        "status": "running",
        "document_stats": document_stats,
    }))
}
