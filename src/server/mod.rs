//! HTTP surface of the translator.
//!
//! - `POST /translate` accepts a [`TranslationRequest`] and answers with a
//!   [`TranslationResponse`] or `{"error": message}`.
//! - `GET /health` answers `{"status": "ok", "service": "arkham-localize"}`.

#[cfg(test)]
mod tests;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::retrieval::RetrievalError;
use crate::translator::{TranslateError, TranslationRequest, TranslationResponse, Translator};

pub const SERVICE_NAME: &str = "arkham-localize";

#[derive(Clone)]
pub struct AppState {
    translator: Arc<Translator>,
}

/// An error answered as `{"error": message}` with a matching status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// 400 for bad input, 500 when the store fails, 502 when an upstream model
/// call fails.
#[inline]
pub fn status_for(error: &TranslateError) -> StatusCode {
    if error.is_client_error() {
        return StatusCode::BAD_REQUEST;
    }
    match error {
        TranslateError::Retrieval(RetrievalError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl From<TranslateError> for ApiError {
    #[inline]
    fn from(error: TranslateError) -> Self {
        Self {
            status: status_for(&error),
            message: error.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    #[inline]
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: format!("Invalid request body: {}", rejection.body_text()),
        }
    }
}

impl IntoResponse for ApiError {
    #[inline]
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("{} {}", self.status, self.message);
        } else {
            warn!("{} {}", self.status, self.message);
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[inline]
pub fn app_router(translator: Arc<Translator>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/translate", post(translate_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { translator })
}

/// Bind `addr` and serve until the process stops.
#[inline]
pub async fn serve(translator: Arc<Translator>, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Listening on http://{}", addr);
    info!("POST /translate - translate card text");
    info!("GET  /health - health check");

    axum::serve(listener, app_router(translator))
        .await
        .context("HTTP server failed")
}

async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
    }))
}

async fn translate_handler(
    State(state): State<AppState>,
    payload: Result<Json<TranslationRequest>, JsonRejection>,
) -> Result<Json<TranslationResponse>, ApiError> {
    let Json(request) = payload?;
    let response = state.translator.translate(&request).await?;
    Ok(Json(response))
}
