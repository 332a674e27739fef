//! Application Error Types
//!
//! Centralized error handling with Axum integration.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::infrastructure::relay::RelayError;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Session disconnected: {0}")]
    Disconnected(String),

    #[error("Server is not connected to a message broker")]
    NotConnected,

    #[error("Server is already connected to a message broker")]
    AlreadyConnected,

    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ChatError::NotConnected => (
                StatusCode::SERVICE_UNAVAILABLE,
                10001,
                "Chat relay unavailable".to_string(),
            ),
            other => {
                tracing::error!("Internal error: {}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, 10000, "Internal server error".into())
            }
        };

        (status, Json(ErrorResponse { code, message })).into_response()
    }
}
