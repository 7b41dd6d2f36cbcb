use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;

use crate::clients::mal::MalError;
use crate::store::StorageError;

/// Error body shape shared by every route: a JSON object with an `error`
/// field. Upstream bodies are re-embedded as parsed JSON when possible so
/// diagnostics survive the passthrough.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: serde_json::Value,
}

#[derive(Debug)]
pub enum ApiError {
    Validation(String),

    Forbidden(String),

    Upstream { status: u16, body: String },

    Storage(String),

    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::Upstream { status, .. } => write!(f, "Upstream error: status {}", status),
            ApiError::Storage(msg) => write!(f, "Storage error: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.into()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.into()),
            ApiError::Upstream { status, body } => {
                tracing::warn!("upstream error {}: {}", status, body);
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                let error = serde_json::from_str(&body)
                    .unwrap_or_else(|_| serde_json::Value::String(body));
                (status, error)
            }
            ApiError::Storage(msg) => {
                tracing::error!("storage error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.into())
            }
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.into())
            }
        };

        (status, Json(ErrorBody { error })).into_response()
    }
}

impl From<MalError> for ApiError {
    fn from(err: MalError) -> Self {
        match err {
            MalError::Auth { status, body } | MalError::Upstream { status, body } => {
                ApiError::Upstream { status, body }
            }
            MalError::Transport(err) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Storage(err.to_string())
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ApiError::Forbidden(msg.into())
    }
}
