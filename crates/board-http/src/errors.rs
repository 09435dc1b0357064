//! HTTP error types and their JSON responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use board_core::ConfigError;
use board_store::StoreError;
use serde_json::json;
use thiserror::Error;

/// Result type for HTTP operations
pub type HttpResult<T> = Result<T, HttpError>;

/// HTTP server errors
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Server startup failed: {message}")]
    StartupFailed { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("{message}")]
    BadRequest { message: String },

    #[error("Request body exceeds the {limit} byte limit")]
    RequestTooLarge { limit: usize },

    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("Internal server error: {message}")]
    InternalError { message: String },
}

impl HttpError {
    pub fn startup<T: Into<String>>(message: T) -> Self {
        HttpError::StartupFailed {
            message: message.into(),
        }
    }

    pub fn config<T: Into<String>>(message: T) -> Self {
        HttpError::ConfigError {
            message: message.into(),
        }
    }

    pub fn bad_request<T: Into<String>>(message: T) -> Self {
        HttpError::BadRequest {
            message: message.into(),
        }
    }

    pub fn not_found<T: Into<String>>(resource: T) -> Self {
        HttpError::NotFound {
            resource: resource.into(),
        }
    }

    pub fn payload_too_large(limit: usize) -> Self {
        HttpError::RequestTooLarge { limit }
    }

    pub fn internal<T: Into<String>>(message: T) -> Self {
        HttpError::InternalError {
            message: message.into(),
        }
    }

    /// Status code sent to the client
    pub fn status_code(&self) -> StatusCode {
        match self {
            HttpError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            HttpError::NotFound { .. } => StatusCode::NOT_FOUND,
            HttpError::RequestTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            HttpError::StartupFailed { .. }
            | HttpError::ConfigError { .. }
            | HttpError::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for HttpError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(_) => HttpError::not_found("Whiteboard"),
            other => HttpError::internal(other.to_string()),
        }
    }
}

impl From<ConfigError> for HttpError {
    fn from(error: ConfigError) -> Self {
        HttpError::config(error.to_string())
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
