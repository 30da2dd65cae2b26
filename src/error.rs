//! Error types and HTTP mapping for the route enricher

use axum::{
    Json,
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Main error type for the route enricher
#[derive(Error, Debug)]
pub enum EnricherError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Request body could not be read as an enrichment request
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Weather lookup failures. These abort the whole batch.
    #[error("Weather lookup failed: {message}")]
    Weather { message: String },

    /// Request body could not be buffered, e.g. over the size limit
    #[error("Request body rejected: {message}")]
    Body { status: StatusCode, message: String },

    /// Missing or wrong function key
    #[error("Unauthorized")]
    Unauthorized,

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl EnricherError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new invalid request error
    pub fn invalid_request<S: Into<String>>(message: S) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a new weather lookup error
    pub fn weather<S: Into<String>>(message: S) -> Self {
        Self::Weather {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// HTTP status this error is reported with
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            EnricherError::Unauthorized => StatusCode::UNAUTHORIZED,
            EnricherError::Body { status, .. } => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for EnricherError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Route enrichment failed");
        } else {
            tracing::warn!(error = %self, "Request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<serde_json::Error> for EnricherError {
    fn from(err: serde_json::Error) -> Self {
        EnricherError::invalid_request(err.to_string())
    }
}

impl From<BytesRejection> for EnricherError {
    fn from(rejection: BytesRejection) -> Self {
        EnricherError::Body {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}
