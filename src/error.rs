//! Unified error types for the hit counter and inventory responder.

use std::path::PathBuf;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

/// Unified error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// The store settings file could not be read.
    #[error("failed to read store settings from {path}: {source}")]
    SettingsFile {
        /// Path of the settings file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The store settings file is not valid JSON or lacks a required key.
    #[error("malformed store settings in {path}: {source}")]
    SettingsFormat {
        /// Path of the settings file.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },

    /// Key-value store error (connect, auth, command).
    #[error("store error: {0}")]
    Store(#[from] redis::RedisError),

    /// The store is unreachable (used by the in-memory store).
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The stored counter is not an integer.
    #[error("counter {key} holds a non-integer value {value:?}")]
    CorruptCounter {
        /// Counter key.
        key: String,
        /// Raw stored value.
        value: String,
    },

    /// The message file could not be read.
    #[error("failed to read message file {path}: {source}")]
    MessageFile {
        /// Path of the message file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The counter cannot be incremented without leaving the i64 range.
    #[error("counter {key} is at its maximum value")]
    CounterOverflow {
        /// Counter key.
        key: String,
    },

    /// Inventory lookup of a host that is not in the fixture.
    #[error("unknown host: {0}")]
    UnknownHost(String),

    /// Logging could not be set up.
    #[error("logging setup failed: {0}")]
    Logging(String),

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(error = %self, "request failed");
        crate::metrics::inc_hit_failures();

        let body = "Internal Server Error";
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain")],
            body,
        )
            .into_response()
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_counter_message_names_key_and_value() {
        let err = AppError::CorruptCounter {
            key: "hit_count".to_string(),
            value: "abc".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "counter hit_count holds a non-integer value \"abc\""
        );
    }

    #[test]
    fn errors_render_as_500() {
        let response = AppError::UnknownHost("db-01".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
