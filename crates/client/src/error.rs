//! Unified error handling for the client.
//!
//! Every operation returns `Result<T, ApiError>`. The variants follow the
//! failure categories the UI distinguishes: an expired session (handled
//! globally by the HTTP adapter), a rejection from the backend, a transport
//! failure with no response, and local decode/storage problems.

use std::sync::Arc;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Longest slice of a non-JSON error body kept as the message.
const MAX_RAW_MESSAGE: usize = 200;

/// Errors from persisted client storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the state directory failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing state for storage failed.
    #[error("storage encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Client-level error type.
///
/// Cloneable so a single failed fetch can be handed to every caller that
/// was waiting on the same query.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The backend rejected the session token. The session has already been
    /// cleared and the app sent to the login page.
    #[error("Session expired, please log in again")]
    SessionExpired,

    /// The backend answered with a non-success status.
    #[error("API error {status}: {message}")]
    Api {
        status: StatusCode,
        message: String,
        code: Option<String>,
        details: Option<serde_json::Value>,
    },

    /// The request never produced a response.
    #[error("Network error: {0}")]
    Transport(#[source] Arc<reqwest::Error>),

    /// A response body could not be decoded into the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// A URL or request could not be built.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Persisted state could not be read or written.
    #[error("Storage error: {0}")]
    Storage(#[source] Arc<StorageError>),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(Arc::new(err))
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Arc::new(err))
    }
}

/// Error payload the backend sends alongside non-success statuses.
///
/// `error` is either a short label (`"Bad Request"`), the message itself, or
/// a nested object, depending on the backend.
#[derive(Debug, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    details: Option<serde_json::Value>,
}

impl ErrorPayload {
    /// `message` wins; a string `error`, or `error.message`, stands in for it.
    fn message(&self) -> Option<String> {
        let non_empty = |s: &str| Some(s.to_string()).filter(|s| !s.trim().is_empty());
        if let Some(message) = self.message.as_deref().and_then(non_empty) {
            return Some(message);
        }
        match &self.error {
            Some(serde_json::Value::String(s)) => non_empty(s.as_str()),
            Some(serde_json::Value::Object(map)) => map
                .get("message")
                .and_then(serde_json::Value::as_str)
                .and_then(non_empty),
            _ => None,
        }
    }
}

impl ApiError {
    /// Build an `Api` error from a non-success response body.
    ///
    /// JSON bodies are read as `{message?, error?, code?, details?}`; anything else
    /// becomes the message, truncated.
    #[must_use]
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        match serde_json::from_str::<ErrorPayload>(body) {
            Ok(payload) => Self::Api {
                status,
                message: payload.message().unwrap_or_default(),
                code: payload.code,
                details: payload.details,
            },
            Err(_) => Self::Api {
                status,
                message: body.trim().chars().take(MAX_RAW_MESSAGE).collect(),
                code: None,
                details: None,
            },
        }
    }

    /// Human-readable message for the UI.
    ///
    /// Uses the backend's message when it sent one, otherwise `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Api { message, .. } if !message.trim().is_empty() => message.clone(),
            Self::SessionExpired => self.to_string(),
            _ => fallback.to_string(),
        }
    }

    /// HTTP status, when the backend answered.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the backend reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

/// Result type alias for `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_payload() {
        let err = ApiError::from_response(
            StatusCode::BAD_REQUEST,
            r#"{"message":"price must be positive","code":"VALIDATION"}"#,
        );
        match &err {
            ApiError::Api {
                status,
                message,
                code,
                ..
            } => {
                assert_eq!(*status, StatusCode::BAD_REQUEST);
                assert_eq!(message, "price must be positive");
                assert_eq!(code.as_deref(), Some("VALIDATION"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            err.user_message("Failed to create product"),
            "price must be positive"
        );
    }

    #[test]
    fn test_error_field_alias() {
        let err = ApiError::from_response(StatusCode::NOT_FOUND, r#"{"error":"store not found"}"#);
        assert!(err.is_not_found());
        assert_eq!(err.user_message("Failed to fetch store"), "store not found");
    }

    #[test]
    fn test_message_preferred_over_error_label() {
        let err = ApiError::from_response(
            StatusCode::BAD_REQUEST,
            r#"{"error":"Bad Request","message":"price must be positive"}"#,
        );
        assert_eq!(
            err.user_message("Failed to create product"),
            "price must be positive"
        );
    }

    #[test]
    fn test_nested_error_object() {
        let err = ApiError::from_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"error":{"message":"slug already taken","field":"slug"}}"#,
        );
        assert_eq!(err.user_message("Failed to update store"), "slug already taken");

        let err = ApiError::from_response(StatusCode::BAD_REQUEST, r#"{"error":{"field":"slug"}}"#);
        assert_eq!(err.user_message("Failed to update store"), "Failed to update store");
    }

    #[test]
    fn test_plain_text_body_is_truncated() {
        let body = "x".repeat(500);
        let err = ApiError::from_response(StatusCode::BAD_GATEWAY, &body);
        match err {
            ApiError::Api { message, .. } => assert_eq!(message.len(), MAX_RAW_MESSAGE),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_fallback_when_no_message() {
        let err = ApiError::from_response(StatusCode::INTERNAL_SERVER_ERROR, "{}");
        assert_eq!(err.user_message("Failed to fetch stores"), "Failed to fetch stores");

        let err = ApiError::Decode("bad".to_string());
        assert_eq!(err.user_message("Failed to fetch stores"), "Failed to fetch stores");
    }

    #[test]
    fn test_session_expired_message() {
        assert_eq!(
            ApiError::SessionExpired.user_message("ignored"),
            "Session expired, please log in again"
        );
    }
}
