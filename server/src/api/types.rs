//! Shared API types
//!
//! Common types used across all API endpoints, mainly error handling.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Maximum length for caller-supplied ids (trace_id, span_id, user_id)
pub const MAX_ID_LENGTH: usize = 256;

/// Validate a generic caller-supplied id
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= MAX_ID_LENGTH
}

/// Standard API error response
#[derive(Debug)]
pub enum ApiError {
    BadRequest { message: String },
    NotFound { message: String },
    Unauthorized { message: String },
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn from_sqlite(e: crate::data::SqliteError) -> Self {
        tracing::error!(error = %e, "SQLite error");
        Self::Internal {
            message: "Database operation failed".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            Self::NotFound { message } => (StatusCode::NOT_FOUND, message),
            Self::Unauthorized { message } => (StatusCode::UNAUTHORIZED, message),
            Self::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_id() {
        assert!(is_valid_id("t1"));
        assert!(is_valid_id(&"a".repeat(MAX_ID_LENGTH)));
        assert!(!is_valid_id(""));
        assert!(!is_valid_id(&"a".repeat(MAX_ID_LENGTH + 1)));
    }
}
