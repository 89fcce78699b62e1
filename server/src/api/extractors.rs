//! Auth and validation extractors for API routes

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::server::AppState;
use super::types::{ApiError, is_valid_id};

/// Header carrying the tenant id. The chat frontend sends a stable client
/// UUID here for anonymous users, matching the upstream store convention.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated tenant for a request.
///
/// Extracted from the `x-user-id` header; when an API key is configured,
/// a matching `Authorization: Bearer` token is also required. All store
/// reads and writes are scoped to this tenant.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub user_id: String,
}

impl FromRequestParts<AppState> for TenantContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(expected) = state.api_key.as_deref() {
            let supplied = parts
                .headers
                .get(axum::http::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "));

            if supplied != Some(expected) {
                return Err(ApiError::unauthorized("Invalid or missing API key"));
            }
        }

        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| is_valid_id(v))
            .map(str::to_string);

        match user_id {
            Some(user_id) => Ok(Self { user_id }),
            None => Err(ApiError::bad_request(
                "Missing user_id (supply the 'x-user-id' header)",
            )),
        }
    }
}
