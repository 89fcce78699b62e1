//! Batch ingest endpoint
//!
//! `POST /api/v1/ingest` receives one batch of trace/span telemetry from
//! the agent runtime and hands it to the ingest pipeline. The caller always
//! gets either processed counts or a structured error naming the write
//! group that failed and how many traces were already committed.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::api::extractors::TenantContext;
use crate::api::server::AppState;
use crate::domain::ingest::IngestSummary;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub success: bool,
    pub traces_processed: usize,
    pub spans_processed: usize,
}

impl From<IngestSummary> for IngestResponse {
    fn from(summary: IngestSummary) -> Self {
        Self {
            success: true,
            traces_processed: summary.traces_processed,
            spans_processed: summary.spans_processed,
        }
    }
}

pub async fn ingest(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(body): Json<JsonValue>,
) -> Response {
    // Top-level shape violations reject the batch before any processing
    let Some(items) = body.get("data").and_then(JsonValue::as_array) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "Request body must contain a 'data' array" })),
        )
            .into_response();
    };

    match state.pipeline.run(&tenant.user_id, items).await {
        Ok(summary) => (StatusCode::OK, Json(IngestResponse::from(summary))).into_response(),
        Err(e) => {
            tracing::error!(
                user_id = %tenant.user_id,
                group = %e.group,
                traces_written = e.traces_written,
                error = %e.source,
                "Batch ingest failed"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": format!("{} write group failed", e.group),
                    "details": e.source.to_string(),
                    "tracesProcessed": e.traces_written,
                })),
            )
                .into_response()
        }
    }
}
