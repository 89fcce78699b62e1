//! Trace read-back endpoints
//!
//! The chat UI uses these to render what the ingest engine reconciled.

use axum::Json;
use axum::extract::{Path, State};

use crate::api::extractors::TenantContext;
use crate::api::server::AppState;
use crate::api::types::{ApiError, is_valid_id};
use crate::data::sqlite::repositories::{span, trace};
use crate::data::types::{SpanRow, TraceRow};

/// Get one trace with its derived duration
pub async fn get_trace(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(trace_id): Path<String>,
) -> Result<Json<TraceRow>, ApiError> {
    if !is_valid_id(&trace_id) {
        return Err(ApiError::bad_request("Invalid trace_id"));
    }

    let row = trace::get_trace(&state.pool, &tenant.user_id, &trace_id)
        .await
        .map_err(ApiError::from_sqlite)?
        .ok_or_else(|| ApiError::not_found(format!("Trace not found: {trace_id}")))?;

    Ok(Json(row))
}

/// List a trace's spans, ordered by start time
pub async fn list_trace_spans(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(trace_id): Path<String>,
) -> Result<Json<Vec<SpanRow>>, ApiError> {
    if !is_valid_id(&trace_id) {
        return Err(ApiError::bad_request("Invalid trace_id"));
    }

    // 404 for an unknown trace rather than an empty list
    trace::get_trace(&state.pool, &tenant.user_id, &trace_id)
        .await
        .map_err(ApiError::from_sqlite)?
        .ok_or_else(|| ApiError::not_found(format!("Trace not found: {trace_id}")))?;

    let rows = span::list_spans_for_trace(&state.pool, &tenant.user_id, &trace_id)
        .await
        .map_err(ApiError::from_sqlite)?;

    Ok(Json(rows))
}
