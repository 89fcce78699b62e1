//! Duration aggregation (stage 6)
//!
//! Recomputes each touched trace's duration from the min start / max end of
//! its persisted spans. Duration is a derived convenience field: failures
//! here are logged and never roll back the span writes.

use sqlx::SqlitePool;

use crate::data::sqlite::repositories::trace;

/// Recompute durations for every distinct trace touched by the batch.
///
/// Spans are never removed, so the recomputed window can only widen.
pub async fn aggregate_durations(pool: &SqlitePool, user_id: &str, trace_ids: &[String]) {
    for trace_id in trace_ids {
        if let Err(e) = trace::update_duration_from_spans(pool, user_id, trace_id).await {
            tracing::warn!(trace_id, error = %e, "Duration aggregation failed");
        }
    }
}
