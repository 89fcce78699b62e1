//! Correlation inference (stage 2)
//!
//! A `response` span deep-links to an upstream response record that may
//! carry the thread id the trace itself never received. This stage looks
//! those records up and produces a `trace_id -> thread_id` mapping, applied
//! to in-batch traces here and to already-persisted rows by the backfill
//! pass after the trace write group.

use std::collections::HashMap;

use sqlx::SqlitePool;

use super::types::SpanRecord;
use crate::data::sqlite::repositories::response;
use crate::data::types::TraceRow;

/// Look up upstream responses for the batch's `response` spans and collect
/// thread ids per trace.
///
/// A missing or inaccessible response record is non-fatal: the span is
/// ingested anyway, just without the inferred correlation. The first
/// successful inference per trace wins.
pub async fn infer_correlations(
    pool: &SqlitePool,
    user_id: &str,
    spans: &[SpanRecord],
) -> HashMap<String, String> {
    let mut inferred: HashMap<String, String> = HashMap::new();

    for span in spans {
        let Some(response_id) = span.detail.response_id() else {
            continue;
        };
        if inferred.contains_key(&span.row.trace_id) {
            continue;
        }

        match response::get_response(pool, user_id, response_id).await {
            Ok(Some(record)) => {
                if let Some(thread_id) = record.thread_id {
                    tracing::debug!(
                        trace_id = %span.row.trace_id,
                        response_id,
                        thread_id = %thread_id,
                        "Inferred thread correlation from response"
                    );
                    inferred.insert(span.row.trace_id.clone(), thread_id);
                }
            }
            Ok(None) => {
                tracing::debug!(response_id, "Response not found, span ingested without correlation");
            }
            Err(e) => {
                tracing::warn!(response_id, error = %e, "Response lookup failed, continuing without correlation");
            }
        }
    }

    inferred
}

/// Fill in thread ids on in-batch traces that lack one
pub fn apply_to_batch(traces: &mut [TraceRow], inferred: &HashMap<String, String>) {
    for trace in traces {
        if trace.thread_id.is_none()
            && let Some(thread_id) = inferred.get(&trace.id)
        {
            trace.thread_id = Some(thread_id.clone());
        }
    }
}
