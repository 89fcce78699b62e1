//! Placeholder synthesis for missing parents (stage 4)
//!
//! A span may declare a parent that is neither in the current batch nor in
//! the store yet. One placeholder span per distinct missing parent id keeps
//! parent references resolvable; if the real parent arrives in a later
//! batch, its upsert overwrites the placeholder row in place.
//!
//! This stage is pure: it only computes candidates from the batch. The
//! persistence layer filters out candidates whose id already exists in the
//! store before the placeholder write group.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use super::types::SpanRecord;
use crate::core::constants::PLACEHOLDER_SPAN_NAME;
use crate::data::types::{SpanRow, SpanStatus, SpanType};

/// Compute one placeholder candidate per parent id referenced by the batch
/// but not present in it.
///
/// Deduplicated by parent id; the trace id comes from the first referencing
/// child. Start and end are both "now", so a placeholder has zero duration
/// and never widens its trace's window on its own.
pub fn placeholder_candidates(spans: &[SpanRecord], now: DateTime<Utc>) -> Vec<SpanRow> {
    let batch_ids: HashSet<&str> = spans.iter().map(SpanRecord::id).collect();
    let now_ms = now.timestamp_millis();

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for span in spans {
        let Some(parent_id) = span.parent_id() else {
            continue;
        };
        if batch_ids.contains(parent_id) || !seen.insert(parent_id.to_string()) {
            continue;
        }

        candidates.push(make_placeholder(
            parent_id,
            &span.row.trace_id,
            &span.row.user_id,
            now_ms,
        ));
    }

    candidates
}

/// Build a minimal placeholder span row for a missing parent id
pub fn make_placeholder(span_id: &str, trace_id: &str, user_id: &str, now_ms: i64) -> SpanRow {
    SpanRow {
        id: span_id.to_string(),
        trace_id: trace_id.to_string(),
        user_id: user_id.to_string(),
        parent_span_id: None,
        name: PLACEHOLDER_SPAN_NAME.to_string(),
        kind: "internal".to_string(),
        status: SpanStatus::Unset,
        status_message: None,
        start_time: now_ms,
        end_time: now_ms,
        duration_ms: 0,
        span_type: SpanType::Placeholder,
        attributes: None,
        events: None,
        links: None,
        created_at: now_ms,
    }
}

#[cfg(test)]
#[path = "placeholder_tests.rs"]
mod tests;
