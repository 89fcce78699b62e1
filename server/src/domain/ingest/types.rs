//! Wire-level batch records for the ingest engine

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use crate::data::types::{SpanDetail, SpanRow};

/// A span lifted out of the batch, carrying its typed payload alongside the
/// row that will be persisted.
#[derive(Debug, Clone)]
pub struct SpanRecord {
    pub row: SpanRow,
    pub detail: SpanDetail,
}

impl SpanRecord {
    pub fn id(&self) -> &str {
        &self.row.id
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.row.parent_span_id.as_deref()
    }
}

/// Parse a wire timestamp into epoch milliseconds.
///
/// Accepts RFC 3339 strings or epoch-millisecond numbers; anything else
/// (including absence) falls back to `now`, which yields a zero-duration
/// span when both bounds are missing.
pub fn parse_timestamp_ms(value: Option<&JsonValue>, now: DateTime<Utc>) -> i64 {
    match value {
        Some(JsonValue::String(s)) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc).timestamp_millis())
            .unwrap_or_else(|_| {
                tracing::debug!(ts = %s, "Unparseable timestamp, using now");
                now.timestamp_millis()
            }),
        Some(JsonValue::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or_else(|| now.timestamp_millis()),
        _ => now.timestamp_millis(),
    }
}
