//! Batch classification (stage 1)
//!
//! Splits an inbound batch into trace and span records. An item is a trace
//! when it is tagged `object == "trace"` or embeds a `spans` array; a span
//! when tagged `object == "trace.span"`. Anything else is unrecognized
//! telemetry and skipped without failing the batch.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value as JsonValue};

use super::types::{SpanRecord, parse_timestamp_ms};
use crate::data::types::{SpanDetail, SpanRow, SpanStatus, TraceRow, TraceStatus};

/// Wire marker for trace items
const OBJECT_TRACE: &str = "trace";
/// Wire marker for span items
const OBJECT_SPAN: &str = "trace.span";

/// Result of classifying one batch
#[derive(Debug, Default)]
pub struct ClassifiedBatch {
    pub traces: Vec<TraceRow>,
    pub spans: Vec<SpanRecord>,
    pub skipped: usize,
}

/// Classify a batch of heterogeneous telemetry items.
///
/// A trace item that embeds inline spans yields one trace plus N spans,
/// each inheriting the trace's id as their `trace_id`.
pub fn classify_batch(items: &[JsonValue], user_id: &str, now: DateTime<Utc>) -> ClassifiedBatch {
    let mut batch = ClassifiedBatch::default();

    for item in items {
        let Some(obj) = item.as_object() else {
            batch.skipped += 1;
            continue;
        };

        if is_trace_item(obj) {
            match parse_trace(obj, user_id, now) {
                Some(trace) => {
                    if let Some(spans) = obj.get("spans").and_then(JsonValue::as_array) {
                        for span_item in spans {
                            match span_item
                                .as_object()
                                .and_then(|o| parse_span(o, Some(&trace.id), user_id, now))
                            {
                                Some(span) => batch.spans.push(span),
                                None => batch.skipped += 1,
                            }
                        }
                    }
                    batch.traces.push(trace);
                }
                None => batch.skipped += 1,
            }
        } else if is_span_item(obj) {
            match parse_span(obj, None, user_id, now) {
                Some(span) => batch.spans.push(span),
                None => batch.skipped += 1,
            }
        } else {
            tracing::debug!("Skipping unrecognized batch item");
            batch.skipped += 1;
        }
    }

    batch
}

fn is_trace_item(obj: &Map<String, JsonValue>) -> bool {
    obj.get("object").and_then(JsonValue::as_str) == Some(OBJECT_TRACE)
        || obj.get("spans").map(JsonValue::is_array).unwrap_or(false)
}

fn is_span_item(obj: &Map<String, JsonValue>) -> bool {
    obj.get("object").and_then(JsonValue::as_str) == Some(OBJECT_SPAN)
}

fn parse_trace(obj: &Map<String, JsonValue>, user_id: &str, now: DateTime<Utc>) -> Option<TraceRow> {
    let id = required_str(obj, "id")?;

    let status = obj
        .get("status")
        .and_then(JsonValue::as_str)
        .map(TraceStatus::parse)
        .unwrap_or_default();

    // Wire duration is only a fallback; the aggregator overwrites it as
    // soon as the trace owns any spans.
    let duration_ms = obj
        .get("duration_ms")
        .and_then(JsonValue::as_i64)
        .unwrap_or(0)
        .max(0);

    Some(TraceRow {
        name: obj
            .get("name")
            .and_then(JsonValue::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| id.clone()),
        id,
        user_id: user_id.to_string(),
        thread_id: optional_str(obj, "thread_id"),
        status,
        duration_ms,
        metadata: obj
            .get("metadata")
            .filter(|m| m.is_object())
            .map(|m| m.to_string()),
        created_at: parse_timestamp_ms(obj.get("started_at"), now),
    })
}

fn parse_span(
    obj: &Map<String, JsonValue>,
    inherited_trace_id: Option<&str>,
    user_id: &str,
    now: DateTime<Utc>,
) -> Option<SpanRecord> {
    let id = required_str(obj, "id")?;

    let trace_id = optional_str(obj, "trace_id").or_else(|| inherited_trace_id.map(str::to_string));
    let Some(trace_id) = trace_id else {
        tracing::debug!(span_id = %id, "Span without trace_id, skipping");
        return None;
    };

    // Timestamps may be top-level, nested under span_data, or in the
    // attribute bag; first match wins.
    let span_data = obj.get("span_data").and_then(JsonValue::as_object);
    let attrs = obj
        .get("attributes")
        .and_then(JsonValue::as_object)
        .or(span_data)
        .cloned()
        .unwrap_or_default();

    let start_time = parse_timestamp_ms(
        obj.get("started_at")
            .or_else(|| span_data.and_then(|d| d.get("started_at")))
            .or_else(|| attrs.get("started_at")),
        now,
    );
    let end_time = parse_timestamp_ms(
        obj.get("ended_at")
            .or_else(|| span_data.and_then(|d| d.get("ended_at")))
            .or_else(|| attrs.get("ended_at")),
        now,
    );

    let (span_type, detail) = SpanDetail::from_attributes(&attrs);

    let row = SpanRow {
        name: obj
            .get("name")
            .and_then(JsonValue::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| id.clone()),
        id,
        trace_id,
        user_id: user_id.to_string(),
        parent_span_id: optional_str(obj, "parent_id"),
        kind: obj
            .get("kind")
            .and_then(JsonValue::as_str)
            .unwrap_or("internal")
            .to_string(),
        status: obj
            .get("status")
            .and_then(JsonValue::as_str)
            .map(SpanStatus::parse)
            .unwrap_or_default(),
        status_message: optional_str(obj, "status_message"),
        start_time,
        end_time,
        duration_ms: (end_time - start_time).max(0),
        span_type,
        attributes: if attrs.is_empty() {
            None
        } else {
            Some(JsonValue::Object(attrs).to_string())
        },
        events: obj
            .get("events")
            .filter(|e| e.is_array())
            .map(|e| e.to_string()),
        links: obj
            .get("links")
            .filter(|l| l.is_array())
            .map(|l| l.to_string()),
        created_at: now.timestamp_millis(),
    };

    Some(SpanRecord { row, detail })
}

fn required_str(obj: &Map<String, JsonValue>, key: &str) -> Option<String> {
    let value = obj.get(key).and_then(JsonValue::as_str)?;
    if value.is_empty() {
        return None;
    }
    Some(value.to_string())
}

fn optional_str(obj: &Map<String, JsonValue>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(JsonValue::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;
