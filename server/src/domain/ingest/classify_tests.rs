//! Tests for batch classification

use chrono::{TimeZone, Utc};
use serde_json::json;

use super::*;
use crate::data::types::SpanType;

fn t0() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()
}

#[test]
fn test_trace_with_inline_spans() {
    let items = vec![json!({
        "object": "trace",
        "id": "t1",
        "name": "checkout flow",
        "spans": [
            { "id": "s1", "started_at": "2024-06-01T10:00:00Z", "ended_at": "2024-06-01T10:00:01Z" },
            { "id": "s2", "parent_id": "s1" },
        ],
    })];

    let batch = classify_batch(&items, "u1", t0());
    assert_eq!(batch.traces.len(), 1);
    assert_eq!(batch.spans.len(), 2);
    assert_eq!(batch.skipped, 0);

    assert_eq!(batch.traces[0].name, "checkout flow");
    // Inline spans inherit the trace id
    assert!(batch.spans.iter().all(|s| s.row.trace_id == "t1"));
    assert_eq!(batch.spans[1].parent_id(), Some("s1"));
    assert_eq!(batch.spans[0].row.duration_ms, 1000);
}

#[test]
fn test_trace_detected_by_spans_array_without_marker() {
    let items = vec![json!({ "id": "t2", "spans": [] })];
    let batch = classify_batch(&items, "u1", t0());
    assert_eq!(batch.traces.len(), 1);
    // Display name falls back to the id
    assert_eq!(batch.traces[0].name, "t2");
}

#[test]
fn test_standalone_span_item() {
    let items = vec![json!({
        "object": "trace.span",
        "id": "s9",
        "trace_id": "t9",
        "attributes": { "span_type": "agent", "model": "gpt-4.1" },
    })];

    let batch = classify_batch(&items, "u1", t0());
    assert_eq!(batch.traces.len(), 0);
    assert_eq!(batch.spans.len(), 1);
    assert_eq!(batch.spans[0].row.span_type, SpanType::Agent);
}

#[test]
fn test_span_timestamps_from_span_data() {
    let items = vec![json!({
        "object": "trace.span",
        "id": "s1",
        "trace_id": "t1",
        "span_data": {
            "started_at": "2024-06-01T10:00:00Z",
            "ended_at": "2024-06-01T10:00:02Z",
        },
    })];

    let batch = classify_batch(&items, "u1", t0());
    assert_eq!(batch.spans[0].row.duration_ms, 2000);
}

#[test]
fn test_absent_timestamps_yield_zero_duration() {
    let items = vec![json!({ "object": "trace.span", "id": "s1", "trace_id": "t1" })];
    let batch = classify_batch(&items, "u1", t0());
    assert_eq!(batch.spans[0].row.start_time, t0().timestamp_millis());
    assert_eq!(batch.spans[0].row.end_time, t0().timestamp_millis());
    assert_eq!(batch.spans[0].row.duration_ms, 0);
}

#[test]
fn test_negative_duration_floored_at_zero() {
    let items = vec![json!({
        "object": "trace.span",
        "id": "s1",
        "trace_id": "t1",
        "started_at": "2024-06-01T10:00:05Z",
        "ended_at": "2024-06-01T10:00:00Z",
    })];
    let batch = classify_batch(&items, "u1", t0());
    assert_eq!(batch.spans[0].row.duration_ms, 0);
}

#[test]
fn test_unrecognized_items_skipped_silently() {
    let items = vec![
        json!({ "object": "metric", "id": "m1" }),
        json!("not an object"),
        json!({ "no": "discriminator" }),
        json!({ "object": "trace.span", "id": "s1", "trace_id": "t1" }),
    ];

    let batch = classify_batch(&items, "u1", t0());
    assert_eq!(batch.spans.len(), 1);
    assert_eq!(batch.traces.len(), 0);
    assert_eq!(batch.skipped, 3);
}

#[test]
fn test_span_without_trace_id_skipped() {
    let items = vec![json!({ "object": "trace.span", "id": "s1" })];
    let batch = classify_batch(&items, "u1", t0());
    assert_eq!(batch.spans.len(), 0);
    assert_eq!(batch.skipped, 1);
}

#[test]
fn test_item_without_id_skipped() {
    let items = vec![json!({ "object": "trace", "name": "anonymous" })];
    let batch = classify_batch(&items, "u1", t0());
    assert_eq!(batch.traces.len(), 0);
    assert_eq!(batch.skipped, 1);
}
