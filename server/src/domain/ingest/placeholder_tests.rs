//! Tests for placeholder synthesis

use chrono::Utc;

use super::*;
use crate::data::types::SpanDetail;

fn span(id: &str, trace_id: &str, parent: Option<&str>) -> SpanRecord {
    let mut row = make_placeholder(id, trace_id, "u1", 0);
    row.parent_span_id = parent.map(str::to_string);
    row.span_type = SpanType::Unknown;
    SpanRecord {
        row,
        detail: SpanDetail::Unknown,
    }
}

#[test]
fn test_one_placeholder_per_distinct_missing_parent() {
    let now = Utc::now();
    let spans = vec![
        span("s1", "t1", Some("gone")),
        span("s2", "t1", Some("gone")),
        span("s3", "t1", Some("gone")),
    ];

    let candidates = placeholder_candidates(&spans, now);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].id, "gone");
    assert_eq!(candidates[0].trace_id, "t1");
    assert_eq!(candidates[0].span_type, SpanType::Placeholder);
    assert_eq!(candidates[0].status, SpanStatus::Unset);
    assert_eq!(candidates[0].name, PLACEHOLDER_SPAN_NAME);
    assert!(candidates[0].parent_span_id.is_none());
    assert_eq!(candidates[0].duration_ms, 0);
}

#[test]
fn test_in_batch_parent_needs_no_placeholder() {
    let now = Utc::now();
    let spans = vec![span("parent", "t1", None), span("child", "t1", Some("parent"))];
    assert!(placeholder_candidates(&spans, now).is_empty());
}

#[test]
fn test_trace_id_from_first_referencing_child() {
    let now = Utc::now();
    let spans = vec![
        span("a", "t-first", Some("missing")),
        span("b", "t-second", Some("missing")),
    ];

    let candidates = placeholder_candidates(&spans, now);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].trace_id, "t-first");
}

#[test]
fn test_multiple_missing_parents() {
    let now = Utc::now();
    let spans = vec![
        span("a", "t1", Some("m1")),
        span("b", "t1", Some("m2")),
        span("c", "t1", None),
    ];

    let candidates = placeholder_candidates(&spans, now);
    let ids: Vec<&str> = candidates.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["m1", "m2"]);
}
