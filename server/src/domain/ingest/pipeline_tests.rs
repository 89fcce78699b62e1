//! End-to-end pipeline tests against an in-memory store

use serde_json::{Value as JsonValue, json};

use super::*;
use crate::data::SqliteService;
use crate::data::sqlite::repositories::{response, span, trace};
use crate::data::types::{ResponseRow, SpanType};

const USER: &str = "u1";

async fn service() -> SqliteService {
    SqliteService::init_in_memory().await.unwrap()
}

fn items(value: JsonValue) -> Vec<JsonValue> {
    value.as_array().cloned().unwrap()
}

#[tokio::test]
async fn test_basic_trace_with_two_children() {
    let db = service().await;
    let pipeline = IngestPipeline::new(db.pool().clone());

    let summary = pipeline
        .run(
            USER,
            &items(json!([{
                "object": "trace",
                "id": "t1",
                "spans": [
                    { "id": "s1", "parent_id": null,
                      "started_at": "2024-06-01T10:00:00Z", "ended_at": "2024-06-01T10:00:01Z" },
                    { "id": "s2", "parent_id": "s1",
                      "started_at": "2024-06-01T10:00:00Z", "ended_at": "2024-06-01T10:00:00.500Z" },
                ],
            }])),
        )
        .await
        .unwrap();

    assert_eq!(summary.traces_processed, 1);
    assert_eq!(summary.spans_processed, 2);

    let stored = trace::get_trace(db.pool(), USER, "t1").await.unwrap().unwrap();
    assert_eq!(stored.duration_ms, 1000);

    let spans = span::list_spans_for_trace(db.pool(), USER, "t1").await.unwrap();
    assert_eq!(spans.len(), 2);
}

#[tokio::test]
async fn test_span_only_batch_auto_creates_trace() {
    let db = service().await;
    let pipeline = IngestPipeline::new(db.pool().clone());

    let summary = pipeline
        .run(
            USER,
            &items(json!([{
                "object": "trace.span",
                "id": "s9",
                "trace_id": "t9",
                "started_at": "2024-06-01T10:00:00Z",
                "ended_at": "2024-06-01T10:00:02Z",
            }])),
        )
        .await
        .unwrap();

    assert_eq!(summary.traces_processed, 0);
    assert_eq!(summary.spans_processed, 1);

    let auto = trace::get_trace(db.pool(), USER, "t9").await.unwrap().unwrap();
    assert_eq!(auto.duration_ms, 2000);
}

#[tokio::test]
async fn test_auto_created_trace_never_clobbers_real_one() {
    let db = service().await;
    let pipeline = IngestPipeline::new(db.pool().clone());

    pipeline
        .run(USER, &items(json!([{ "object": "trace", "id": "t1", "name": "real name", "spans": [] }])))
        .await
        .unwrap();
    pipeline
        .run(USER, &items(json!([{ "object": "trace.span", "id": "s1", "trace_id": "t1" }])))
        .await
        .unwrap();

    let stored = trace::get_trace(db.pool(), USER, "t1").await.unwrap().unwrap();
    assert_eq!(stored.name, "real name");
}

#[tokio::test]
async fn test_idempotent_reingest() {
    let db = service().await;
    let pipeline = IngestPipeline::new(db.pool().clone());

    let batch = items(json!([{
        "object": "trace",
        "id": "t1",
        "name": "run",
        "spans": [
            { "id": "s1", "started_at": "2024-06-01T10:00:00Z", "ended_at": "2024-06-01T10:00:01Z" },
            { "id": "s2", "parent_id": "s1",
              "started_at": "2024-06-01T10:00:00Z", "ended_at": "2024-06-01T10:00:01Z" },
        ],
    }]));

    let first = pipeline.run(USER, &batch).await.unwrap();
    let second = pipeline.run(USER, &batch).await.unwrap();
    assert_eq!(first, second);

    let span_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM spans")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(span_count, 2);
    let trace_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM traces")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(trace_count, 1);
}

#[tokio::test]
async fn test_orphan_gets_exactly_one_placeholder() {
    let db = service().await;
    let pipeline = IngestPipeline::new(db.pool().clone());

    pipeline
        .run(
            USER,
            &items(json!([
                { "object": "trace.span", "id": "c1", "trace_id": "t1", "parent_id": "missing" },
                { "object": "trace.span", "id": "c2", "trace_id": "t1", "parent_id": "missing" },
            ])),
        )
        .await
        .unwrap();

    let spans = span::list_spans_for_trace(db.pool(), USER, "t1").await.unwrap();
    let placeholders: Vec<_> = spans
        .iter()
        .filter(|s| s.span_type == SpanType::Placeholder)
        .collect();
    assert_eq!(placeholders.len(), 1);
    assert_eq!(placeholders[0].id, "missing");
    assert!(placeholders[0].parent_span_id.is_none());
}

#[tokio::test]
async fn test_placeholder_replaced_when_real_parent_arrives() {
    let db = service().await;
    let pipeline = IngestPipeline::new(db.pool().clone());

    pipeline
        .run(
            USER,
            &items(json!([
                { "object": "trace.span", "id": "child", "trace_id": "t1", "parent_id": "late" },
            ])),
        )
        .await
        .unwrap();

    // The true parent arrives in a later batch under the same id
    pipeline
        .run(
            USER,
            &items(json!([
                { "object": "trace.span", "id": "late", "trace_id": "t1", "name": "agent turn",
                  "started_at": "2024-06-01T10:00:00Z", "ended_at": "2024-06-01T10:00:03Z" },
            ])),
        )
        .await
        .unwrap();

    let spans = span::list_spans_for_trace(db.pool(), USER, "t1").await.unwrap();
    let late = spans.iter().find(|s| s.id == "late").unwrap();
    assert_eq!(late.name, "agent turn");
    assert_ne!(late.span_type, SpanType::Placeholder);
    // Still exactly one row for that id
    assert_eq!(spans.iter().filter(|s| s.id == "late").count(), 1);
}

#[tokio::test]
async fn test_known_parent_in_store_needs_no_placeholder() {
    let db = service().await;
    let pipeline = IngestPipeline::new(db.pool().clone());

    pipeline
        .run(USER, &items(json!([
            { "object": "trace.span", "id": "p1", "trace_id": "t1" },
        ])))
        .await
        .unwrap();
    pipeline
        .run(USER, &items(json!([
            { "object": "trace.span", "id": "c1", "trace_id": "t1", "parent_id": "p1" },
        ])))
        .await
        .unwrap();

    let spans = span::list_spans_for_trace(db.pool(), USER, "t1").await.unwrap();
    assert_eq!(spans.len(), 2);
    assert!(spans.iter().all(|s| s.span_type != SpanType::Placeholder));
}

#[tokio::test]
async fn test_cycle_batch_persists_both_spans() {
    let db = service().await;
    let pipeline = IngestPipeline::new(db.pool().clone());

    let summary = pipeline
        .run(
            USER,
            &items(json!([
                { "object": "trace.span", "id": "a", "trace_id": "t1", "parent_id": "b" },
                { "object": "trace.span", "id": "b", "trace_id": "t1", "parent_id": "a" },
            ])),
        )
        .await
        .unwrap();

    assert_eq!(summary.spans_processed, 2);
    let spans = span::list_spans_for_trace(db.pool(), USER, "t1").await.unwrap();
    assert_eq!(spans.len(), 2);
    // The cyclic parent references are persisted verbatim
    let a = spans.iter().find(|s| s.id == "a").unwrap();
    assert_eq!(a.parent_span_id.as_deref(), Some("b"));
}

#[tokio::test]
async fn test_duration_widens_across_batches() {
    let db = service().await;
    let pipeline = IngestPipeline::new(db.pool().clone());

    pipeline
        .run(USER, &items(json!([{
            "object": "trace.span", "id": "s1", "trace_id": "t1",
            "started_at": "2024-06-01T10:00:00Z", "ended_at": "2024-06-01T10:00:05Z",
        }])))
        .await
        .unwrap();
    pipeline
        .run(USER, &items(json!([{
            "object": "trace.span", "id": "s2", "trace_id": "t1",
            "started_at": "2024-06-01T10:00:02Z", "ended_at": "2024-06-01T10:00:09Z",
        }])))
        .await
        .unwrap();

    let stored = trace::get_trace(db.pool(), USER, "t1").await.unwrap().unwrap();
    // max(end) - min(start) = 10:00:09 - 10:00:00
    assert_eq!(stored.duration_ms, 9000);
}

#[tokio::test]
async fn test_wire_duration_not_trusted_when_spans_exist() {
    let db = service().await;
    let pipeline = IngestPipeline::new(db.pool().clone());

    pipeline
        .run(USER, &items(json!([{
            "object": "trace",
            "id": "t1",
            "duration_ms": 999_999,
            "spans": [{ "id": "s1",
                "started_at": "2024-06-01T10:00:00Z", "ended_at": "2024-06-01T10:00:01Z" }],
        }])))
        .await
        .unwrap();

    let stored = trace::get_trace(db.pool(), USER, "t1").await.unwrap().unwrap();
    assert_eq!(stored.duration_ms, 1000);
}

#[tokio::test]
async fn test_correlation_backfill_from_response() {
    let db = service().await;
    let pipeline = IngestPipeline::new(db.pool().clone());

    response::insert_response(
        db.pool(),
        &ResponseRow {
            id: "resp_1".to_string(),
            user_id: USER.to_string(),
            thread_id: Some("th_1".to_string()),
            model: Some("gpt-4.1".to_string()),
            created_at: 0,
        },
    )
    .await
    .unwrap();

    pipeline
        .run(USER, &items(json!([{
            "object": "trace",
            "id": "t1",
            "spans": [{
                "id": "s1",
                "attributes": { "span_type": "response", "response_id": "resp_1" },
            }],
        }])))
        .await
        .unwrap();

    let stored = trace::get_trace(db.pool(), USER, "t1").await.unwrap().unwrap();
    assert_eq!(stored.thread_id.as_deref(), Some("th_1"));
}

#[tokio::test]
async fn test_correlation_backfills_previously_persisted_trace() {
    let db = service().await;
    let pipeline = IngestPipeline::new(db.pool().clone());

    // Trace persisted first, without a thread id
    pipeline
        .run(USER, &items(json!([{ "object": "trace", "id": "t1", "spans": [] }])))
        .await
        .unwrap();

    response::insert_response(
        db.pool(),
        &ResponseRow {
            id: "resp_2".to_string(),
            user_id: USER.to_string(),
            thread_id: Some("th_2".to_string()),
            model: None,
            created_at: 0,
        },
    )
    .await
    .unwrap();

    // The response span arrives in a later batch
    pipeline
        .run(USER, &items(json!([{
            "object": "trace.span", "id": "s1", "trace_id": "t1",
            "attributes": { "span_type": "response", "response_id": "resp_2" },
        }])))
        .await
        .unwrap();

    let stored = trace::get_trace(db.pool(), USER, "t1").await.unwrap().unwrap();
    assert_eq!(stored.thread_id.as_deref(), Some("th_2"));
}

#[tokio::test]
async fn test_missing_response_is_nonfatal() {
    let db = service().await;
    let pipeline = IngestPipeline::new(db.pool().clone());

    let summary = pipeline
        .run(USER, &items(json!([{
            "object": "trace.span", "id": "s1", "trace_id": "t1",
            "attributes": { "span_type": "response", "response_id": "resp_nope" },
        }])))
        .await
        .unwrap();

    assert_eq!(summary.spans_processed, 1);
    let stored = trace::get_trace(db.pool(), USER, "t1").await.unwrap().unwrap();
    assert_eq!(stored.thread_id, None);
}

#[tokio::test]
async fn test_response_record_is_tenant_scoped() {
    let db = service().await;
    let pipeline = IngestPipeline::new(db.pool().clone());

    // Another tenant's response must not leak its thread id
    response::insert_response(
        db.pool(),
        &ResponseRow {
            id: "resp_1".to_string(),
            user_id: "someone-else".to_string(),
            thread_id: Some("th_1".to_string()),
            model: None,
            created_at: 0,
        },
    )
    .await
    .unwrap();

    pipeline
        .run(USER, &items(json!([{
            "object": "trace.span", "id": "s1", "trace_id": "t1",
            "attributes": { "span_type": "response", "response_id": "resp_1" },
        }])))
        .await
        .unwrap();

    let stored = trace::get_trace(db.pool(), USER, "t1").await.unwrap().unwrap();
    assert_eq!(stored.thread_id, None);
}

#[tokio::test]
async fn test_unrecognized_items_do_not_fail_batch() {
    let db = service().await;
    let pipeline = IngestPipeline::new(db.pool().clone());

    let summary = pipeline
        .run(
            USER,
            &items(json!([
                { "object": "metric", "value": 42 },
                { "object": "trace.span", "id": "s1", "trace_id": "t1" },
                "garbage",
            ])),
        )
        .await
        .unwrap();

    assert_eq!(summary.traces_processed, 0);
    assert_eq!(summary.spans_processed, 1);
}
