//! Span repository for SQLite operations

use std::collections::HashSet;

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::data::sqlite::SqliteError;
use crate::data::types::{SpanRow, SpanStatus, SpanType};

/// Upsert a span by id.
///
/// On conflict the row content is replaced wholesale (last write wins);
/// only `created_at` survives from the original row. This is also how a
/// placeholder is reconciled: the real parent arriving later upserts the
/// same id and overwrites the synthesized row. The update only applies
/// when the existing row belongs to the same tenant.
pub async fn upsert_span(pool: &SqlitePool, span: &SpanRow) -> Result<(), SqliteError> {
    sqlx::query(
        r#"
        INSERT INTO spans (
            id, trace_id, user_id, parent_span_id, name, kind, status, status_message,
            start_time, end_time, duration_ms, span_type, attributes, events, links, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            trace_id = excluded.trace_id,
            parent_span_id = excluded.parent_span_id,
            name = excluded.name,
            kind = excluded.kind,
            status = excluded.status,
            status_message = excluded.status_message,
            start_time = excluded.start_time,
            end_time = excluded.end_time,
            duration_ms = excluded.duration_ms,
            span_type = excluded.span_type,
            attributes = excluded.attributes,
            events = excluded.events,
            links = excluded.links
        WHERE spans.user_id = excluded.user_id
        "#,
    )
    .bind(&span.id)
    .bind(&span.trace_id)
    .bind(&span.user_id)
    .bind(&span.parent_span_id)
    .bind(&span.name)
    .bind(&span.kind)
    .bind(span.status.as_str())
    .bind(&span.status_message)
    .bind(span.start_time)
    .bind(span.end_time)
    .bind(span.duration_ms)
    .bind(span.span_type.as_str())
    .bind(&span.attributes)
    .bind(&span.events)
    .bind(&span.links)
    .bind(span.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Return which of the given span ids already exist for this tenant
pub async fn filter_existing_ids(
    pool: &SqlitePool,
    user_id: &str,
    ids: &[String],
) -> Result<HashSet<String>, SqliteError> {
    if ids.is_empty() {
        return Ok(HashSet::new());
    }

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT id FROM spans WHERE user_id = ");
    qb.push_bind(user_id);
    qb.push(" AND id IN (");
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(id);
    }
    qb.push(")");

    let existing: Vec<String> = qb.build_query_scalar().fetch_all(pool).await?;
    Ok(existing.into_iter().collect())
}

/// List all spans of a trace, ordered by start time
pub async fn list_spans_for_trace(
    pool: &SqlitePool,
    user_id: &str,
    trace_id: &str,
) -> Result<Vec<SpanRow>, SqliteError> {
    type Row = (
        String,
        String,
        String,
        Option<String>,
        String,
        String,
        String,
        Option<String>,
        i64,
        i64,
        i64,
        String,
        Option<String>,
        Option<String>,
        Option<String>,
        i64,
    );

    let rows = sqlx::query_as::<_, Row>(
        "SELECT id, trace_id, user_id, parent_span_id, name, kind, status, status_message, \
                start_time, end_time, duration_ms, span_type, attributes, events, links, created_at \
         FROM spans WHERE trace_id = ? AND user_id = ? ORDER BY start_time, id",
    )
    .bind(trace_id)
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(
                id,
                trace_id,
                user_id,
                parent_span_id,
                name,
                kind,
                status,
                status_message,
                start_time,
                end_time,
                duration_ms,
                span_type,
                attributes,
                events,
                links,
                created_at,
            )| SpanRow {
                id,
                trace_id,
                user_id,
                parent_span_id,
                name,
                kind,
                status: SpanStatus::parse(&status),
                status_message,
                start_time,
                end_time,
                duration_ms,
                span_type: SpanType::parse(&span_type),
                attributes,
                events,
                links,
                created_at,
            },
        )
        .collect())
}

/// Find dangling parent references within the given traces.
///
/// Returns `(parent_span_id, trace_id)` pairs for spans whose declared
/// parent has no row at all. Under normal ingest this is empty (the
/// placeholder stage covers missing parents); it catches rows written out
/// of band.
pub async fn find_dangling_parents(
    pool: &SqlitePool,
    user_id: &str,
    trace_ids: &[String],
) -> Result<Vec<(String, String)>, SqliteError> {
    if trace_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT DISTINCT s.parent_span_id, s.trace_id FROM spans s \
         WHERE s.user_id = ",
    );
    qb.push_bind(user_id);
    qb.push(" AND s.parent_span_id IS NOT NULL AND s.trace_id IN (");
    let mut separated = qb.separated(", ");
    for id in trace_ids {
        separated.push_bind(id);
    }
    qb.push(") AND NOT EXISTS (SELECT 1 FROM spans p WHERE p.id = s.parent_span_id)");

    let rows: Vec<(String, String)> = qb.build_query_as().fetch_all(pool).await?;
    Ok(rows)
}
