//! Trace repository for SQLite operations

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::{TraceRow, TraceStatus};

/// Upsert a trace by id.
///
/// On conflict the row content is replaced, with two exceptions: a null
/// incoming `thread_id` or `metadata` never clobbers an existing value, and
/// `duration_ms`/`created_at` are left alone because duration is derived
/// after the span writes. The update only applies when the existing row
/// belongs to the same tenant.
pub async fn upsert_trace(pool: &SqlitePool, trace: &TraceRow) -> Result<(), SqliteError> {
    sqlx::query(
        r#"
        INSERT INTO traces (id, user_id, thread_id, name, status, duration_ms, metadata, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            thread_id = COALESCE(excluded.thread_id, traces.thread_id),
            name = excluded.name,
            status = excluded.status,
            metadata = COALESCE(excluded.metadata, traces.metadata)
        WHERE traces.user_id = excluded.user_id
        "#,
    )
    .bind(&trace.id)
    .bind(&trace.user_id)
    .bind(&trace.thread_id)
    .bind(&trace.name)
    .bind(trace.status.as_str())
    .bind(trace.duration_ms)
    .bind(&trace.metadata)
    .bind(trace.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert a trace only if no row with that id exists yet.
///
/// Used for traces auto-created from span-only batches: a minimal record
/// must never overwrite a real trace that arrived earlier.
pub async fn insert_trace_if_absent(pool: &SqlitePool, trace: &TraceRow) -> Result<(), SqliteError> {
    sqlx::query(
        "INSERT INTO traces (id, user_id, thread_id, name, status, duration_ms, metadata, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?) ON CONFLICT(id) DO NOTHING",
    )
    .bind(&trace.id)
    .bind(&trace.user_id)
    .bind(&trace.thread_id)
    .bind(&trace.name)
    .bind(trace.status.as_str())
    .bind(trace.duration_ms)
    .bind(&trace.metadata)
    .bind(trace.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get a trace by id, scoped to the tenant
pub async fn get_trace(
    pool: &SqlitePool,
    user_id: &str,
    id: &str,
) -> Result<Option<TraceRow>, SqliteError> {
    let row = sqlx::query_as::<
        _,
        (
            String,
            String,
            Option<String>,
            String,
            String,
            i64,
            Option<String>,
            i64,
        ),
    >(
        "SELECT id, user_id, thread_id, name, status, duration_ms, metadata, created_at \
         FROM traces WHERE id = ? AND user_id = ?",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(
        |(id, user_id, thread_id, name, status, duration_ms, metadata, created_at)| TraceRow {
            id,
            user_id,
            thread_id,
            name,
            status: TraceStatus::parse(&status),
            duration_ms,
            metadata,
            created_at,
        },
    ))
}

/// Backfill a still-null thread id on an already-persisted trace.
///
/// Returns true if a row was updated. A trace that already carries a
/// thread id is left untouched.
pub async fn backfill_thread_id(
    pool: &SqlitePool,
    user_id: &str,
    trace_id: &str,
    thread_id: &str,
) -> Result<bool, SqliteError> {
    let result = sqlx::query(
        "UPDATE traces SET thread_id = ? WHERE id = ? AND user_id = ? AND thread_id IS NULL",
    )
    .bind(thread_id)
    .bind(trace_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Recompute a trace's duration from the min start / max end of its spans.
///
/// A trace with no spans keeps its current duration.
pub async fn update_duration_from_spans(
    pool: &SqlitePool,
    user_id: &str,
    trace_id: &str,
) -> Result<(), SqliteError> {
    let window: Option<(Option<i64>, Option<i64>)> = sqlx::query_as(
        "SELECT MIN(start_time), MAX(end_time) FROM spans WHERE trace_id = ? AND user_id = ?",
    )
    .bind(trace_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    let Some((Some(min_start), Some(max_end))) = window else {
        return Ok(());
    };

    let duration_ms = (max_end - min_start).max(0);
    sqlx::query("UPDATE traces SET duration_ms = ? WHERE id = ? AND user_id = ?")
        .bind(duration_ms)
        .bind(trace_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}
