//! Response repository for SQLite operations
//!
//! Response records are owned by the chat layer; the ingest engine only
//! performs point lookups to recover a trace's thread correlation.

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::ResponseRow;

/// Get a response by id, scoped to the tenant
pub async fn get_response(
    pool: &SqlitePool,
    user_id: &str,
    id: &str,
) -> Result<Option<ResponseRow>, SqliteError> {
    let row = sqlx::query_as::<_, (String, String, Option<String>, Option<String>, i64)>(
        "SELECT id, user_id, thread_id, model, created_at FROM responses \
         WHERE id = ? AND user_id = ?",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(id, user_id, thread_id, model, created_at)| ResponseRow {
        id,
        user_id,
        thread_id,
        model,
        created_at,
    }))
}

/// Insert a response record (used by the chat layer and by tests)
pub async fn insert_response(pool: &SqlitePool, response: &ResponseRow) -> Result<(), SqliteError> {
    sqlx::query(
        "INSERT INTO responses (id, user_id, thread_id, model, created_at) VALUES (?, ?, ?, ?, ?) \
         ON CONFLICT(id) DO UPDATE SET thread_id = excluded.thread_id, model = excluded.model \
         WHERE responses.user_id = excluded.user_id",
    )
    .bind(&response.id)
    .bind(&response.user_id)
    .bind(&response.thread_id)
    .bind(&response.model)
    .bind(response.created_at)
    .execute(pool)
    .await?;

    Ok(())
}
