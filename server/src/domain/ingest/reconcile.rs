//! Post-batch orphan reconciliation
//!
//! Placeholders reuse the real parent's id, so a parent arriving in a later
//! batch reconciles through the ordinary upsert with no extra work. What
//! this sweep catches is the residual case: a span row whose parent row is
//! missing entirely (possible only through out-of-band writes). It runs
//! after every batch, scoped to the batch's touched traces, and synthesizes
//! the missing placeholder rows.

use chrono::Utc;
use sqlx::SqlitePool;

use super::placeholder::make_placeholder;
use crate::data::sqlite::repositories::span;

/// Repair dangling parent references within the given traces.
///
/// Returns the number of placeholders synthesized. Failures are logged and
/// swallowed; the sweep is a consistency repair, not part of the batch's
/// success criteria.
pub async fn reconcile_dangling_parents(
    pool: &SqlitePool,
    user_id: &str,
    trace_ids: &[String],
) -> usize {
    let dangling = match span::find_dangling_parents(pool, user_id, trace_ids).await {
        Ok(d) => d,
        Err(e) => {
            tracing::warn!(error = %e, "Orphan reconciliation scan failed");
            return 0;
        }
    };

    let now_ms = Utc::now().timestamp_millis();
    let mut repaired = 0;

    for (parent_id, trace_id) in dangling {
        let row = make_placeholder(&parent_id, &trace_id, user_id, now_ms);
        match span::upsert_span(pool, &row).await {
            Ok(()) => {
                tracing::info!(
                    span_id = %parent_id,
                    trace_id = %trace_id,
                    "Reconciled dangling parent with placeholder"
                );
                repaired += 1;
            }
            Err(e) => {
                tracing::warn!(span_id = %parent_id, error = %e, "Orphan reconciliation write failed");
            }
        }
    }

    repaired
}
