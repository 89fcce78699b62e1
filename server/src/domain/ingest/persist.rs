//! Persistence (stage 5)
//!
//! Three ordered write groups per batch: traces, then placeholders, then
//! the dependency-ordered real spans. Each group must fully succeed before
//! the next begins. A trace-group failure rejects the whole batch; a later
//! failure still reports the groups that already committed.

use std::collections::HashMap;
use std::fmt;

use sqlx::SqlitePool;
use thiserror::Error;

use super::types::SpanRecord;
use crate::data::sqlite::SqliteError;
use crate::data::sqlite::repositories::{span, trace};
use crate::data::types::{SpanRow, TraceRow};

/// Which write group a persistence failure occurred in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteGroup {
    Traces,
    Placeholders,
    Spans,
}

impl fmt::Display for WriteGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteGroup::Traces => write!(f, "traces"),
            WriteGroup::Placeholders => write!(f, "placeholders"),
            WriteGroup::Spans => write!(f, "spans"),
        }
    }
}

/// A persistence failure, tagged with the write group that failed and how
/// many traces were already committed.
#[derive(Error, Debug)]
#[error("{group} write group failed after {traces_written} traces committed: {source}")]
pub struct IngestError {
    pub group: WriteGroup,
    pub traces_written: usize,
    #[source]
    pub source: SqliteError,
}

/// Counts of rows written by one batch
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PersistOutcome {
    pub traces_written: usize,
    pub spans_written: usize,
    pub placeholders_written: usize,
}

/// Persist one batch: traces, placeholders, then spans, in that order.
///
/// `auto_traces` are the minimal records for span-only batches; they only
/// insert when no row exists yet and are not counted as processed traces.
/// `inferred` thread ids are backfilled onto already-persisted traces right
/// after the trace group commits; that pass is a convenience update and
/// never fails the batch. Placeholder candidates whose id already exists in
/// the store are dropped before the placeholder group.
pub async fn persist_batch(
    pool: &SqlitePool,
    user_id: &str,
    traces: &[TraceRow],
    auto_traces: &[TraceRow],
    placeholders: Vec<SpanRow>,
    spans: &[SpanRecord],
    inferred: &HashMap<String, String>,
) -> Result<PersistOutcome, IngestError> {
    // Group 1: traces. Failure here rejects the batch with nothing written.
    for (written, row) in traces.iter().enumerate() {
        trace::upsert_trace(pool, row).await.map_err(|source| IngestError {
            group: WriteGroup::Traces,
            traces_written: written,
            source,
        })?;
    }
    let traces_written = traces.len();

    for row in auto_traces {
        trace::insert_trace_if_absent(pool, row)
            .await
            .map_err(|source| IngestError {
                group: WriteGroup::Traces,
                traces_written,
                source,
            })?;
    }

    // Backfill pass: persisted traces whose thread id is still null
    for (trace_id, thread_id) in inferred {
        match trace::backfill_thread_id(pool, user_id, trace_id, thread_id).await {
            Ok(true) => {
                tracing::debug!(trace_id, thread_id, "Backfilled thread id");
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(trace_id, error = %e, "Thread id backfill failed");
            }
        }
    }

    // Group 2: placeholders for parents unknown to both batch and store
    let candidate_ids: Vec<String> = placeholders.iter().map(|p| p.id.clone()).collect();
    let existing = span::filter_existing_ids(pool, user_id, &candidate_ids)
        .await
        .map_err(|source| IngestError {
            group: WriteGroup::Placeholders,
            traces_written,
            source,
        })?;

    let mut placeholders_written = 0;
    for row in placeholders
        .into_iter()
        .filter(|p| !existing.contains(&p.id))
    {
        span::upsert_span(pool, &row).await.map_err(|source| IngestError {
            group: WriteGroup::Placeholders,
            traces_written,
            source,
        })?;
        tracing::debug!(span_id = %row.id, trace_id = %row.trace_id, "Synthesized placeholder span");
        placeholders_written += 1;
    }

    // Group 3: real spans in dependency order
    for (written, record) in spans.iter().enumerate() {
        span::upsert_span(pool, &record.row)
            .await
            .map_err(|source| {
                tracing::error!(
                    span_id = %record.row.id,
                    spans_written = written,
                    error = %source,
                    "Span write group failed"
                );
                IngestError {
                    group: WriteGroup::Spans,
                    traces_written,
                    source,
                }
            })?;
    }

    Ok(PersistOutcome {
        traces_written,
        spans_written: spans.len(),
        placeholders_written,
    })
}
