//! Trace Ingest Pipeline
//!
//! Orchestrates the 6-stage batch reconciliation pipeline:
//!
//! | Stage          | Input                      | Output                          | Module           |
//! |----------------|----------------------------|---------------------------------|------------------|
//! | 1. Classify    | `&[JsonValue]`             | `ClassifiedBatch`               | `classify.rs`    |
//! | 2. Correlate   | `&[SpanRecord]`            | `trace_id -> thread_id` map     | `correlate.rs`   |
//! | 3. Sort        | `Vec<SpanRecord>`          | parent-before-child order       | `sort.rs`        |
//! | 4. Placeholder | `&[SpanRecord]`            | `Vec<SpanRow>` candidates       | `placeholder.rs` |
//! | 5. Persist     | traces, placeholders, spans | `PersistOutcome`               | `persist.rs`     |
//! | 6. Aggregate   | touched trace ids          | trace durations rewritten       | `aggregate.rs`   |
//!
//! Stages 1, 3 and 4 are pure; 2, 5 and 6 talk to the store. The pipeline
//! holds no state between batches: concurrent batches are independent by
//! construction because every write is an upsert keyed by caller-supplied
//! ids, and ordering only matters within one batch.

use std::collections::HashSet;

use chrono::Utc;
use serde_json::Value as JsonValue;
use sqlx::SqlitePool;

use super::aggregate::aggregate_durations;
use super::classify::classify_batch;
use super::correlate::{apply_to_batch, infer_correlations};
use super::persist::{IngestError, persist_batch};
use super::placeholder::placeholder_candidates;
use super::reconcile::reconcile_dangling_parents;
use super::sort::sort_by_dependency;
use crate::data::types::{TraceRow, TraceStatus};

/// What one batch ingest accomplished, as reported to the HTTP caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub traces_processed: usize,
    pub spans_processed: usize,
}

/// Batch ingest orchestrator.
///
/// One instance per server; `run` is invoked once per inbound batch and
/// keeps no state across invocations.
#[derive(Clone)]
pub struct IngestPipeline {
    pool: SqlitePool,
}

impl IngestPipeline {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Run the complete pipeline for one batch.
    pub async fn run(&self, user_id: &str, items: &[JsonValue]) -> Result<IngestSummary, IngestError> {
        let now = Utc::now();

        // Stage 1: classify
        let batch = classify_batch(items, user_id, now);
        if batch.skipped > 0 {
            tracing::debug!(skipped = batch.skipped, "Batch contained unrecognized items");
        }
        let mut traces = batch.traces;

        // Stage 2: correlate (the only pre-persist store lookups)
        let inferred = infer_correlations(&self.pool, user_id, &batch.spans).await;
        apply_to_batch(&mut traces, &inferred);

        // Auto-create minimal traces for spans whose trace object is not in
        // the batch; ignored on conflict so they never clobber real traces.
        let batch_trace_ids: HashSet<&str> = traces.iter().map(|t| t.id.as_str()).collect();
        let mut auto_traces: Vec<TraceRow> = Vec::new();
        let mut seen_auto: HashSet<&str> = HashSet::new();
        for span in &batch.spans {
            let trace_id = span.row.trace_id.as_str();
            if !batch_trace_ids.contains(trace_id) && seen_auto.insert(trace_id) {
                auto_traces.push(minimal_trace(trace_id, user_id, &inferred, now.timestamp_millis()));
            }
        }

        // Stage 3: dependency order
        let spans = sort_by_dependency(batch.spans);

        // Stage 4: placeholder candidates for parents outside the batch
        let placeholders = placeholder_candidates(&spans, now);

        // Stage 5: the three write groups
        let outcome = persist_batch(
            &self.pool,
            user_id,
            &traces,
            &auto_traces,
            placeholders,
            &spans,
            &inferred,
        )
        .await?;

        // Stage 6: derived durations for every touched trace
        let touched: Vec<String> = traces
            .iter()
            .map(|t| t.id.clone())
            .chain(auto_traces.iter().map(|t| t.id.clone()))
            .collect();
        aggregate_durations(&self.pool, user_id, &touched).await;

        // Consistency sweep; see reconcile.rs for why this is usually a no-op
        reconcile_dangling_parents(&self.pool, user_id, &touched).await;

        tracing::debug!(
            traces = outcome.traces_written,
            spans = outcome.spans_written,
            placeholders = outcome.placeholders_written,
            "Batch ingested"
        );

        Ok(IngestSummary {
            traces_processed: outcome.traces_written,
            spans_processed: outcome.spans_written,
        })
    }
}

fn minimal_trace(
    trace_id: &str,
    user_id: &str,
    inferred: &std::collections::HashMap<String, String>,
    now_ms: i64,
) -> TraceRow {
    TraceRow {
        id: trace_id.to_string(),
        user_id: user_id.to_string(),
        thread_id: inferred.get(trace_id).cloned(),
        name: trace_id.to_string(),
        status: TraceStatus::Unset,
        duration_ms: 0,
        metadata: None,
        created_at: now_ms,
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
