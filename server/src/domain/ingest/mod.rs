//! Trace/span batch ingestion and reconciliation engine
//!
//! Receives batches of trace/span telemetry from the instrumented agent
//! runtime and reconstructs a structurally valid trace tree even when spans
//! and their parents arrive out of order, in separate batches, or never.
//! See `pipeline.rs` for the stage diagram.

mod aggregate;
mod classify;
mod correlate;
mod persist;
mod placeholder;
mod pipeline;
mod reconcile;
mod sort;
pub mod types;

pub use persist::{IngestError, WriteGroup};
pub use pipeline::{IngestPipeline, IngestSummary};
