//! Repository functions for SQLite operations
//!
//! Repositories are free async functions over a `&SqlitePool`, scoped to the
//! calling tenant's `user_id`. All trace/span writes are idempotent upserts
//! keyed by the caller-supplied row id.

pub mod response;
pub mod span;
pub mod trace;
