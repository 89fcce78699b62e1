//! SQLite schema definitions
//!
//! Initial schema with all tables. No migrations needed for first version.

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Complete schema SQL
pub const SCHEMA: &str = r#"
-- =============================================================================
-- Infrastructure: Schema version tracking
-- =============================================================================
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL,
    applied_at INTEGER NOT NULL,
    description TEXT
);

CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at INTEGER NOT NULL,
    checksum TEXT NOT NULL,
    execution_time_ms INTEGER,
    success INTEGER NOT NULL DEFAULT 1
);

-- =============================================================================
-- 1. Traces (top-level execution containers)
-- =============================================================================
CREATE TABLE IF NOT EXISTS traces (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    thread_id TEXT,
    name TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'unset' CHECK(status IN ('unset', 'ok', 'error')),
    duration_ms INTEGER NOT NULL DEFAULT 0,
    metadata TEXT,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_traces_user ON traces(user_id, created_at);
CREATE INDEX IF NOT EXISTS idx_traces_thread ON traces(thread_id) WHERE thread_id IS NOT NULL;

-- =============================================================================
-- 2. Spans (timed operations within a trace)
--
-- parent_span_id deliberately has no foreign key: a batch containing a
-- parent cycle must still persist both spans, which no insert order can
-- satisfy under a self-referential FK. Parent integrity is enforced by the
-- ingest engine's placeholder stage instead.
-- =============================================================================
CREATE TABLE IF NOT EXISTS spans (
    id TEXT PRIMARY KEY,
    trace_id TEXT NOT NULL REFERENCES traces(id),
    user_id TEXT NOT NULL,
    parent_span_id TEXT,
    name TEXT NOT NULL,
    kind TEXT NOT NULL DEFAULT 'internal',
    status TEXT NOT NULL DEFAULT 'unset' CHECK(status IN ('unset', 'ok', 'error')),
    status_message TEXT,
    start_time INTEGER NOT NULL,
    end_time INTEGER NOT NULL,
    duration_ms INTEGER NOT NULL DEFAULT 0,
    span_type TEXT NOT NULL DEFAULT 'unknown'
        CHECK(span_type IN ('agent', 'response', 'handoff', 'placeholder', 'unknown')),
    attributes TEXT,
    events TEXT,
    links TEXT,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_spans_trace ON spans(trace_id, start_time);
CREATE INDEX IF NOT EXISTS idx_spans_parent ON spans(parent_span_id) WHERE parent_span_id IS NOT NULL;
CREATE INDEX IF NOT EXISTS idx_spans_user ON spans(user_id);

-- =============================================================================
-- 3. Responses (owned by the chat layer; the ingest engine only reads)
-- =============================================================================
CREATE TABLE IF NOT EXISTS responses (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    thread_id TEXT,
    model TEXT,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_responses_user ON responses(user_id);
"#;
