//! Row and classification types for trace storage
//!
//! These types are shared between the repositories and the ingest engine.
//! Timestamps are epoch milliseconds throughout; `attributes`, `events`,
//! `links` and `metadata` are stored as JSON text columns.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

// ============================================================================
// CLASSIFICATION ENUMS
// ============================================================================

/// Trace status, derived from span outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TraceStatus {
    #[default]
    Unset,
    Ok,
    Error,
}

impl TraceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "ok" => Self::Ok,
            "error" => Self::Error,
            _ => Self::Unset,
        }
    }
}

/// Span status as reported by the instrumented runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpanStatus {
    #[default]
    Unset,
    Ok,
    Error,
}

impl SpanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "ok" => Self::Ok,
            "error" => Self::Error,
            _ => Self::Unset,
        }
    }
}

/// Discriminator for the typed span payload carried in the attribute bag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpanType {
    Agent,
    Response,
    Handoff,
    Placeholder,
    #[default]
    Unknown,
}

impl SpanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Response => "response",
            Self::Handoff => "handoff",
            Self::Placeholder => "placeholder",
            Self::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "agent" => Self::Agent,
            "response" => Self::Response,
            "handoff" => Self::Handoff,
            "placeholder" => Self::Placeholder,
            _ => Self::Unknown,
        }
    }
}

// ============================================================================
// TYPED SPAN PAYLOADS
// ============================================================================

/// Type-specific fields extracted from a span's attribute bag.
///
/// Known `span_type` values get a typed payload; everything else (and any
/// extra keys on the known types) stays in the open attributes map on the
/// row so unknown future fields survive a round trip.
#[derive(Debug, Clone, PartialEq)]
pub enum SpanDetail {
    Agent {
        model: Option<String>,
        tools: Vec<String>,
    },
    Response {
        response_id: String,
        model: Option<String>,
        input_tokens: Option<i64>,
        output_tokens: Option<i64>,
    },
    Handoff {
        from_agent: Option<String>,
        to_agent: Option<String>,
    },
    Placeholder,
    Unknown,
}

impl SpanDetail {
    /// Extract the typed payload from an attribute bag.
    ///
    /// A `response` span without a usable `response_id` degrades to
    /// `Unknown` rather than failing; the attributes are kept verbatim on
    /// the row either way.
    pub fn from_attributes(attrs: &Map<String, JsonValue>) -> (SpanType, SpanDetail) {
        let span_type = attrs
            .get("span_type")
            .and_then(JsonValue::as_str)
            .map(SpanType::parse)
            .unwrap_or_default();

        let detail = match span_type {
            SpanType::Agent => SpanDetail::Agent {
                model: str_attr(attrs, "model"),
                tools: attrs
                    .get("tools")
                    .and_then(JsonValue::as_array)
                    .map(|a| {
                        a.iter()
                            .filter_map(JsonValue::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            SpanType::Response => match str_attr(attrs, "response_id") {
                Some(response_id) => SpanDetail::Response {
                    response_id,
                    model: str_attr(attrs, "model"),
                    input_tokens: attrs.get("input_tokens").and_then(JsonValue::as_i64),
                    output_tokens: attrs.get("output_tokens").and_then(JsonValue::as_i64),
                },
                None => SpanDetail::Unknown,
            },
            SpanType::Handoff => SpanDetail::Handoff {
                from_agent: str_attr(attrs, "from_agent"),
                to_agent: str_attr(attrs, "to_agent"),
            },
            SpanType::Placeholder => SpanDetail::Placeholder,
            SpanType::Unknown => SpanDetail::Unknown,
        };

        (span_type, detail)
    }

    /// The upstream response id, for `response` spans
    pub fn response_id(&self) -> Option<&str> {
        match self {
            SpanDetail::Response { response_id, .. } => Some(response_id),
            _ => None,
        }
    }
}

fn str_attr(attrs: &Map<String, JsonValue>, key: &str) -> Option<String> {
    attrs
        .get(key)
        .and_then(JsonValue::as_str)
        .map(str::to_string)
}

// ============================================================================
// ROWS
// ============================================================================

/// A trace row as stored in the `traces` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceRow {
    pub id: String,
    pub user_id: String,
    /// Correlation id linking the trace to a chat thread; may be inferred
    pub thread_id: Option<String>,
    pub name: String,
    pub status: TraceStatus,
    /// Derived from owned spans, never trusted from the wire
    pub duration_ms: i64,
    /// JSON object string
    pub metadata: Option<String>,
    pub created_at: i64,
}

/// A span row as stored in the `spans` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanRow {
    pub id: String,
    pub trace_id: String,
    pub user_id: String,
    pub parent_span_id: Option<String>,
    pub name: String,
    pub kind: String,
    pub status: SpanStatus,
    pub status_message: Option<String>,
    /// Epoch milliseconds
    pub start_time: i64,
    /// Epoch milliseconds
    pub end_time: i64,
    /// `end_time - start_time`, floored at 0
    pub duration_ms: i64,
    pub span_type: SpanType,
    /// JSON object string (open attribute bag)
    pub attributes: Option<String>,
    /// JSON array string
    pub events: Option<String>,
    /// JSON array string
    pub links: Option<String>,
    pub created_at: i64,
}

/// An upstream response record, owned by the chat layer.
///
/// The ingest engine only reads these: a `response` span's `response_id`
/// deep-links here, and the record's `thread_id` backfills the owning
/// trace's correlation id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseRow {
    pub id: String,
    pub user_id: String,
    pub thread_id: Option<String>,
    pub model: Option<String>,
    pub created_at: i64,
}
