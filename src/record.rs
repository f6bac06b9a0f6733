use crate::context::{SpanId, TraceId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::Level;

/// A single captured log event, immutable once enqueued.
///
/// The correlation fields (`trace_id`, `span_id`, `trace_state`) are absent
/// on freshly captured records and are filled in by the enricher when a span
/// was active at emission time.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    /// OpenTelemetry numeric severity (TRACE=1, DEBUG=5, INFO=9, WARN=13,
    /// ERROR=17).
    pub severity_number: u32,
    pub target: String,
    pub module_path: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub fields: BTreeMap<String, serde_json::Value>,
    pub message: Option<String>,
    pub service_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<TraceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_id: Option<SpanId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_state: Option<String>,
}

/// A finished span, handed to the span forwarder when it closes.
#[derive(Debug, Clone, Serialize)]
pub struct SpanRecord {
    pub name: String,
    pub trace_id: TraceId,
    pub span_id: SpanId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<SpanId>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: String,
    pub attributes: BTreeMap<String, serde_json::Value>,
}

/// Map a `tracing` level to the OpenTelemetry severity number scale.
pub fn severity_number(level: &Level) -> u32 {
    if *level == Level::TRACE {
        1
    } else if *level == Level::DEBUG {
        5
    } else if *level == Level::INFO {
        9
    } else if *level == Level::WARN {
        13
    } else {
        17
    }
}
