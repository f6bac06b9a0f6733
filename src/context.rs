use serde::{Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// 128-bit trace identifier.
///
/// Rendered and serialized as exactly 32 lowercase hex characters,
/// zero-padded, matching the W3C `traceparent` encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(pub u128);

impl TraceId {
    /// Generate a random trace id from 128 bits of UUIDv4 entropy.
    pub fn generate() -> Self {
        TraceId(Uuid::new_v4().as_u128())
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl Serialize for TraceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 64-bit span identifier.
///
/// Rendered and serialized as exactly 16 lowercase hex characters,
/// zero-padded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanId(pub u64);

impl SpanId {
    /// Generate a random span id from 64 bits of UUIDv4 entropy.
    pub fn generate() -> Self {
        SpanId(Uuid::new_v4().as_u128() as u64)
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl Serialize for SpanId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Identity of the currently executing unit of work.
///
/// Attached to every log record emitted while the owning span is active so
/// that logs and spans can be joined on the collector side. Immutable once
/// created; child spans copy the `trace_id` and `trace_state` and receive a
/// fresh `span_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanContext {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub trace_state: String,
}

impl SpanContext {
    /// Root context: fresh trace id, fresh span id, empty trace state.
    pub fn new_root() -> Self {
        SpanContext {
            trace_id: TraceId::generate(),
            span_id: SpanId::generate(),
            trace_state: String::new(),
        }
    }

    /// Child context sharing the parent's trace identity.
    pub fn child_of(parent: &SpanContext) -> Self {
        SpanContext {
            trace_id: parent.trace_id,
            span_id: SpanId::generate(),
            trace_state: parent.trace_state.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_id_renders_as_32_hex_chars() {
        let id = TraceId(0xabc);
        let s = id.to_string();
        assert_eq!(s.len(), 32);
        assert_eq!(s, "00000000000000000000000000000abc");
    }

    #[test]
    fn span_id_renders_as_16_hex_chars() {
        let id = SpanId(0x42);
        let s = id.to_string();
        assert_eq!(s.len(), 16);
        assert_eq!(s, "0000000000000042");
    }

    #[test]
    fn ids_serialize_as_hex_strings() {
        let json = serde_json::to_value(TraceId(1)).unwrap();
        assert_eq!(json, serde_json::json!("00000000000000000000000000000001"));
        let json = serde_json::to_value(SpanId(1)).unwrap();
        assert_eq!(json, serde_json::json!("0000000000000001"));
    }

    #[test]
    fn child_context_inherits_trace_identity() {
        let root = SpanContext::new_root();
        let child = SpanContext::child_of(&root);
        assert_eq!(child.trace_id, root.trace_id);
        assert_ne!(child.span_id, root.span_id);
        assert_eq!(child.trace_state, root.trace_state);
    }
}
