use crate::context::SpanContext;
use crate::record::{LogRecord, SpanRecord};
use crate::scope::ScopeMetadata;
use serde_json::Value;

/// Attribute keys written onto every enriched record.
pub const SCOPE_NAME_KEY: &str = "otel.scope.name";
pub const SCOPE_VERSION_KEY: &str = "otel.scope.version";
/// Legacy alias keys kept for older collectors.
pub const LIBRARY_NAME_KEY: &str = "otel.library.name";
pub const LIBRARY_VERSION_KEY: &str = "otel.library.version";

pub const STATUS_CODE_KEY: &str = "otel.status_code";
pub const STATUS_DESCRIPTION_KEY: &str = "otel.status_description";
pub const DROPPED_ATTRIBUTES_KEY: &str = "otel.dropped_attributes_count";
pub const DROPPED_EVENTS_KEY: &str = "otel.dropped_events_count";
pub const DROPPED_LINKS_KEY: &str = "otel.dropped_links_count";

/// Default status stamped onto log records.
pub const DEFAULT_STATUS_CODE: &str = "OK";
/// Default status of a span that was never explicitly set.
pub const DEFAULT_SPAN_STATUS: &str = "UNSET";

/// Stamps scope metadata, default status fields and trace correlation onto
/// captured records.
///
/// Pure transform: never blocks and never mutates its input. The enricher is
/// composed with the forwarders once at pipeline construction; records pass
/// through it on their way into the queue.
#[derive(Debug, Clone)]
pub struct Enricher {
    scope: ScopeMetadata,
}

impl Enricher {
    pub fn new(scope: ScopeMetadata) -> Self {
        Enricher { scope }
    }

    pub fn scope(&self) -> &ScopeMetadata {
        &self.scope
    }

    /// Produce a decorated copy of `record`.
    ///
    /// Merges the scope metadata pairs and fixed status defaults into the
    /// attribute map. When `ctx` is present the record additionally receives
    /// the active trace/span identifiers and trace state; absence of a span
    /// is a normal case and leaves the correlation fields unset.
    pub fn enrich(&self, record: &LogRecord, ctx: Option<&SpanContext>) -> LogRecord {
        let mut out = record.clone();

        out.fields
            .insert(SCOPE_NAME_KEY.to_string(), Value::from(self.scope.name.clone()));
        out.fields.insert(
            SCOPE_VERSION_KEY.to_string(),
            Value::from(self.scope.version.clone()),
        );
        out.fields
            .insert(LIBRARY_NAME_KEY.to_string(), Value::from(self.scope.name.clone()));
        out.fields.insert(
            LIBRARY_VERSION_KEY.to_string(),
            Value::from(self.scope.version.clone()),
        );
        for (key, value) in &self.scope.extra {
            out.fields.insert(key.clone(), Value::from(value.clone()));
        }

        out.fields
            .insert(STATUS_CODE_KEY.to_string(), Value::from(DEFAULT_STATUS_CODE));
        out.fields
            .insert(STATUS_DESCRIPTION_KEY.to_string(), Value::from(""));
        out.fields
            .insert(DROPPED_ATTRIBUTES_KEY.to_string(), Value::from(0));
        out.fields.insert(DROPPED_EVENTS_KEY.to_string(), Value::from(0));
        out.fields.insert(DROPPED_LINKS_KEY.to_string(), Value::from(0));

        if let Some(ctx) = ctx {
            out.trace_id = Some(ctx.trace_id);
            out.span_id = Some(ctx.span_id);
            out.trace_state = Some(ctx.trace_state.clone());
        }

        if out.service_name.is_none() {
            out.service_name = self.scope.service_name().map(str::to_string);
        }

        out
    }

    /// Merge the scope metadata pairs into a finished span's attributes.
    pub fn enrich_span(&self, span: &SpanRecord) -> SpanRecord {
        let mut out = span.clone();

        out.attributes
            .insert(SCOPE_NAME_KEY.to_string(), Value::from(self.scope.name.clone()));
        out.attributes.insert(
            SCOPE_VERSION_KEY.to_string(),
            Value::from(self.scope.version.clone()),
        );
        for (key, value) in &self.scope.extra {
            out.attributes.insert(key.clone(), Value::from(value.clone()));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{SpanId, TraceId};
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn raw_record() -> LogRecord {
        LogRecord {
            timestamp: Utc::now(),
            level: "ERROR".to_string(),
            severity_number: 17,
            target: "myapp::area2".to_string(),
            module_path: None,
            file: None,
            line: None,
            fields: BTreeMap::new(),
            message: Some("boom".to_string()),
            service_name: None,
            trace_id: None,
            span_id: None,
            trace_state: None,
        }
    }

    #[test]
    fn enrich_without_span_adds_scope_but_no_correlation() {
        let enricher = Enricher::new(
            ScopeMetadata::new("io.example.lib", "1.0.0")
                .with_attribute("service.name", "shoppingcart"),
        );

        let out = enricher.enrich(&raw_record(), None);

        assert_eq!(out.fields[SCOPE_NAME_KEY], "io.example.lib");
        assert_eq!(out.fields[SCOPE_VERSION_KEY], "1.0.0");
        assert_eq!(out.fields[LIBRARY_NAME_KEY], "io.example.lib");
        assert_eq!(out.fields[STATUS_CODE_KEY], DEFAULT_STATUS_CODE);
        assert_eq!(out.fields[DROPPED_ATTRIBUTES_KEY], 0);
        assert_eq!(out.service_name.as_deref(), Some("shoppingcart"));
        assert!(out.trace_id.is_none());
        assert!(out.span_id.is_none());
        assert!(out.trace_state.is_none());
    }

    #[test]
    fn enrich_with_span_sets_fixed_width_hex_identifiers() {
        let enricher = Enricher::new(ScopeMetadata::new("io.example.lib", "1.0.0"));
        let ctx = SpanContext {
            trace_id: TraceId(0xdeadbeef),
            span_id: SpanId(0xcafe),
            trace_state: "vendor=abc".to_string(),
        };

        let out = enricher.enrich(&raw_record(), Some(&ctx));

        assert_eq!(
            out.trace_id.unwrap().to_string(),
            "000000000000000000000000deadbeef"
        );
        assert_eq!(out.span_id.unwrap().to_string(), "000000000000cafe");
        assert_eq!(out.trace_state.as_deref(), Some("vendor=abc"));
    }

    #[test]
    fn enrich_does_not_mutate_the_input() {
        let enricher = Enricher::new(ScopeMetadata::new("io.example.lib", "1.0.0"));
        let record = raw_record();

        let _ = enricher.enrich(&record, None);

        assert!(record.fields.is_empty());
        assert!(record.trace_id.is_none());
    }

    #[test]
    fn enrich_span_merges_scope_pairs() {
        let enricher = Enricher::new(
            ScopeMetadata::new("io.example.lib", "1.0.0")
                .with_attribute("service.instance.id", "instance-12"),
        );
        let span = SpanRecord {
            name: "foo".to_string(),
            trace_id: TraceId(1),
            span_id: SpanId(2),
            parent_span_id: None,
            start: Utc::now(),
            end: Utc::now(),
            status: DEFAULT_SPAN_STATUS.to_string(),
            attributes: BTreeMap::new(),
        };

        let out = enricher.enrich_span(&span);

        assert_eq!(out.attributes[SCOPE_NAME_KEY], "io.example.lib");
        assert_eq!(out.attributes["service.instance.id"], "instance-12");
        assert!(span.attributes.is_empty());
    }
}
