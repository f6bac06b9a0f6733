use crate::context::{SpanContext, SpanId};
use crate::enrich::{Enricher, DEFAULT_SPAN_STATUS};
use crate::forwarder::BatchForwarder;
use crate::record::{severity_number, LogRecord, SpanRecord};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Per-span state kept in the registry's extension storage while the span
/// is alive. Handed to the span forwarder as a [`SpanRecord`] on close.
struct SpanState {
    context: SpanContext,
    parent_span_id: Option<SpanId>,
    name: &'static str,
    start: DateTime<Utc>,
    attributes: BTreeMap<String, serde_json::Value>,
}

/// `tracing_subscriber` layer that observes events and spans and forwards
/// them to the telemetry pipeline.
///
/// Each new span is assigned a [`SpanContext`]: a child inherits its
/// parent's trace identity, a root span starts a fresh trace. Events are
/// converted to [`LogRecord`]s, enriched with scope metadata and the active
/// span's identifiers, and handed to the log forwarder via a non-blocking
/// enqueue. Closing spans travel the analogous path through the span
/// forwarder. Network I/O is fully decoupled from application threads.
pub struct TelemetryLayer {
    enricher: Enricher,
    logs: Arc<BatchForwarder<LogRecord>>,
    spans: Arc<BatchForwarder<SpanRecord>>,
    min_level: Level,
}

impl TelemetryLayer {
    /// Compose the layer from its enricher and forwarders.
    ///
    /// `min_level` is the least severe level still captured;
    /// [`Level::TRACE`] captures everything.
    pub fn new(
        enricher: Enricher,
        logs: Arc<BatchForwarder<LogRecord>>,
        spans: Arc<BatchForwarder<SpanRecord>>,
        min_level: Level,
    ) -> Self {
        Self {
            enricher,
            logs,
            spans,
            min_level,
        }
    }
}

impl<S> Layer<S> for TelemetryLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        let parent = if attrs.is_root() {
            None
        } else if attrs.is_contextual() {
            ctx.lookup_current()
        } else {
            attrs.parent().and_then(|parent_id| ctx.span(parent_id))
        };

        let parent_context = parent.as_ref().and_then(|parent| {
            let ext = parent.extensions();
            ext.get::<SpanState>().map(|state| state.context.clone())
        });

        let (context, parent_span_id) = match parent_context {
            Some(parent_ctx) => {
                let child = SpanContext::child_of(&parent_ctx);
                (child, Some(parent_ctx.span_id))
            }
            None => (SpanContext::new_root(), None),
        };

        let mut attributes = BTreeMap::new();
        let mut message = None;
        let mut visitor = FieldVisitor {
            fields: &mut attributes,
            message: &mut message,
        };
        attrs.record(&mut visitor);
        if let Some(message) = message {
            attributes.insert("message".to_string(), serde_json::Value::String(message));
        }

        span.extensions_mut().insert(SpanState {
            context,
            parent_span_id,
            name: attrs.metadata().name(),
            start: Utc::now(),
            attributes,
        });
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut ext = span.extensions_mut();
        let Some(state) = ext.get_mut::<SpanState>() else {
            return;
        };

        let mut message = None;
        let mut visitor = FieldVisitor {
            fields: &mut state.attributes,
            message: &mut message,
        };
        values.record(&mut visitor);
        if let Some(message) = message {
            state
                .attributes
                .insert("message".to_string(), serde_json::Value::String(message));
        }
    }

    fn on_event(&self, event: &Event, ctx: Context<'_, S>) {
        if *event.metadata().level() > self.min_level {
            return;
        }

        let mut fields = BTreeMap::new();
        let mut message: Option<String> = None;

        let mut visitor = FieldVisitor {
            fields: &mut fields,
            message: &mut message,
        };
        event.record(&mut visitor);

        let meta = event.metadata();
        let record = LogRecord {
            timestamp: Utc::now(),
            level: meta.level().to_string(),
            severity_number: severity_number(meta.level()),
            target: meta.target().to_string(),
            module_path: meta.module_path().map(|s| s.to_string()),
            file: meta.file().map(|s| s.to_string()),
            line: meta.line(),
            fields,
            message,
            service_name: None,
            trace_id: None,
            span_id: None,
            trace_state: None,
        };

        // A span missing its state extension degrades to an uncorrelated
        // record; the record is still forwarded.
        let enriched = match ctx.event_span(event) {
            Some(span) => {
                let ext = span.extensions();
                self.enricher
                    .enrich(&record, ext.get::<SpanState>().map(|state| &state.context))
            }
            None => self.enricher.enrich(&record, None),
        };

        self.logs.enqueue(enriched);
    }

    fn on_close(&self, id: Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(&id) else {
            return;
        };
        let Some(state) = span.extensions_mut().remove::<SpanState>() else {
            return;
        };

        let record = SpanRecord {
            name: state.name.to_string(),
            trace_id: state.context.trace_id,
            span_id: state.context.span_id,
            parent_span_id: state.parent_span_id,
            start: state.start,
            end: Utc::now(),
            status: DEFAULT_SPAN_STATUS.to_string(),
            attributes: state.attributes,
        };

        self.spans.enqueue(self.enricher.enrich_span(&record));
    }
}

pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, serde_json::Value>,
    pub message: &'a mut Option<String>,
}

use tracing::field::{Field, Visit};

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(
                field.name().to_string(),
                serde_json::Value::String(value.to_string()),
            );
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields
            .insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields
            .insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields
            .insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields
            .insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(
                field.name().to_string(),
                serde_json::Value::String(format!("{:?}", value)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::SCOPE_NAME_KEY;
    use crate::forwarder::ForwarderConfig;
    use crate::scope::ScopeMetadata;
    use crate::test_support::CaptureSink;
    use tokio::time::Duration;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;

    struct Harness {
        log_sink: Arc<CaptureSink<LogRecord>>,
        span_sink: Arc<CaptureSink<SpanRecord>>,
        logs: Arc<BatchForwarder<LogRecord>>,
        spans: Arc<BatchForwarder<SpanRecord>>,
    }

    fn harness() -> (Harness, TelemetryLayer) {
        let config = ForwarderConfig {
            batch_size: 64,
            linger: Duration::from_secs(30),
            ..ForwarderConfig::default()
        };
        let log_sink = Arc::new(CaptureSink::<LogRecord>::default());
        let span_sink = Arc::new(CaptureSink::<SpanRecord>::default());
        let logs: Arc<BatchForwarder<LogRecord>> =
            Arc::new(BatchForwarder::new(log_sink.clone(), config.clone()));
        let spans: Arc<BatchForwarder<SpanRecord>> =
            Arc::new(BatchForwarder::new(span_sink.clone(), config));
        let enricher = Enricher::new(ScopeMetadata::new("io.example.lib", "1.0.0"));
        let layer = TelemetryLayer::new(
            enricher,
            Arc::clone(&logs),
            Arc::clone(&spans),
            Level::TRACE,
        );
        (
            Harness {
                log_sink,
                span_sink,
                logs,
                spans,
            },
            layer,
        )
    }

    #[tokio::test]
    async fn event_outside_span_has_scope_but_no_correlation() {
        let (h, layer) = harness();
        let subscriber = Registry::default().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(user_id = 42, "no span here");
        });

        h.logs.flush().await.expect("flush");
        let records = h.log_sink.items();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.message.as_deref(), Some("no span here"));
        assert_eq!(record.fields["user_id"], 42);
        assert_eq!(record.fields[SCOPE_NAME_KEY], "io.example.lib");
        assert!(record.trace_id.is_none());
        assert!(record.span_id.is_none());
    }

    #[tokio::test]
    async fn event_inside_span_carries_its_identifiers() {
        let (h, layer) = harness();
        let subscriber = Registry::default().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!("foo");
            span.in_scope(|| {
                tracing::error!("major problem");
            });
        });

        h.logs.flush().await.expect("flush logs");
        h.spans.flush().await.expect("flush spans");

        let records = h.log_sink.items();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        let trace_id = record.trace_id.expect("trace id");
        let span_id = record.span_id.expect("span id");
        assert_eq!(trace_id.to_string().len(), 32);
        assert_eq!(span_id.to_string().len(), 16);
        assert_eq!(record.trace_state.as_deref(), Some(""));

        let spans = h.span_sink.items();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "foo");
        assert_eq!(spans[0].trace_id, trace_id);
        assert_eq!(spans[0].span_id, span_id);
        assert_eq!(spans[0].status, DEFAULT_SPAN_STATUS);
        assert!(spans[0].end >= spans[0].start);
    }

    #[tokio::test]
    async fn nested_spans_share_a_trace() {
        let (h, layer) = harness();
        let subscriber = Registry::default().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            let parent = tracing::info_span!("parent");
            parent.in_scope(|| {
                let child = tracing::info_span!("child");
                child.in_scope(|| {});
            });
        });

        h.spans.flush().await.expect("flush spans");
        let spans = h.span_sink.items();
        assert_eq!(spans.len(), 2);

        // Spans close inside-out.
        let child = &spans[0];
        let parent = &spans[1];
        assert_eq!(child.name, "child");
        assert_eq!(parent.name, "parent");
        assert_eq!(child.trace_id, parent.trace_id);
        assert_eq!(child.parent_span_id, Some(parent.span_id));
        assert!(parent.parent_span_id.is_none());
    }

    #[tokio::test]
    async fn events_below_min_level_are_skipped() {
        let config = ForwarderConfig {
            batch_size: 64,
            linger: Duration::from_secs(30),
            ..ForwarderConfig::default()
        };
        let log_sink = Arc::new(CaptureSink::<LogRecord>::default());
        let span_sink = Arc::new(CaptureSink::<SpanRecord>::default());
        let logs: Arc<BatchForwarder<LogRecord>> =
            Arc::new(BatchForwarder::new(log_sink.clone(), config.clone()));
        let spans: Arc<BatchForwarder<SpanRecord>> =
            Arc::new(BatchForwarder::new(span_sink, config));
        let layer = TelemetryLayer::new(
            Enricher::new(ScopeMetadata::default()),
            Arc::clone(&logs),
            spans,
            Level::ERROR,
        );
        let subscriber = Registry::default().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("filtered out");
            tracing::error!("kept");
        });

        logs.flush().await.expect("flush");
        let records = log_sink.items();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message.as_deref(), Some("kept"));
    }

    #[tokio::test]
    async fn span_fields_recorded_after_creation_are_captured() {
        let (h, layer) = harness();
        let subscriber = Registry::default().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!("job", outcome = tracing::field::Empty);
            span.record("outcome", "done");
            drop(span);
        });

        h.spans.flush().await.expect("flush spans");
        let spans = h.span_sink.items();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].attributes["outcome"], "done");
    }
}
