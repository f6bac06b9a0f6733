use crate::enrich::Enricher;
use crate::forwarder::{BatchForwarder, ForwardError, ForwarderConfig, ForwarderStats};
use crate::layer::TelemetryLayer;
use crate::record::{LogRecord, SpanRecord};
use crate::scope::ScopeMetadata;
use crate::sink::BatchSink;
use std::sync::Arc;
use tokio::time::{Duration, Instant};
use tracing::Level;

/// Configuration of the whole telemetry pipeline.
///
/// **Fields**
/// - `scope`: static scope metadata stamped onto every record and span.
/// - `logs` / `spans`: batching behavior of the two forwarders.
/// - `min_level`: least severe level still captured; [`Level::TRACE`]
///   captures everything.
/// - `enable_stdout`: if `true`, the init helpers additionally install a
///   `tracing_subscriber::fmt` layer so events are echoed to the console.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub scope: ScopeMetadata,
    pub logs: ForwarderConfig,
    pub spans: ForwarderConfig,
    pub min_level: Level,
    pub enable_stdout: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scope: ScopeMetadata::default(),
            logs: ForwarderConfig::default(),
            spans: ForwarderConfig::default(),
            min_level: Level::TRACE,
            enable_stdout: true,
        }
    }
}

/// Handle on the running telemetry pipeline.
///
/// Owns the log and span forwarders. Constructed explicitly and passed by
/// reference to whoever needs `flush`, `shutdown` or the loss counters;
/// there is no process-global registry to mutate. The enricher is composed
/// with the forwarders once, here, at construction time.
///
/// On normal termination the owner must call [`shutdown`](Self::shutdown)
/// to guarantee queued telemetry is flushed; abrupt process exit without it
/// is lossy.
pub struct TelemetryPipeline {
    logs: Arc<BatchForwarder<LogRecord>>,
    spans: Arc<BatchForwarder<SpanRecord>>,
}

impl TelemetryPipeline {
    /// Build the pipeline and the [`TelemetryLayer`] wired to it.
    ///
    /// The layer goes onto a `tracing_subscriber` registry (see
    /// [`crate::init`]); the pipeline handle stays with the caller for
    /// explicit teardown.
    pub fn new(
        log_sink: Arc<dyn BatchSink<LogRecord>>,
        span_sink: Arc<dyn BatchSink<SpanRecord>>,
        config: PipelineConfig,
    ) -> (Self, TelemetryLayer) {
        let logs = Arc::new(BatchForwarder::new(log_sink, config.logs));
        let spans = Arc::new(BatchForwarder::new(span_sink, config.spans));

        let layer = TelemetryLayer::new(
            Enricher::new(config.scope),
            Arc::clone(&logs),
            Arc::clone(&spans),
            config.min_level,
        );

        (Self { logs, spans }, layer)
    }

    /// Transmit everything currently batched in both forwarders.
    pub async fn flush(&self) -> Result<(), ForwardError> {
        self.logs.flush().await?;
        self.spans.flush().await
    }

    /// Drain both forwarders within `timeout`.
    ///
    /// The timeout is deliberately caller-supplied; there is no default.
    /// Items unflushed when it elapses are counted as loss in the stats.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), ForwardError> {
        let started = Instant::now();
        let logs_result = self.logs.shutdown(timeout).await;
        let remaining = timeout.saturating_sub(started.elapsed());
        let spans_result = self.spans.shutdown(remaining).await;
        logs_result.and(spans_result)
    }

    pub fn log_stats(&self) -> Arc<ForwarderStats> {
        self.logs.stats()
    }

    pub fn span_stats(&self) -> Arc<ForwarderStats> {
        self.spans.stats()
    }
}
