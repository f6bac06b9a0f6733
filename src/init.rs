use crate::pipeline::{PipelineConfig, TelemetryPipeline};
use crate::record::{LogRecord, SpanRecord};
use crate::scope::ScopeMetadata;
use crate::sink::BatchSink;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Build the pipeline and install its layer as the global `tracing`
/// subscriber.
///
/// **Parameters**
/// - `log_sink` / `span_sink`: [`BatchSink`] implementations receiving the
///   enriched batches.
/// - `config`: [`PipelineConfig`] controlling scope metadata, batching and
///   the optional stdout echo.
///
/// **Returns**
///
/// The [`TelemetryPipeline`] handle. Keep it: teardown is explicit — call
/// [`TelemetryPipeline::shutdown`] with a timeout of your choosing before
/// the process exits, or queued telemetry is lost.
///
/// **Effects**
///
/// Installs a [`Registry`] combined with the telemetry layer (and, when
/// `enable_stdout` is set, a `fmt` layer) as the global default
/// subscriber, so all `tracing` events in the process are observed.
pub fn init_telemetry_with_config(
    log_sink: Arc<dyn BatchSink<LogRecord>>,
    span_sink: Arc<dyn BatchSink<SpanRecord>>,
    config: PipelineConfig,
) -> TelemetryPipeline {
    let enable_stdout = config.enable_stdout;
    let (pipeline, layer) = TelemetryPipeline::new(log_sink, span_sink, config);

    // Always install the layer that feeds the forwarders. When
    // `enable_stdout` is set, add a `fmt` layer on top so events are also
    // visible on the console. The subscriber is assembled in two variants
    // for type compatibility.
    if enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");
    }

    pipeline
}

/// Initialize telemetry with default batching and the given scope.
///
/// Equivalent to calling [`init_telemetry_with_config`] with
/// [`PipelineConfig::default`] and `scope` filled in. This is the
/// recommended entrypoint for typical services.
pub fn init_telemetry(
    log_sink: Arc<dyn BatchSink<LogRecord>>,
    span_sink: Arc<dyn BatchSink<SpanRecord>>,
    scope: ScopeMetadata,
) -> TelemetryPipeline {
    init_telemetry_with_config(
        log_sink,
        span_sink,
        PipelineConfig {
            scope,
            ..PipelineConfig::default()
        },
    )
}
