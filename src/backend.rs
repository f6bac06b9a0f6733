use std::sync::Arc;

use serde::Serialize;

use crate::console::ConsoleSink;
use crate::noop_sink::NoopSink;
use crate::record::{LogRecord, SpanRecord};
use crate::sink::BatchSink;

/// Supported exporter kinds that can be selected via DSN or config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExporterKind {
    Http,
    Console,
    Noop,
}

/// High-level exporter configuration built from a DSN or explicit fields.
///
/// It only stores the target kind and the raw DSN string; this keeps the
/// API stable while individual exporters remain optional.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    /// Selected exporter implementation.
    pub kind: ExporterKind,
    /// Raw DSN that was used to construct this config.
    pub dsn: String,
}

impl ExporterConfig {
    pub fn new(kind: ExporterKind, dsn: impl Into<String>) -> Self {
        ExporterConfig {
            kind,
            dsn: dsn.into(),
        }
    }
}

/// Parse a DSN string and infer the exporter kind from its scheme.
///
/// Examples:
/// - "http://127.0.0.1:4318/v1/logs"
/// - "https://collector.example.com/v1/traces"
/// - "console://"
/// - "noop://"
pub fn parse_dsn(dsn: &str) -> Result<ExporterConfig, DsnError> {
    let lower = dsn.to_ascii_lowercase();

    if lower.starts_with("http://") || lower.starts_with("https://") {
        Ok(ExporterConfig::new(ExporterKind::Http, dsn))
    } else if lower.starts_with("console://") {
        Ok(ExporterConfig::new(ExporterKind::Console, dsn))
    } else if lower.starts_with("noop://") {
        Ok(ExporterConfig::new(ExporterKind::Noop, dsn))
    } else {
        Err(DsnError::UnknownScheme)
    }
}

/// Error type returned when parsing a DSN.
#[derive(thiserror::Error, Debug)]
pub enum DsnError {
    #[error("unknown or unsupported DSN scheme")]
    UnknownScheme,
}

/// Error type returned when building an exporter sink from configuration.
#[derive(thiserror::Error, Debug)]
pub enum ExporterBuildError {
    #[error("http feature is not enabled")]
    HttpFeatureDisabled,
}

/// Create a concrete [`BatchSink`] implementation from an
/// [`ExporterConfig`].
///
/// For the HTTP kind the entire DSN is treated as the ingestion URL;
/// authentication headers can be added by constructing
/// [`HttpCollectorSink`](crate::http::HttpCollectorSink) manually instead.
pub fn make_sink<T>(cfg: &ExporterConfig) -> Result<Arc<dyn BatchSink<T>>, ExporterBuildError>
where
    T: Serialize + Send + Sync + 'static,
{
    match cfg.kind {
        ExporterKind::Http => {
            #[cfg(feature = "http")]
            {
                use crate::http::{CollectorConfig, HttpCollectorSink};

                let sink = HttpCollectorSink::new(CollectorConfig::new(cfg.dsn.clone()));
                Ok(Arc::new(sink) as Arc<dyn BatchSink<T>>)
            }

            #[cfg(not(feature = "http"))]
            {
                let _ = cfg; // silence unused warning when feature is disabled
                Err(ExporterBuildError::HttpFeatureDisabled)
            }
        }
        ExporterKind::Console => Ok(Arc::new(ConsoleSink) as Arc<dyn BatchSink<T>>),
        ExporterKind::Noop => Ok(Arc::new(NoopSink) as Arc<dyn BatchSink<T>>),
    }
}

/// Sink for the log forwarder, selected by DSN.
///
/// This is the main entry point for applications that want to select an
/// exporter using a single DSN string instead of constructing sinks
/// manually.
pub fn make_log_sink(
    cfg: &ExporterConfig,
) -> Result<Arc<dyn BatchSink<LogRecord>>, ExporterBuildError> {
    make_sink::<LogRecord>(cfg)
}

/// Sink for the span forwarder, selected by DSN.
pub fn make_span_sink(
    cfg: &ExporterConfig,
) -> Result<Arc<dyn BatchSink<SpanRecord>>, ExporterBuildError> {
    make_sink::<SpanRecord>(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dsn_schemes_map_to_exporter_kinds() {
        assert_eq!(
            parse_dsn("http://127.0.0.1:4318/v1/logs").unwrap().kind,
            ExporterKind::Http
        );
        assert_eq!(
            parse_dsn("HTTPS://collector.example.com/v1/traces")
                .unwrap()
                .kind,
            ExporterKind::Http
        );
        assert_eq!(parse_dsn("console://").unwrap().kind, ExporterKind::Console);
        assert_eq!(parse_dsn("noop://").unwrap().kind, ExporterKind::Noop);
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        assert!(matches!(
            parse_dsn("kafka://broker/topic"),
            Err(DsnError::UnknownScheme)
        ));
    }

    #[test]
    fn console_and_noop_sinks_build_without_features() {
        let console = parse_dsn("console://").unwrap();
        assert!(make_log_sink(&console).is_ok());
        let noop = parse_dsn("noop://").unwrap();
        assert!(make_span_sink(&noop).is_ok());
    }
}
