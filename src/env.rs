/// Environment variable names used by this crate for convenient
/// configuration of the pipeline from services.
///
/// These are purely helpers; the core types remain decoupled from
/// environment access.

/// Log ingestion URL, e.g. `http://127.0.0.1:4318/v1/logs`.
pub const OTEL_EXPORT_LOGS_URL_ENV: &str = "OTEL_EXPORT_LOGS_URL";

/// Span ingestion URL, e.g. `http://127.0.0.1:4318/v1/traces`.
pub const OTEL_EXPORT_SPANS_URL_ENV: &str = "OTEL_EXPORT_SPANS_URL";

/// Optional bearer token for the collector.
pub const OTEL_EXPORT_AUTH_TOKEN_ENV: &str = "OTEL_EXPORT_AUTH_TOKEN";

/// Logical service name attached to all telemetry.
pub const OTEL_EXPORT_SERVICE_NAME_ENV: &str = "OTEL_EXPORT_SERVICE_NAME";

/// Service instance id attached to all telemetry.
pub const OTEL_EXPORT_SERVICE_INSTANCE_ENV: &str = "OTEL_EXPORT_SERVICE_INSTANCE";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
