use crate::sink::BatchSink;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::error::Error;

/// Configuration for [`HttpCollectorSink`].
///
/// The sink POSTs each batch to the collector as newline-delimited JSON.
/// Logs and spans normally target different ingestion URLs, so a pipeline
/// holds one sink instance per signal.
#[derive(Clone, Debug)]
pub struct CollectorConfig {
    /// Full ingestion URL, e.g. "http://127.0.0.1:4318/v1/logs".
    pub url: String,
    /// Optional bearer token sent in the `Authorization` header.
    pub auth_token: Option<String>,
    /// Extra headers, e.g. a tenant id.
    pub headers: Vec<(String, String)>,
}

impl CollectorConfig {
    pub fn new(url: impl Into<String>) -> Self {
        CollectorConfig {
            url: url.into(),
            auth_token: None,
            headers: Vec::new(),
        }
    }
}

/// HTTP implementation of [`BatchSink`] for any serializable item type.
#[derive(Clone)]
pub struct HttpCollectorSink {
    client: Client,
    config: CollectorConfig,
}

impl HttpCollectorSink {
    /// Construct a new sink instance using the provided configuration.
    ///
    /// **Parameters**
    /// - `config`: [`CollectorConfig`] describing the target URL and
    ///   optional authentication settings.
    ///
    /// **Returns**
    /// - A ready-to-use [`HttpCollectorSink`] that can be passed into
    ///   [`init_telemetry`](crate::init::init_telemetry) /
    ///   [`init_telemetry_with_config`](crate::init::init_telemetry_with_config).
    pub fn new(config: CollectorConfig) -> Self {
        let client = Client::new();
        Self { client, config }
    }

    fn request(&self) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .post(&self.config.url)
            .header("Content-Type", "application/x-ndjson");

        if let Some(token) = &self.config.auth_token {
            req = req.bearer_auth(token);
        }
        for (name, value) in &self.config.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        req
    }
}

#[async_trait]
impl<T> BatchSink<T> for HttpCollectorSink
where
    T: Serialize + Send + Sync,
{
    async fn transmit(&self, batch: &[T]) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut body = String::new();
        for item in batch {
            body.push_str(&serde_json::to_string(item)?);
            body.push('\n');
        }

        let resp = self.request().body(body).send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
            Err(format!("collector ingest failed with status {}: {}", status, text).into())
        }
    }
}
