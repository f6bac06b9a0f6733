use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Duration;
use tracing::{error, info};
use tracing_otel_export::{
    init::init_telemetry,
    noop_sink::NoopSink,
    record::LogRecord,
    scope::ScopeMetadata,
    sink::BatchSink,
};

/// Example of integrating a completely custom backend by implementing
/// the `BatchSink` trait directly. Imagine this talks to some
/// proprietary DB for which this crate does not provide a built-in
/// sink.
struct MyCustomDbSink;

#[async_trait]
impl BatchSink<LogRecord> for MyCustomDbSink {
    async fn transmit(
        &self,
        batch: &[LogRecord],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        // Here you would call your own client library for the target DB.
        // For the sake of example we just print the records.
        for record in batch {
            println!("[my-custom-db] {:?}", record);
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let pipeline = init_telemetry(
        Arc::new(MyCustomDbSink),
        Arc::new(NoopSink),
        ScopeMetadata::new("custom-sink-example", "0.1.0"),
    );

    info!("custom backend example started");
    error!(db = "my-custom-db", "simulated error sent via custom backend");

    pipeline
        .shutdown(Duration::from_secs(2))
        .await
        .expect("drain telemetry");
}
