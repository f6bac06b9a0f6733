use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, info_span, warn};

use tracing_otel_export::console::ConsoleSink;
use tracing_otel_export::init::init_telemetry;
use tracing_otel_export::scope::ScopeMetadata;

/// Periodic log generator: emits a handful of canned lines and one span per
/// cycle, then drains the pipeline before exiting.
#[tokio::main]
async fn main() {
    let scope = ScopeMetadata::new("io.opentelemetry.contrib.mongodb", "1.0.0")
        .with_attribute("service.name", "shoppingcart")
        .with_attribute("service.instance.id", "instance-12");

    let pipeline = init_telemetry(Arc::new(ConsoleSink), Arc::new(ConsoleSink), scope);

    for _ in 0..3 {
        info!("Jackdaws love my big sphinx of quartz.");
        debug!(target: "myapp::area1", "Quick zephyrs blow, vexing daft Jim.");
        info!(target: "myapp::area1", "How quickly daft jumping zebras vex.");
        warn!(target: "myapp::area2", "Jail zesty vixen who grabbed pay from quack.");
        error!(target: "myapp::area2", "The five boxing wizards jump quickly.");

        let span = info_span!("foo");
        span.in_scope(|| {
            error!(target: "myapp::area2", "Hyderabad, we have a major problem.");
        });

        sleep(Duration::from_secs(3)).await;
    }

    pipeline
        .shutdown(Duration::from_secs(5))
        .await
        .expect("drain telemetry");
}
