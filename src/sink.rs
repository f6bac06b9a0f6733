use async_trait::async_trait;
use std::error::Error;

/// Asynchronous destination for batches of telemetry items.
///
/// Implementations are responsible for transporting batches to a concrete
/// collector (HTTP collector, stdout, etc). The forwarder calls `transmit`
/// from a background task and never awaits it on the application thread.
#[async_trait]
pub trait BatchSink<T>: Send + Sync {
    /// Send one batch of items to the underlying collector.
    ///
    /// **Parameters**
    /// - `batch`: ordered, fully-enriched items accumulated by the
    ///   forwarder. Ownership of the batch stays with the forwarder; the
    ///   sink only borrows it for the duration of the call.
    ///
    /// **Returns**
    /// - `Ok(())` if the batch was accepted by the collector.
    /// - `Err(..)` if the collector failed (network error, serialization
    ///   error, HTTP status, etc.). The forwarder treats this as a
    ///   transient failure and retries the batch with backoff up to its
    ///   configured attempt bound, after which the batch is dropped and
    ///   counted as loss.
    ///
    /// This method is called from a Tokio task that owns the batching
    /// loop. Implementations should strive to be non-blocking and use
    /// async I/O under the hood.
    async fn transmit(&self, batch: &[T]) -> Result<(), Box<dyn Error + Send + Sync>>;
}
