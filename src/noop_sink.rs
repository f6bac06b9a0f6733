use crate::sink::BatchSink;
use async_trait::async_trait;
use std::error::Error;

/// A sink that simply drops all batches.
///
/// Useful for measuring the overhead of the layer itself without any
/// external I/O, and for unit tests that don't care about persistence.
#[derive(Clone, Default)]
pub struct NoopSink;

#[async_trait]
impl<T> BatchSink<T> for NoopSink
where
    T: Send + Sync,
{
    async fn transmit(&self, _batch: &[T]) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}
