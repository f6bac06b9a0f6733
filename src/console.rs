use crate::sink::BatchSink;
use async_trait::async_trait;
use serde::Serialize;
use std::error::Error;

/// Sink that prints each item as one JSON line on stdout.
///
/// The development-time counterpart of the HTTP collector sink: wire the
/// span forwarder to it to watch finished spans scroll by.
#[derive(Clone, Default)]
pub struct ConsoleSink;

#[async_trait]
impl<T> BatchSink<T> for ConsoleSink
where
    T: Serialize + Send + Sync,
{
    async fn transmit(&self, batch: &[T]) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut out = String::new();
        for item in batch {
            out.push_str(&serde_json::to_string(item)?);
            out.push('\n');
        }
        print!("{}", out);
        Ok(())
    }
}
