//! Stub sinks shared by the unit tests.

use crate::sink::BatchSink;
use async_trait::async_trait;
use std::error::Error;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::{sleep, Duration};

/// Records every transmitted batch for later inspection.
#[derive(Clone)]
pub(crate) struct CaptureSink<T> {
    batches: Arc<Mutex<Vec<Vec<T>>>>,
}

impl<T> Default for CaptureSink<T> {
    fn default() -> Self {
        CaptureSink {
            batches: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Clone> CaptureSink<T> {
    pub(crate) fn batches(&self) -> Vec<Vec<T>> {
        self.batches.lock().unwrap().clone()
    }

    pub(crate) fn items(&self) -> Vec<T> {
        self.batches.lock().unwrap().iter().flatten().cloned().collect()
    }

    pub(crate) fn total(&self) -> usize {
        self.batches.lock().unwrap().iter().map(Vec::len).sum()
    }
}

#[async_trait]
impl<T: Clone + Send + Sync> BatchSink<T> for CaptureSink<T> {
    async fn transmit(&self, batch: &[T]) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.batches.lock().unwrap().push(batch.to_vec());
        Ok(())
    }
}

/// Fails every transmit, counting the attempts.
#[derive(Clone, Default)]
pub(crate) struct FailSink {
    attempts: Arc<AtomicU64>,
}

impl FailSink {
    pub(crate) fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl<T: Send + Sync> BatchSink<T> for FailSink {
    async fn transmit(&self, _batch: &[T]) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        Err("transport down".into())
    }
}

/// Succeeds after an artificial delay, to simulate a slow collector.
#[derive(Clone)]
pub(crate) struct SlowSink {
    delay: Duration,
}

impl SlowSink {
    pub(crate) fn new(delay: Duration) -> Self {
        SlowSink { delay }
    }
}

#[async_trait]
impl<T: Send + Sync> BatchSink<T> for SlowSink {
    async fn transmit(&self, _batch: &[T]) -> Result<(), Box<dyn Error + Send + Sync>> {
        sleep(self.delay).await;
        Ok(())
    }
}
