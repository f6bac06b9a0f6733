use crate::sink::BatchSink;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, timeout, Duration, Instant, MissedTickBehavior};

const STATE_ACCEPTING: u8 = 0;
const STATE_DRAINING: u8 = 1;
const STATE_STOPPED: u8 = 2;

/// Batching and retry behavior of a [`BatchForwarder`].
///
/// **Fields**
/// - `channel_buffer`: maximum queued items before new ones are dropped.
/// - `batch_size`: flush as soon as the in-flight batch reaches this size.
/// - `linger`: maximum time a non-empty batch may sit unflushed.
/// - `max_attempts`: total `transmit` attempts per batch before it is
///   dropped and counted as loss.
/// - `initial_backoff` / `max_backoff`: exponential backoff bounds between
///   failed attempts.
#[derive(Clone, Debug)]
pub struct ForwarderConfig {
    pub channel_buffer: usize,
    pub batch_size: usize,
    pub linger: Duration,
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            channel_buffer: 1024,
            batch_size: 128,
            linger: Duration::from_secs(1),
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
        }
    }
}

/// Loss and throughput counters for one forwarder.
///
/// Telemetry failures are never raised to the emitting caller; loss is
/// observable only here.
#[derive(Debug, Default)]
pub struct ForwarderStats {
    /// Items accepted into the queue.
    pub enqueued: AtomicU64,
    /// Dropped because the queue was full.
    pub dropped_queue_full: AtomicU64,
    /// Items transmitted successfully.
    pub delivered: AtomicU64,
    /// Items dropped after the transmit attempt bound was exhausted.
    pub lost_transport: AtomicU64,
    /// Items still unflushed when a shutdown timeout elapsed.
    pub lost_shutdown: AtomicU64,
}

impl ForwarderStats {
    /// Accepted items not yet delivered or counted as lost.
    pub fn pending(&self) -> u64 {
        self.enqueued
            .load(Ordering::Relaxed)
            .saturating_sub(self.delivered.load(Ordering::Relaxed))
            .saturating_sub(self.lost_transport.load(Ordering::Relaxed))
            .saturating_sub(self.lost_shutdown.load(Ordering::Relaxed))
    }
}

#[derive(thiserror::Error, Debug, Clone)]
pub enum ForwardError {
    #[error("transport failed after {attempts} attempts")]
    TransportExhausted { attempts: u32 },

    #[error("shutdown timed out with {lost} items unflushed")]
    ShutdownTimeout { lost: u64 },

    #[error("forwarder is stopped")]
    Stopped,
}

enum Envelope<T> {
    Item(T),
    Flush(oneshot::Sender<Result<(), ForwardError>>),
}

/// Accumulates telemetry items and ships them to a [`BatchSink`] from a
/// single background worker.
///
/// Producers call [`enqueue`](BatchForwarder::enqueue), which only performs
/// a non-blocking channel send; the worker owns the batch and flushes it
/// when it reaches `batch_size` or when the linger timer expires, whichever
/// comes first. Lifecycle: `Accepting` in steady state, `Draining` once
/// [`shutdown`](BatchForwarder::shutdown) is called, then `Stopped`. A
/// stopped forwarder silently ignores further enqueues.
pub struct BatchForwarder<T> {
    tx: mpsc::Sender<Envelope<T>>,
    shutdown_tx: watch::Sender<bool>,
    state: Arc<AtomicU8>,
    stats: Arc<ForwarderStats>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> BatchForwarder<T> {
    /// Create a forwarder and spawn its background worker.
    pub fn new(sink: Arc<dyn BatchSink<T>>, config: ForwarderConfig) -> Self {
        // Enforce minimal thresholds to avoid degenerate configs.
        let config = ForwarderConfig {
            channel_buffer: config.channel_buffer.max(16),
            batch_size: config.batch_size.max(1),
            linger: config.linger.max(Duration::from_millis(10)),
            max_attempts: config.max_attempts.max(1),
            ..config
        };

        let (tx, rx) = mpsc::channel::<Envelope<T>>(config.channel_buffer);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let stats = Arc::new(ForwarderStats::default());

        let handle = tokio::spawn(run_worker(
            rx,
            shutdown_rx,
            sink,
            config,
            Arc::clone(&stats),
        ));

        Self {
            tx,
            shutdown_tx,
            state: Arc::new(AtomicU8::new(STATE_ACCEPTING)),
            stats,
            worker: Mutex::new(Some(handle)),
        }
    }

    /// Append an item to the in-memory queue.
    ///
    /// Never blocks and never fails the caller: a full queue drops the item
    /// and bumps `dropped_queue_full`; a stopped forwarder ignores the call
    /// entirely.
    pub fn enqueue(&self, item: T) {
        if self.state.load(Ordering::Acquire) != STATE_ACCEPTING {
            return;
        }
        match self.tx.try_send(Envelope::Item(item)) {
            Ok(()) => {
                self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                self.stats.dropped_queue_full.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Transmit the current batch and wait for the result.
    pub async fn flush(&self) -> Result<(), ForwardError> {
        if self.state.load(Ordering::Acquire) != STATE_ACCEPTING {
            return Err(ForwardError::Stopped);
        }
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(Envelope::Flush(ack_tx))
            .await
            .map_err(|_| ForwardError::Stopped)?;
        ack_rx.await.map_err(|_| ForwardError::Stopped)?
    }

    /// Drain the queue and perform a final flush within `timeout`.
    ///
    /// Items still unflushed when the timeout elapses are abandoned (the
    /// in-flight transmit is not force-killed) and counted in
    /// `lost_shutdown`. Subsequent `enqueue` calls are no-ops either way.
    pub async fn shutdown(&self, drain_timeout: Duration) -> Result<(), ForwardError> {
        if self
            .state
            .compare_exchange(
                STATE_ACCEPTING,
                STATE_DRAINING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return Err(ForwardError::Stopped);
        }

        let _ = self.shutdown_tx.send(true);
        let handle = self.worker.lock().await.take();

        let drained = match handle {
            Some(handle) => timeout(drain_timeout, handle).await.is_ok(),
            None => true,
        };

        self.state.store(STATE_STOPPED, Ordering::Release);

        if drained {
            Ok(())
        } else {
            let lost = self.stats.pending();
            self.stats.lost_shutdown.fetch_add(lost, Ordering::Relaxed);
            Err(ForwardError::ShutdownTimeout { lost })
        }
    }

    pub fn stats(&self) -> Arc<ForwarderStats> {
        Arc::clone(&self.stats)
    }
}

async fn run_worker<T: Send + 'static>(
    mut rx: mpsc::Receiver<Envelope<T>>,
    mut shutdown_rx: watch::Receiver<bool>,
    sink: Arc<dyn BatchSink<T>>,
    config: ForwarderConfig,
    stats: Arc<ForwarderStats>,
) {
    let mut batch: Vec<T> = Vec::with_capacity(config.batch_size);
    // First tick one full linger period out, not immediately.
    let mut ticker = interval_at(Instant::now() + config.linger, config.linger);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            maybe = rx.recv() => match maybe {
                Some(Envelope::Item(item)) => {
                    batch.push(item);
                    if batch.len() >= config.batch_size {
                        let _ = flush_batch(&*sink, &mut batch, &config, &stats).await;
                    }
                }
                Some(Envelope::Flush(ack)) => {
                    let _ = ack.send(flush_batch(&*sink, &mut batch, &config, &stats).await);
                }
                None => break,
            },
            _ = shutdown_rx.changed() => break,
            _ = ticker.tick() => {
                if !batch.is_empty() {
                    let _ = flush_batch(&*sink, &mut batch, &config, &stats).await;
                }
            }
        }
    }

    // Drain whatever is still queued, then flush one last time.
    rx.close();
    let mut acks = Vec::new();
    while let Ok(envelope) = rx.try_recv() {
        match envelope {
            Envelope::Item(item) => batch.push(item),
            Envelope::Flush(ack) => acks.push(ack),
        }
    }
    let result = flush_batch(&*sink, &mut batch, &config, &stats).await;
    for ack in acks {
        let _ = ack.send(result.clone());
    }
}

/// Transmit `batch` with bounded retry and exponential backoff.
///
/// On success the items are counted as delivered; once the attempt bound is
/// exhausted the batch is dropped, counted as transport loss, and the error
/// is reported only to an explicit `flush` caller, never to the emit path.
async fn flush_batch<T>(
    sink: &dyn BatchSink<T>,
    batch: &mut Vec<T>,
    config: &ForwarderConfig,
    stats: &ForwarderStats,
) -> Result<(), ForwardError> {
    if batch.is_empty() {
        return Ok(());
    }

    let mut backoff = config.initial_backoff;
    for attempt in 1..=config.max_attempts {
        match sink.transmit(batch).await {
            Ok(()) => {
                stats.delivered.fetch_add(batch.len() as u64, Ordering::Relaxed);
                batch.clear();
                return Ok(());
            }
            Err(e) => {
                eprintln!(
                    "telemetry batch send failed (attempt {}/{}): {}",
                    attempt, config.max_attempts, e
                );
                if attempt < config.max_attempts {
                    sleep(backoff).await;
                    backoff = std::cmp::min(backoff * 2, config.max_backoff);
                }
            }
        }
    }

    stats
        .lost_transport
        .fetch_add(batch.len() as u64, Ordering::Relaxed);
    batch.clear();
    Err(ForwardError::TransportExhausted {
        attempts: config.max_attempts,
    })
}
