use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use iam_core::AuditRecord;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use crate::config::AuditPipelineConfig;
use crate::sink::AuditSink;

/// The forced flush bound: even at low-but-nonzero traffic, a batch never
/// sits unflushed longer than this, independent of the configured
/// `flush_interval`.
const FORCED_FLUSH_BOUND: Duration = Duration::from_secs(1);

/// Bounded single-producer-multi-consumer audit pipeline (C7).
///
/// Cheap to clone: every clone shares the same queue and stop flag, so any
/// number of decision-path callers can hold one.
#[derive(Clone)]
pub struct AuditPipeline {
    tx: mpsc::Sender<AuditRecord>,
    rx: Arc<Mutex<mpsc::Receiver<AuditRecord>>>,
    should_stop: Arc<AtomicBool>,
}

impl AuditPipeline {
    /// Connect to `sink` and spawn `config.pool_size` workers. Returns the
    /// pipeline handle plus the workers' join handles, which [`Self::stop`]
    /// needs to wait out.
    pub fn start(config: AuditPipelineConfig, sink: Arc<dyn AuditSink>) -> (Self, Vec<JoinHandle<()>>) {
        let (tx, rx) = mpsc::channel(config.buffer_capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let batch_capacity = config.batch_capacity();

        let handles = (0..config.pool_size)
            .map(|id| {
                tokio::spawn(worker_loop(
                    id,
                    Arc::clone(&rx),
                    Arc::clone(&sink),
                    config.sink_key.clone(),
                    batch_capacity,
                    config.flush_interval,
                ))
            })
            .collect();

        let pipeline = Self {
            tx,
            rx,
            should_stop: Arc::new(AtomicBool::new(false)),
        };
        (pipeline, handles)
    }

    /// Enqueue `record`. Silently dropped if [`Self::stop`] has already been
    /// called. Otherwise blocks if the queue is full — backpressure that
    /// propagates all the way to the decision frontend.
    pub async fn record_hit(&self, record: AuditRecord) {
        if self.should_stop.load(Ordering::Acquire) {
            tracing::trace!("audit pipeline stopped, dropping record");
            return;
        }

        if self.tx.send(record).await.is_err() {
            tracing::warn!("audit pipeline queue closed, dropping record");
        }
    }

    /// Stop accepting new records, close the queue, and wait for every
    /// worker to flush its remaining batch and exit. Records already
    /// buffered in the queue are delivered before this returns; records
    /// offered after `stop` is called are dropped.
    pub async fn stop(&self, workers: Vec<JoinHandle<()>>) {
        self.should_stop.store(true, Ordering::Release);
        self.rx.lock().await.close();

        for worker in workers {
            if let Err(err) = worker.await {
                tracing::error!(error = %err, "audit pipeline worker panicked");
            }
        }
    }
}

async fn worker_loop(
    id: usize,
    rx: Arc<Mutex<mpsc::Receiver<AuditRecord>>>,
    sink: Arc<dyn AuditSink>,
    key: String,
    batch_capacity: usize,
    flush_interval: Duration,
) {
    let mut batch: Vec<Vec<u8>> = Vec::with_capacity(batch_capacity);
    let mut last_flush = Instant::now();
    let mut timer = tokio::time::interval(flush_interval);
    timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick fires immediately; consume it so it doesn't force a
    // spurious flush of an empty batch.
    timer.tick().await;

    loop {
        let mut ready_to_send = false;
        let mut closed = false;

        tokio::select! {
            _ = timer.tick() => {
                ready_to_send = true;
            }
            received = async { rx.lock().await.recv().await } => {
                match received {
                    Some(record) => {
                        match rmp_serde::to_vec(&record) {
                            Ok(bytes) => batch.push(bytes),
                            Err(err) => tracing::warn!(worker = id, error = %err, "dropping record that failed to serialize"),
                        }
                        if batch.len() >= batch_capacity {
                            ready_to_send = true;
                        }
                    }
                    None => closed = true,
                }
            }
        }

        let forced = last_flush.elapsed() >= FORCED_FLUSH_BOUND;
        if !batch.is_empty() && (ready_to_send || forced || closed) {
            flush(&sink, &key, &mut batch, id).await;
            last_flush = Instant::now();
        }

        if closed {
            tracing::debug!(worker = id, "audit worker draining and exiting");
            return;
        }
    }
}

async fn flush(sink: &Arc<dyn AuditSink>, key: &str, batch: &mut Vec<Vec<u8>>, worker_id: usize) {
    let records = std::mem::take(batch);
    let count = records.len();
    if let Err(err) = sink.append_batch(key, records).await {
        tracing::error!(worker = worker_id, error = %err, dropped = count, "audit batch flush failed, dropping batch");
    }
}
