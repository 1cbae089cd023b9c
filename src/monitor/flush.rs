use super::queue::{PendingQueue, QueueItem};
use crate::domain::{MonitorError, WireMessage};
use crate::store::LogStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Periodic drain of the pending queue into the store.
///
/// Mid-run a tick flushes one batch, and only when a full batch is queued;
/// whatever is left flushes in the terminal drain after the receive loop
/// has stopped.
pub struct Flusher {
    queue: Arc<PendingQueue>,
    store: Arc<LogStore>,
    batch_size: usize,
    interval: Duration,
}

impl Flusher {
    pub fn new(
        queue: Arc<PendingQueue>,
        store: Arc<LogStore>,
        batch_size: usize,
        interval: Duration,
    ) -> Self {
        Self {
            queue,
            store,
            batch_size,
            interval,
        }
    }

    /// Tick until the shared deadline fires. A failed flush is logged and
    /// retried on the next tick.
    pub async fn run(&self, token: CancellationToken) {
        info!(
            batch_size = self.batch_size,
            interval = ?self.interval,
            "flusher armed"
        );
        let mut ticker = time::interval_at(time::Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("flusher tick loop stopped");
                    break;
                }
                _ = ticker.tick() => match self.flush_ready() {
                    Ok(0) => trace!(queued = self.queue.len(), "no full batch to flush"),
                    Ok(flushed) => debug!(flushed, queued = self.queue.len(), "flushed batch"),
                    Err(err) => warn!(error = %err, "flush failed; retrying next tick"),
                },
            }
        }
    }

    /// Flush one batch if a full one is queued. Returns the number of items
    /// taken off the queue (0 when below the batch size).
    pub fn flush_ready(&self) -> Result<usize, MonitorError> {
        if self.queue.len() < self.batch_size {
            return Ok(0);
        }
        let snapshot = self.queue.snapshot(self.batch_size);
        self.store_batch(&snapshot)
    }

    /// Drain everything that remains, in batch-size chunks, trailing
    /// partial batch included. Runs once, after the receive loop has
    /// stopped, so nothing can be enqueued behind it.
    pub fn finalize(&self) -> Result<usize, MonitorError> {
        let mut drained = 0;
        loop {
            let snapshot = self.queue.snapshot(self.batch_size);
            if snapshot.is_empty() {
                break;
            }
            drained += self.store_batch(&snapshot)?;
        }
        info!(drained, "final flush complete");
        Ok(drained)
    }

    /// Decode a snapshot, append what decodes, then remove the whole
    /// snapshot from the queue. Undecodable items are removed too: they are
    /// already acknowledged and can never be stored.
    fn store_batch(&self, snapshot: &[QueueItem]) -> Result<usize, MonitorError> {
        let mut messages = Vec::with_capacity(snapshot.len());
        for item in snapshot {
            match WireMessage::from_bytes(&item.data) {
                Ok(message) => messages.push(message),
                Err(err) => {
                    warn!(id = %item.id, error = %err, "dropping undecodable queue item");
                }
            }
        }

        let outcome = self.store.append_from_wire(&messages);
        debug!(
            stored = outcome.stored,
            rejected = outcome.rejected,
            batch = snapshot.len(),
            "stored batch"
        );

        let ids: Vec<String> = snapshot.iter().map(|item| item.id.clone()).collect();
        self.queue.remove_flushed(&ids)?;
        Ok(snapshot.len())
    }
}
