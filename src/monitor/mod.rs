//! The ingestion–batching–flush engine.
//!
//! One task runs the receive loop, one runs the flush ticker. The pending
//! queue is the only state shared between them and lives behind the
//! coordinator's single lock. Both loops stop on one shared deadline token,
//! and the terminal drain runs only after the receive loop has joined.

pub mod flush;
pub mod ingest;
pub mod queue;

pub use flush::Flusher;
pub use ingest::{IngestReport, Ingestor};
pub use queue::{PendingQueue, QueueError, QueueItem};

use crate::domain::MonitorError;
use crate::store::LogStore;
use crate::transport::Subscription;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Run parameters, consumed as plain values by the core.
#[derive(Debug, Clone, Copy)]
pub struct MonitorConfig {
    pub duration: Duration,
    pub batch_size: usize,
    pub flush_interval: Duration,
}

impl MonitorConfig {
    /// Batching needs a batch of at least two and a nonzero tick.
    pub fn batching_enabled(&self) -> bool {
        self.batch_size > 1 && !self.flush_interval.is_zero()
    }
}

/// Summary of one monitoring run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorReport {
    pub received: u64,
    pub decode_failures: u64,
    pub stored: usize,
}

/// Orchestrates one run: the shared deadline, the receive loop, and (when
/// batching) the flusher with its guaranteed terminal drain.
pub struct Monitor {
    store: Arc<LogStore>,
    config: MonitorConfig,
}

impl Monitor {
    pub fn new(store: Arc<LogStore>, config: MonitorConfig) -> Self {
        Self { store, config }
    }

    /// Run until the configured duration elapses or the process is
    /// interrupted. Shutdown ordering: receive loop stops, flush ticker
    /// stops, terminal drain, report.
    pub async fn run(&self, subscription: Subscription) -> Result<MonitorReport, MonitorError> {
        let token = CancellationToken::new();
        let deadline = spawn_deadline(self.config.duration, token.clone());

        let queue = Arc::new(PendingQueue::new());
        let flusher = self.config.batching_enabled().then(|| {
            Arc::new(Flusher::new(
                queue.clone(),
                self.store.clone(),
                self.config.batch_size,
                self.config.flush_interval,
            ))
        });
        let flush_task = flusher.clone().map(|flusher| {
            let token = token.clone();
            tokio::spawn(async move { flusher.run(token).await })
        });

        let ingestor = Ingestor::new(self.store.clone(), queue.clone(), self.config.batch_size);
        let ingest = ingestor.run(subscription, token.clone()).await;

        // The receive loop can also exit early on a closed channel; release
        // the flusher and the deadline either way.
        token.cancel();
        deadline.abort();

        if let Some(task) = flush_task {
            task.await
                .map_err(|err| MonitorError::Shutdown(format!("flusher task failed: {err}")))?;
        }
        if let Some(flusher) = &flusher {
            flusher.finalize()?;
        }

        let report = MonitorReport {
            received: ingest.received,
            decode_failures: ingest.decode_failures,
            stored: self.store.count(),
        };
        info!(
            received = report.received,
            stored = report.stored,
            "monitor run complete"
        );
        Ok(report)
    }
}

/// One deadline for the whole run; both loops watch the token it cancels.
fn spawn_deadline(duration: Duration, token: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(duration) => info!(?duration, "run duration elapsed"),
            _ = tokio::signal::ctrl_c() => info!("interrupt received"),
        }
        token.cancel();
    })
}
