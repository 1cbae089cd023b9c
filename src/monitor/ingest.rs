use super::queue::{PendingQueue, QueueItem};
use crate::domain::WireMessage;
use crate::store::LogStore;
use crate::transport::{ReceivedMessage, Subscription};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Delivery counters reported by the receive loop when it exits.
///
/// `received` counts every delivered message, including ones that later
/// fail decoding; acknowledgment has already happened by then.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub received: u64,
    pub decode_failures: u64,
}

/// Long-lived receive loop bound to one subscription.
///
/// With batching disabled every message is appended to the store
/// synchronously; with batching enabled it is handed to the pending queue
/// for the flusher to drain.
pub struct Ingestor {
    store: Arc<LogStore>,
    queue: Arc<PendingQueue>,
    batching: bool,
    report: IngestReport,
}

impl Ingestor {
    pub fn new(store: Arc<LogStore>, queue: Arc<PendingQueue>, batch_size: usize) -> Self {
        Self {
            store,
            queue,
            batching: batch_size > 1,
            report: IngestReport::default(),
        }
    }

    /// Receive until the shared deadline fires or the channel closes.
    /// Returns the delivery counters either way.
    pub async fn run(
        mut self,
        mut subscription: Subscription,
        token: CancellationToken,
    ) -> IngestReport {
        info!(
            subscription = subscription.name(),
            batching = self.batching,
            "receive loop started"
        );
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("receive deadline reached");
                    break;
                }
                message = subscription.recv() => match message {
                    Some(message) => self.handle(message),
                    None => {
                        debug!("subscription channel closed");
                        break;
                    }
                },
            }
        }
        info!(
            received = self.report.received,
            decode_failures = self.report.decode_failures,
            "receive loop finished"
        );
        self.report
    }

    /// Handle one delivery. The acknowledgment is unconditional and happens
    /// before the decode outcome is inspected.
    fn handle(&mut self, message: ReceivedMessage) {
        self.report.received += 1;
        let decoded = WireMessage::from_bytes(&message.data);
        message.ack();

        let wire = match decoded {
            Ok(wire) => wire,
            Err(err) => {
                self.report.decode_failures += 1;
                warn!(id = %message.id, error = %err, "dropping undecodable message");
                return;
            }
        };
        debug!(
            id = %message.id,
            service = %wire.service_name,
            severity = %wire.severity,
            "received message"
        );

        if self.batching {
            let item = QueueItem {
                id: message.id.clone(),
                data: message.data.clone(),
                acknowledged: true,
            };
            if let Err(err) = self.queue.enqueue(item) {
                warn!(id = %message.id, error = %err, "ignoring redelivered message");
            }
        } else {
            self.store.append_from_wire(std::slice::from_ref(&wire));
        }
    }
}
