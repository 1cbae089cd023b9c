use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use thiserror::Error;

/// Errors from pending-queue operations. An invariant violation is
/// recoverable: the flusher logs it and retries on its next tick.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("duplicate queue item: {0}")]
    Duplicate(String),

    #[error("flush removed {removed} of {expected} items; {remaining} remain queued")]
    InvariantViolation {
        expected: usize,
        removed: usize,
        remaining: usize,
    },
}

/// A received, already-acknowledged message awaiting flush.
#[derive(Debug, Clone)]
pub struct QueueItem {
    pub id: String,
    pub data: Bytes,
    pub acknowledged: bool,
}

/// Owner of the pending queue.
///
/// Every operation takes the single interior lock, so ingest enqueues and
/// flusher drains never observe partial state. FIFO by arrival; ids are
/// unique within the queue.
#[derive(Default)]
pub struct PendingQueue {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    items: VecDeque<QueueItem>,
    ids: HashSet<String>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an item. A duplicate id is rejected so a transport
    /// redelivery cannot be stored twice.
    pub fn enqueue(&self, item: QueueItem) -> Result<(), QueueError> {
        let mut inner = self.inner.lock();
        if !inner.ids.insert(item.id.clone()) {
            return Err(QueueError::Duplicate(item.id));
        }
        inner.items.push_back(item);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clone the oldest `max` items without removing them.
    pub fn snapshot(&self, max: usize) -> Vec<QueueItem> {
        self.inner.lock().items.iter().take(max).cloned().collect()
    }

    /// Remove exactly the flushed items, by id. Returns the number removed;
    /// a mismatch with `ids.len()` means an item the flush expected to clear
    /// was already gone, reported as an invariant violation.
    pub fn remove_flushed(&self, ids: &[String]) -> Result<usize, QueueError> {
        let mut inner = self.inner.lock();
        let flushed: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let before = inner.items.len();
        inner.items.retain(|item| !flushed.contains(item.id.as_str()));
        let removed = before - inner.items.len();
        for id in ids {
            inner.ids.remove(id);
        }
        if removed != ids.len() {
            return Err(QueueError::InvariantViolation {
                expected: ids.len(),
                removed,
                remaining: inner.items.len(),
            });
        }
        Ok(removed)
    }
}
