use super::TransportError;
use crate::domain::WireMessage;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

/// In-memory pub/sub broker.
///
/// Cloning is cheap; all clones share one broker state. Each subscription
/// owns an unbounded channel created at provisioning time, so publishes
/// that happen before `subscribe` is called are buffered, not lost.
#[derive(Clone, Default)]
pub struct MemoryBroker {
    state: Arc<Mutex<BrokerState>>,
}

#[derive(Default)]
struct BrokerState {
    // topic -> names of attached subscriptions
    topics: HashMap<String, Vec<String>>,
    subscriptions: HashMap<String, SubscriptionState>,
}

struct SubscriptionState {
    topic: String,
    tx: mpsc::UnboundedSender<ReceivedMessage>,
    rx: Option<mpsc::UnboundedReceiver<ReceivedMessage>>,
    unacked: HashSet<String>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the topic if it does not already exist.
    pub fn ensure_topic(&self, name: &str) {
        let mut state = self.state.lock();
        if !state.topics.contains_key(name) {
            state.topics.insert(name.to_string(), Vec::new());
            info!(topic = name, "created topic");
        }
    }

    /// Create the subscription if it does not already exist.
    pub fn ensure_subscription(&self, name: &str, topic: &str) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if !state.topics.contains_key(topic) {
            return Err(TransportError::UnknownTopic(topic.to_string()));
        }
        if !state.subscriptions.contains_key(name) {
            let (tx, rx) = mpsc::unbounded_channel();
            state.subscriptions.insert(
                name.to_string(),
                SubscriptionState {
                    topic: topic.to_string(),
                    tx,
                    rx: Some(rx),
                    unacked: HashSet::new(),
                },
            );
            if let Some(attached) = state.topics.get_mut(topic) {
                attached.push(name.to_string());
            }
            info!(subscription = name, topic, "created subscription");
        }
        Ok(())
    }

    /// Publish a message to a topic; every attached subscription gets a
    /// copy. Returns the assigned message id.
    pub fn publish(&self, topic: &str, message: &WireMessage) -> Result<String, TransportError> {
        let data = Bytes::from(serde_json::to_vec(message)?);
        self.publish_raw(topic, data)
    }

    /// Publish an opaque payload. The monitor treats payloads as opaque
    /// until decode, so this is also the hook for injecting malformed input
    /// in tests.
    pub fn publish_raw(&self, topic: &str, data: Bytes) -> Result<String, TransportError> {
        let mut state = self.state.lock();
        let attached = state
            .topics
            .get(topic)
            .ok_or_else(|| TransportError::UnknownTopic(topic.to_string()))?
            .clone();
        let id = Uuid::new_v4().to_string();
        for name in &attached {
            if let Some(sub) = state.subscriptions.get_mut(name) {
                let message = ReceivedMessage {
                    id: id.clone(),
                    data: data.clone(),
                    acker: Acker {
                        state: Arc::downgrade(&self.state),
                        subscription: name.clone(),
                    },
                };
                if sub.tx.send(message).is_ok() {
                    sub.unacked.insert(id.clone());
                }
            }
        }
        debug!(topic, id = %id, "published message");
        Ok(id)
    }

    /// Claim the receive side of a subscription. Each subscription has one
    /// consumer; a second claim is an error.
    pub fn subscribe(&self, name: &str) -> Result<Subscription, TransportError> {
        let mut state = self.state.lock();
        let sub = state
            .subscriptions
            .get_mut(name)
            .ok_or_else(|| TransportError::UnknownSubscription(name.to_string()))?;
        let rx = sub
            .rx
            .take()
            .ok_or_else(|| TransportError::SubscriptionClaimed(name.to_string()))?;
        info!(subscription = name, topic = %sub.topic, "subscription claimed");
        Ok(Subscription {
            name: name.to_string(),
            rx,
        })
    }

    /// Messages delivered to `subscription` and not yet acknowledged.
    pub fn unacked(&self, subscription: &str) -> usize {
        self.state
            .lock()
            .subscriptions
            .get(subscription)
            .map_or(0, |sub| sub.unacked.len())
    }
}

/// The receive side of one subscription.
#[derive(Debug)]
pub struct Subscription {
    name: String,
    rx: mpsc::UnboundedReceiver<ReceivedMessage>,
}

impl Subscription {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait for the next delivered message. `None` once the broker is gone
    /// and the buffer is drained.
    pub async fn recv(&mut self) -> Option<ReceivedMessage> {
        self.rx.recv().await
    }
}

/// One delivery. `ack` tells the broker the message has been consumed and
/// must not be counted as outstanding.
#[derive(Debug)]
pub struct ReceivedMessage {
    pub id: String,
    pub data: Bytes,
    acker: Acker,
}

impl ReceivedMessage {
    pub fn ack(&self) {
        if let Some(state) = self.acker.state.upgrade() {
            let mut state = state.lock();
            if let Some(sub) = state.subscriptions.get_mut(&self.acker.subscription) {
                sub.unacked.remove(&self.id);
            }
        }
    }
}

#[derive(Debug)]
struct Acker {
    state: Weak<Mutex<BrokerState>>,
    subscription: String,
}
