//! In-memory pub/sub transport.
//!
//! Implements the contract the monitor consumes: topic/subscription
//! provisioning, publish, subscribe, acknowledge. Stands in for the managed
//! broker a deployed system would run against; delivery is at-least-once
//! from the consumer's point of view, and messages published before a
//! subscriber attaches are buffered.

pub mod memory;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("unknown topic: {0}")]
    UnknownTopic(String),

    #[error("unknown subscription: {0}")]
    UnknownSubscription(String),

    #[error("subscription already claimed: {0}")]
    SubscriptionClaimed(String),

    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

pub use memory::{MemoryBroker, ReceivedMessage, Subscription};
