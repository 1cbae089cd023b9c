//! Test publishing and the service simulator.

use crate::domain::{Severity, WireMessage};
use crate::transport::{MemoryBroker, TransportError};
use chrono::Utc;
use rand::Rng;
use std::time::Duration;
use tracing::info;

const SERVICES: [&str; 3] = ["alpha", "bravo", "charlie"];
const MIN_DELAY_MS: u64 = 50;
const MAX_DELAY_MS: u64 = 2000;

/// Publish `count` numbered test messages from the admin service.
pub fn publish_count(
    broker: &MemoryBroker,
    topic: &str,
    count: usize,
) -> Result<(), TransportError> {
    for n in 1..=count {
        let message = WireMessage {
            service_name: "Admin".to_string(),
            payload: format!("Hello world {n}"),
            severity: Severity::Info.to_string(),
            timestamp: Utc::now(),
        };
        broker.publish(topic, &message)?;
    }
    info!(count, topic, "published test messages");
    Ok(())
}

/// Publish random messages for `duration`, mimicking a handful of noisy
/// services. Returns the number sent.
pub async fn simulate(
    broker: &MemoryBroker,
    topic: &str,
    duration: Duration,
) -> Result<usize, TransportError> {
    info!(?duration, "simulating service traffic");
    let start = tokio::time::Instant::now();
    let mut sent = 0usize;
    while start.elapsed() < duration {
        sent += 1;
        broker.publish(topic, &random_message(sent))?;
        let delay = rand::rng().random_range(MIN_DELAY_MS..MAX_DELAY_MS);
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    info!(sent, "simulation finished");
    Ok(sent)
}

fn random_message(n: usize) -> WireMessage {
    let mut rng = rand::rng();
    let service = SERVICES[rng.random_range(0..SERVICES.len())];
    let severity = Severity::ALL[rng.random_range(0..Severity::ALL.len())];
    WireMessage {
        service_name: service.to_string(),
        payload: format!("Hello from {service} (message #{n})"),
        severity: severity.to_string(),
        timestamp: Utc::now(),
    }
}
