// End-to-end scenarios: publish onto the broker, run the monitor for a
// virtual duration (paused clock), inspect the store and the report.
use bytes::Bytes;
use chrono::Utc;
use log_monitor::domain::WireMessage;
use log_monitor::monitor::{Monitor, MonitorConfig, MonitorReport};
use log_monitor::store::LogStore;
use log_monitor::transport::MemoryBroker;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

const TOPIC: &str = "log-topic";
const SUBSCRIPTION: &str = "log-sub";

fn provisioned() -> MemoryBroker {
    let broker = MemoryBroker::new();
    broker.ensure_topic(TOPIC);
    broker.ensure_subscription(SUBSCRIPTION, TOPIC).unwrap();
    broker
}

fn message(payload: &str, severity: &str) -> WireMessage {
    WireMessage {
        service_name: "Admin".to_string(),
        payload: payload.to_string(),
        severity: severity.to_string(),
        timestamp: Utc::now(),
    }
}

fn config(duration_secs: u64, batch_size: usize, flush_interval_secs: u64) -> MonitorConfig {
    MonitorConfig {
        duration: Duration::from_secs(duration_secs),
        batch_size,
        flush_interval: Duration::from_secs(flush_interval_secs),
    }
}

async fn run(broker: &MemoryBroker, store: Arc<LogStore>, config: MonitorConfig) -> MonitorReport {
    let monitor = Monitor::new(store, config);
    let subscription = broker.subscribe(SUBSCRIPTION).unwrap();
    monitor.run(subscription).await.unwrap()
}

#[tokio::test(start_paused = true)]
async fn receives_and_stores_a_single_message() {
    let broker = provisioned();
    broker.publish(TOPIC, &message("Hello world", "info")).unwrap();

    let store = Arc::new(LogStore::new("service"));
    let report = run(&broker, store.clone(), config(3, 0, 0)).await;

    assert_eq!(report.received, 1);
    assert_eq!(report.stored, 1);
    assert_eq!(store.count(), 1);
    assert_eq!(broker.unacked(SUBSCRIPTION), 0);
}

#[tokio::test(start_paused = true)]
async fn partial_batch_is_flushed_at_the_end_of_the_run() {
    let broker = provisioned();
    broker.publish(TOPIC, &message("Hello world", "info")).unwrap();

    // One message, batch size three: nothing flushes mid-run.
    let store = Arc::new(LogStore::new("service"));
    let report = run(&broker, store.clone(), config(3, 3, 2)).await;

    assert_eq!(report.received, 1);
    assert_eq!(store.count(), 1);
    assert_eq!(broker.unacked(SUBSCRIPTION), 0);
}

#[tokio::test(start_paused = true)]
async fn five_messages_with_batch_size_two_all_arrive() {
    let broker = provisioned();
    for n in 1..=5 {
        broker
            .publish(TOPIC, &message(&format!("Hello world {n}"), "info"))
            .unwrap();
    }

    // Ticks at 2s and 4s flush a full batch each; the trailing single
    // message goes with the terminal drain at 5s.
    let store = Arc::new(LogStore::new("service"));
    let report = run(&broker, store.clone(), config(5, 2, 2)).await;

    assert_eq!(report.received, 5);
    assert_eq!(store.count(), 5);
    assert_eq!(broker.unacked(SUBSCRIPTION), 0);

    let payloads: Vec<String> = store.entries().into_iter().map(|e| e.payload).collect();
    assert_eq!(
        payloads,
        [
            "Hello world 1",
            "Hello world 2",
            "Hello world 3",
            "Hello world 4",
            "Hello world 5"
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn disabled_batching_stores_synchronously() {
    let broker = provisioned();
    for n in 1..=3 {
        broker
            .publish(TOPIC, &message(&format!("Hello world {n}"), "info"))
            .unwrap();
    }

    // Run the monitor in the background and observe the store while the
    // clock is still frozen: entries appear without any flush tick.
    let store = Arc::new(LogStore::new("service"));
    let run_store = store.clone();
    let subscription = broker.subscribe(SUBSCRIPTION).unwrap();
    let handle = tokio::spawn(async move {
        Monitor::new(run_store, config(3, 0, 0))
            .run(subscription)
            .await
            .unwrap()
    });
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
    assert_eq!(store.count(), 3);

    let report = handle.await.unwrap();
    assert_eq!(report.received, 3);
    assert_eq!(broker.unacked(SUBSCRIPTION), 0);
}

#[tokio::test(start_paused = true)]
async fn bogus_severity_is_received_but_never_stored() {
    let broker = provisioned();
    broker.publish(TOPIC, &message("fine", "warn")).unwrap();
    broker.publish(TOPIC, &message("broken", "bogus")).unwrap();

    let store = Arc::new(LogStore::new("service"));
    let report = run(&broker, store.clone(), config(3, 2, 2)).await;

    assert_eq!(report.received, 2);
    assert_eq!(store.count(), 1);
    assert_eq!(store.entries()[0].payload, "fine");
    assert_eq!(broker.unacked(SUBSCRIPTION), 0);
}

#[tokio::test(start_paused = true)]
async fn malformed_payload_is_acked_counted_and_dropped() {
    let broker = provisioned();
    broker
        .publish_raw(TOPIC, Bytes::from_static(b"not json"))
        .unwrap();
    broker.publish(TOPIC, &message("fine", "error")).unwrap();

    let store = Arc::new(LogStore::new("service"));
    let report = run(&broker, store.clone(), config(3, 0, 0)).await;

    assert_eq!(report.received, 2);
    assert_eq!(report.decode_failures, 1);
    assert_eq!(store.count(), 1);
    assert_eq!(broker.unacked(SUBSCRIPTION), 0);
}

#[tokio::test(start_paused = true)]
async fn nothing_is_lost_and_nothing_is_stored_twice() {
    let broker = provisioned();
    let mut published = HashSet::new();
    for n in 1..=10 {
        let payload = format!("payload {n}");
        broker.publish(TOPIC, &message(&payload, "debug")).unwrap();
        published.insert(payload);
    }

    let store = Arc::new(LogStore::new("service"));
    let report = run(&broker, store.clone(), config(5, 3, 1)).await;

    assert_eq!(report.received, 10);
    assert_eq!(store.count(), 10);
    let stored: HashSet<String> = store.entries().into_iter().map(|e| e.payload).collect();
    assert_eq!(stored, published);
    assert_eq!(broker.unacked(SUBSCRIPTION), 0);
}
