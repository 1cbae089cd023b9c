//! Application wiring: CLI dispatch, broker provisioning, run reporting.

pub mod config;
pub mod logging;

pub use config::{Cli, Command, Config, ConfigError, TracingLevel};
pub use logging::setup_logging;

use crate::monitor::Monitor;
use crate::publish;
use crate::store::LogStore;
use crate::transport::MemoryBroker;
use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};

const TOPIC: &str = "log-topic";
const SUBSCRIPTION: &str = "log-sub";

/// Entry point used by the binary.
pub async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run(cli).await
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    setup_logging(cli.config.log_level);
    cli.config.validate()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        duration_secs = cli.config.duration_secs,
        batch_size = cli.config.batch_size,
        flush_interval_secs = cli.config.flush_interval_secs,
        "starting log-monitor"
    );

    let broker = MemoryBroker::new();
    broker.ensure_topic(TOPIC);
    broker
        .ensure_subscription(SUBSCRIPTION, TOPIC)
        .context("provisioning subscription")?;

    let store = Arc::new(LogStore::new("service"));
    let monitor = Monitor::new(store.clone(), cli.config.monitor_config());

    match cli.command {
        Command::Mock { count } => {
            publish::publish_count(&broker, TOPIC, count).context("publishing test messages")?;
            let subscription = broker.subscribe(SUBSCRIPTION)?;
            let report = monitor.run(subscription).await?;
            print_report(&store, report.received);
        }
        Command::Sim => {
            let duration = cli.config.monitor_config().duration;
            let sim_broker = broker.clone();
            let simulator =
                tokio::spawn(async move { publish::simulate(&sim_broker, TOPIC, duration).await });

            let subscription = broker.subscribe(SUBSCRIPTION)?;
            let report = monitor.run(subscription).await?;

            match simulator.await {
                Ok(Ok(sent)) => info!(sent, "simulator done"),
                Ok(Err(err)) => warn!(error = %err, "simulator failed"),
                Err(err) => warn!(error = %err, "simulator task failed"),
            }
            print_report(&store, report.received);
        }
    }

    Ok(())
}

fn print_report(store: &LogStore, received: u64) {
    println!("Service Log:");
    print!("{}", store.render_csv());
    println!("{} record(s), {received} received", store.count());
}
