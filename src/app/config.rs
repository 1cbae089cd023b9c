use crate::monitor::MonitorConfig;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Verbosity of this binary's own logging, distinct from the severity of
/// the monitored messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TracingLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<TracingLevel> for tracing::Level {
    fn from(level: TracingLevel) -> Self {
        match level {
            TracingLevel::Error => tracing::Level::ERROR,
            TracingLevel::Warn => tracing::Level::WARN,
            TracingLevel::Info => tracing::Level::INFO,
            TracingLevel::Debug => tracing::Level::DEBUG,
            TracingLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Log monitoring server: subscribes to a pub/sub topic, batches messages, and flushes them to the log store"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub config: Config,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Publish test messages, then run the monitor against them
    Mock {
        /// Number of test messages to publish
        #[arg(default_value = "3")]
        count: usize,
    },
    /// Run the service simulator and the monitor concurrently
    Sim,
}

#[derive(Args, Debug, Clone)]
pub struct Config {
    /// Time (seconds) to run the monitor and simulator
    #[arg(long, env = "DURATION", default_value = "15")]
    pub duration_secs: u64,

    /// Number of messages per batch (0 or 1 disables batching)
    #[arg(long, env = "BATCHSIZE", default_value = "0")]
    pub batch_size: usize,

    /// Interval (seconds) between queue flushes
    #[arg(long, env = "FLUSHINTERVAL", default_value = "2")]
    pub flush_interval_secs: u64,

    /// Log level for the monitor's own output
    #[arg(long, env = "LOG_LEVEL", default_value = "info", value_enum)]
    pub log_level: TracingLevel,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "duration must be nonzero".to_string(),
            ));
        }
        if self.batch_size > 1 && self.flush_interval_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "batching requires a nonzero flush interval".to_string(),
            ));
        }
        Ok(())
    }

    /// The plain values the core consumes.
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            duration: Duration::from_secs(self.duration_secs),
            batch_size: self.batch_size,
            flush_interval: Duration::from_secs(self.flush_interval_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(args)
    }

    #[test]
    fn defaults_match_the_documented_contract() {
        let cli = parse(&["log-monitor", "mock"]);
        assert_eq!(cli.config.duration_secs, 15);
        assert_eq!(cli.config.batch_size, 0);
        assert_eq!(cli.config.flush_interval_secs, 2);
        assert!(cli.config.validate().is_ok());
        assert!(!cli.config.monitor_config().batching_enabled());
    }

    #[test]
    fn batch_size_above_one_enables_batching() {
        let cli = parse(&[
            "log-monitor",
            "--batch-size",
            "3",
            "--flush-interval-secs",
            "2",
            "mock",
        ]);
        assert!(cli.config.validate().is_ok());
        assert!(cli.config.monitor_config().batching_enabled());
    }

    #[test]
    fn batching_without_an_interval_is_rejected() {
        let cli = parse(&[
            "log-monitor",
            "--batch-size",
            "3",
            "--flush-interval-secs",
            "0",
            "mock",
        ]);
        assert!(cli.config.validate().is_err());
    }

    #[test]
    fn mock_count_defaults_to_three() {
        let cli = parse(&["log-monitor", "mock"]);
        match cli.command {
            Command::Mock { count } => assert_eq!(count, 3),
            Command::Sim => panic!("expected mock command"),
        }
    }
}
