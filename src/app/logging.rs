use super::config::TracingLevel;
use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();

/// Initialize the global tracing subscriber. Later calls (tests, repeated
/// app construction) are no-ops; `RUST_LOG` overrides the configured level.
pub fn setup_logging(level: TracingLevel) {
    INIT.call_once(|| {
        let level: tracing::Level = level.into();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level.to_string()));
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).compact())
            .try_init();
    });
}
