#![deny(warnings, rust_2024_compatibility)]
// Noisy pedantic lints suppressed with justification:
#![allow(
    clippy::missing_errors_doc,      // Internal API
    clippy::missing_panics_doc,      // Internal API
    clippy::module_name_repetitions  // e.g. MonitorError in monitor module
)]

pub mod app;
pub mod domain;
pub mod monitor;
pub mod publish;
pub mod store;
pub mod transport;

// Re-export the main types for easy access
pub use domain::{MonitorError, Severity, WireMessage};
pub use monitor::{Monitor, MonitorConfig, MonitorReport};
pub use store::LogStore;
pub use transport::MemoryBroker;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
