//! Domain layer for log-monitor.
//!
//! Contains the canonical types shared across all modules:
//! - `WireMessage` / `LogRecord` / `LogEntry`: the message's forms on the
//!   wire, after decoding, and once stored
//! - `Severity`: the closed severity model (Debug through Fatal)
//! - `MonitorError`: top-level error type

pub mod error;
pub mod message;
pub mod severity;

pub use error::MonitorError;
pub use message::{DecodeError, LogEntry, LogRecord, WireMessage};
pub use severity::{InvalidSeverity, Severity};
