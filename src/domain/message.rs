use super::severity::{InvalidSeverity, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Malformed wire payload. The delivery is still acknowledged; the message
/// is counted and dropped from further processing.
#[derive(Error, Debug)]
#[error("malformed wire payload: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

/// A log message as published on the wire.
///
/// The severity travels as its string token; it is parsed into [`Severity`]
/// only when the message is accepted into the store, so one bad token never
/// poisons a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    pub service_name: String,
    pub payload: String,
    pub severity: String,
    pub timestamp: DateTime<Utc>,
}

impl WireMessage {
    pub fn from_bytes(data: &[u8]) -> Result<Self, DecodeError> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Parse the severity token and produce a record ready for insertion.
    pub fn to_record(&self) -> Result<LogRecord, InvalidSeverity> {
        Ok(LogRecord {
            service_name: self.service_name.clone(),
            payload: self.payload.clone(),
            severity: self.severity.parse()?,
            timestamp: self.timestamp,
        })
    }
}

/// A decoded message whose severity has been parsed, not yet stored.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub service_name: String,
    pub payload: String,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
}

/// A stored entry. `timestamp` is the message-origin time; `created_at` is
/// stamped by the store at insertion and by no one else. Entries are never
/// mutated once stored.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub service_name: String,
    pub payload: String,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
