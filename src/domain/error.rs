use super::message::DecodeError;
use super::severity::InvalidSeverity;
use crate::monitor::queue::QueueError;
use crate::transport::TransportError;
use thiserror::Error;

/// Top-level error type for a monitoring run.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("severity error: {0}")]
    Severity(#[from] InvalidSeverity),

    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("shutdown error: {0}")]
    Shutdown(String),
}
