use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Severity of a monitored log message, ordered from least to most severe.
///
/// This is distinct from `TracingLevel` (used for configuring this binary's
/// own logging). `Severity` is the semantic level carried inside the wire
/// messages the monitor ingests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    #[serde(rename = "warn")]
    Warning,
    Error,
    Fatal,
}

/// Unrecognized severity token. The codec never substitutes a default;
/// callers decide whether to skip or fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid severity token: {0:?}")]
pub struct InvalidSeverity(pub String);

impl Severity {
    /// All levels in ascending order.
    pub const ALL: [Severity; 5] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Fatal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warning => "warn",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = InvalidSeverity;

    /// Exact, case-sensitive match against the five known tokens.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            "fatal" => Ok(Severity::Fatal),
            other => Err(InvalidSeverity(other.to_string())),
        }
    }
}
