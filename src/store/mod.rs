//! Append-only, in-memory store for parsed log entries.

use crate::domain::{LogEntry, LogRecord, WireMessage};
use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, warn};

/// Counts for one `append_from_wire` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppendOutcome {
    pub stored: usize,
    pub rejected: usize,
}

/// The log store. Entries only accumulate during a run; nothing is mutated
/// or removed once appended. The interior mutex serializes appends, so the
/// direct (unbatched) ingest path may store from concurrent contexts.
pub struct LogStore {
    name: String,
    logs: Mutex<Vec<LogEntry>>,
}

impl LogStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            logs: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record one entry, stamping `created_at` with the insertion time.
    pub fn append(&self, record: LogRecord) {
        let entry = LogEntry {
            service_name: record.service_name,
            payload: record.payload,
            severity: record.severity,
            timestamp: record.timestamp,
            created_at: Utc::now(),
        };
        debug!(service = %entry.service_name, severity = %entry.severity, "storing entry");
        self.logs.lock().push(entry);
    }

    /// Append a batch of wire messages. An unparseable severity rejects that
    /// entry alone; the rest of the batch is still stored.
    pub fn append_from_wire(&self, messages: &[WireMessage]) -> AppendOutcome {
        let mut outcome = AppendOutcome::default();
        for message in messages {
            match message.to_record() {
                Ok(record) => {
                    self.append(record);
                    outcome.stored += 1;
                }
                Err(err) => {
                    warn!(
                        service = %message.service_name,
                        error = %err,
                        "skipping entry with unparseable severity"
                    );
                    outcome.rejected += 1;
                }
            }
        }
        outcome
    }

    pub fn count(&self) -> usize {
        self.logs.lock().len()
    }

    /// Snapshot of all entries in insertion order. Later appends do not
    /// show up in a snapshot already handed out.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.logs.lock().clone()
    }

    /// CSV projection of the store, insertion order, all fields quoted.
    pub fn render_csv(&self) -> String {
        let logs = self.logs.lock();
        let mut out = String::with_capacity(64 * (logs.len() + 1));
        out.push_str("\"service_name\",\"payload\",\"severity\",\"timestamp\",\"created_at\"");
        for entry in logs.iter() {
            out.push('\n');
            push_field(&mut out, &entry.service_name);
            out.push(',');
            push_field(&mut out, &entry.payload);
            out.push(',');
            push_field(&mut out, entry.severity.as_str());
            out.push(',');
            push_field(&mut out, &entry.timestamp.to_rfc3339());
            out.push(',');
            push_field(&mut out, &entry.created_at.to_rfc3339());
        }
        out.push('\n');
        out
    }
}

fn push_field(out: &mut String, value: &str) {
    out.push('"');
    for ch in value.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Severity;
    use chrono::Utc;

    fn record(service: &str, payload: &str, severity: Severity) -> LogRecord {
        LogRecord {
            service_name: service.to_string(),
            payload: payload.to_string(),
            severity,
            timestamp: Utc::now(),
        }
    }

    fn wire(severity: &str) -> WireMessage {
        WireMessage {
            service_name: "alpha".to_string(),
            payload: "Hello world".to_string(),
            severity: severity.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn appends_in_insertion_order() {
        let store = LogStore::new("test");
        store.append(record("alpha", "Hello world", Severity::Info));
        store.append(record("beta", "Goodbye", Severity::Debug));

        let entries = store.entries();
        assert_eq!(store.count(), 2);
        assert_eq!(entries[0].service_name, "alpha");
        assert_eq!(entries[0].severity, Severity::Info);
        assert_eq!(entries[1].service_name, "beta");
    }

    #[test]
    fn stamps_created_at_on_insertion() {
        let store = LogStore::new("test");
        let before = Utc::now();
        store.append(record("alpha", "Hello world", Severity::Warning));
        let entries = store.entries();
        assert!(entries[0].created_at >= before);
    }

    #[test]
    fn bad_severity_rejects_only_that_entry() {
        let store = LogStore::new("test");
        let outcome = store.append_from_wire(&[wire("info"), wire("bogus"), wire("error")]);
        assert_eq!(outcome, AppendOutcome { stored: 2, rejected: 1 });
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn snapshots_do_not_see_later_appends() {
        let store = LogStore::new("test");
        store.append(record("alpha", "one", Severity::Info));
        let snapshot = store.entries();
        store.append(record("alpha", "two", Severity::Info));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn renders_quoted_csv() {
        let store = LogStore::new("test");
        store.append(record("alpha", "said \"hi\"", Severity::Fatal));

        let csv = store.render_csv();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "\"service_name\",\"payload\",\"severity\",\"timestamp\",\"created_at\""
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("\"alpha\",\"said \"\"hi\"\"\",\"fatal\","));
        assert_eq!(lines.next(), None);
    }
}
