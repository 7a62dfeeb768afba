use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};

/// One recorded failure.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// Where user-visible failures are recorded.
pub trait Telemetry: Send + Sync {
    fn record(&self, message: &str);

    fn entries(&self) -> Vec<LogEntry>;
}

/// An append-only log that lives as long as the process.
#[derive(Debug, Default)]
pub struct SessionLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Telemetry for SessionLog {
    fn record(&self, message: &str) {
        self.lock().push(LogEntry {
            timestamp: Utc::now(),
            message: message.to_string(),
        });
    }

    fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appends_in_order() {
        let log = SessionLog::new();
        log.record("first");
        log.record("second");
        let entries = log.entries();
        let messages: Vec<&str> = entries.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
        assert!(entries[0].timestamp <= entries[1].timestamp);
    }
}
