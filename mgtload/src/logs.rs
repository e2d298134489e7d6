//! Run log.
//!
//! Entries are printed as they happen (warnings and errors on stderr, progress
//! on stdout) and copied to every open [`LogCollector`]. A pipeline run opens a
//! collector on entry and stores what it gathered in its report.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast::{self, error::TryRecvError};

/// Entries a collector can fall behind by before the oldest are dropped.
const BACKLOG: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    fn marker(self) -> &'static str {
        match self {
            LogLevel::Info => "  ",
            LogLevel::Success => "✓",
            LogLevel::Warning => "⚠️",
            LogLevel::Error => "❌",
        }
    }

    fn is_problem(self) -> bool {
        matches!(self, LogLevel::Warning | LogLevel::Error)
    }
}

/// One line of the run log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Detail depth, 0 for top-level lines
    #[serde(default)]
    pub depth: u8,
    pub at: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            depth: 0,
            at: Utc::now(),
        }
    }

    pub fn nested(mut self, depth: u8) -> Self {
        self.depth = depth;
        self
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pad = "   ".repeat(self.depth as usize + 1);
        write!(f, "{}{} {}", pad, self.level.marker(), self.message)
    }
}

/// Process-wide run log.
pub static RUN_LOG: Lazy<RunLog> = Lazy::new(|| RunLog::with_backlog(BACKLOG));

/// Prints entries and fans them out to collectors.
pub struct RunLog {
    sender: broadcast::Sender<LogEntry>,
}

impl RunLog {
    pub fn with_backlog(backlog: usize) -> Self {
        let (sender, _) = broadcast::channel(backlog);
        Self { sender }
    }

    pub fn emit(&self, entry: LogEntry) {
        if entry.level.is_problem() {
            eprintln!("{}", entry);
        } else {
            println!("{}", entry);
        }
        // Sending fails only when no collector is open.
        let _ = self.sender.send(entry);
    }

    /// Start gathering every entry emitted from now on.
    pub fn collect(&self) -> LogCollector {
        LogCollector {
            receiver: self.sender.subscribe(),
            dropped: 0,
        }
    }
}

/// Entries gathered since [`RunLog::collect`].
pub struct LogCollector {
    receiver: broadcast::Receiver<LogEntry>,
    dropped: u64,
}

impl LogCollector {
    /// Take the entries gathered so far. Past the backlog the oldest are lost
    /// and counted in [`LogCollector::dropped`].
    pub fn drain(&mut self) -> Vec<LogEntry> {
        let mut entries = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(entry) => entries.push(entry),
                Err(TryRecvError::Lagged(n)) => self.dropped += n,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        entries
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

pub fn log_info(msg: impl Into<String>) {
    RUN_LOG.emit(LogEntry::new(LogLevel::Info, msg));
}

pub fn log_success(msg: impl Into<String>) {
    RUN_LOG.emit(LogEntry::new(LogLevel::Success, msg));
}

pub fn log_warning(msg: impl Into<String>) {
    RUN_LOG.emit(LogEntry::new(LogLevel::Warning, msg));
}

pub fn log_error(msg: impl Into<String>) {
    RUN_LOG.emit(LogEntry::new(LogLevel::Error, msg));
}

pub fn log_info_indent(msg: impl Into<String>, depth: u8) {
    RUN_LOG.emit(LogEntry::new(LogLevel::Info, msg).nested(depth));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_gathers_entries_after_it_opens() {
        let log = RunLog::with_backlog(8);
        log.emit(LogEntry::new(LogLevel::Info, "before"));

        let mut collector = log.collect();
        log.emit(LogEntry::new(LogLevel::Success, "Processed 3 rows.").nested(1));

        let entries = collector.drain();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, LogLevel::Success);
        assert_eq!(entries[0].message, "Processed 3 rows.");
        assert_eq!(entries[0].depth, 1);
        assert!(collector.drain().is_empty());
    }

    #[test]
    fn test_collector_counts_dropped_entries() {
        let log = RunLog::with_backlog(2);
        let mut collector = log.collect();
        for i in 0..5 {
            log.emit(LogEntry::new(LogLevel::Info, format!("line {}", i)));
        }

        let messages: Vec<String> = collector.drain().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["line 3", "line 4"]);
        assert_eq!(collector.dropped(), 3);
    }

    #[test]
    fn test_display_indents_by_depth() {
        let entry = LogEntry::new(LogLevel::Warning, "Export canceled.");
        assert_eq!(entry.to_string(), "   ⚠️ Export canceled.");
        let entry = LogEntry::new(LogLevel::Info, "North.xlsx").nested(1);
        assert_eq!(entry.to_string(), "         North.xlsx");
    }

    #[test]
    fn test_entry_serializes_lowercase_level() {
        let json = serde_json::to_value(LogEntry::new(LogLevel::Error, "boom")).unwrap();
        assert_eq!(json["level"], "error");
        assert_eq!(json["message"], "boom");
        assert!(json["at"].is_string());
    }
}
