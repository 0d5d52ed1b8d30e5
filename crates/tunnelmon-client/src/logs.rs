//! Capped FIFO log buffer with non-destructive filtering

use std::collections::VecDeque;

use tunnelmon_api::{LogEntry, LogLevel};

/// Retention cap for the compact dashboard widget
pub const DASHBOARD_CAP: usize = 10;
/// Retention cap for the dedicated logs page
pub const PAGE_CAP: usize = 1000;

/// Ordered buffer of recent log entries with FIFO eviction past a hard cap
#[derive(Debug, Clone)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    cap: usize,
}

impl LogBuffer {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(cap.min(PAGE_CAP)),
            cap,
        }
    }

    /// Append a batch of entries in arrival order, evicting the oldest once
    /// the cap is exceeded
    pub fn ingest<I: IntoIterator<Item = LogEntry>>(&mut self, batch: I) {
        for entry in batch {
            self.entries.push_back(entry);
        }
        while self.entries.len() > self.cap {
            self.entries.pop_front();
        }
    }

    /// All retained entries, oldest first
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Entries matching `level`, or everything when `None`. Filtering never
    /// discards retained entries; it only changes what is yielded.
    pub fn filtered(&self, level: Option<LogLevel>) -> impl Iterator<Item = &LogEntry> {
        self.entries
            .iter()
            .filter(move |e| level.map_or(true, |l| e.level == l))
    }

    /// Full-buffer export, one `[timestamp] [LEVEL] message` line per entry
    pub fn export(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("[{}] [{}] {}", e.timestamp, e.level, e.message))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }
}
