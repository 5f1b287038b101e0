use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogLevel {
    Log,
    Warning,
    Error,
    Exception,
}

/// Where the engine writes help listings, echoed results and presenter output.
/// The engine does not care how entries are rendered.
pub trait PresentationSink: Send {
    fn emit(&mut self, text: &str, level: LogLevel);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub text: String,
}

/// Bounded scrollback. The oldest entry is evicted when full.
#[derive(Debug, Clone)]
pub struct MessageLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl MessageLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, level: LogLevel, text: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry {
            level,
            text: text.into(),
        });
    }

    /// Oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl PresentationSink for MessageLog {
    fn emit(&mut self, text: &str, level: LogLevel) {
        self.push(level, text);
    }
}

/// A message log shared between the engine and whatever displays it.
#[derive(Debug, Clone)]
pub struct SharedLog(Arc<Mutex<MessageLog>>);

impl SharedLog {
    pub fn new(capacity: usize) -> Self {
        Self(Arc::new(Mutex::new(MessageLog::new(capacity))))
    }

    /// Copy of the current entries, oldest first.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.0.lock().entries().cloned().collect()
    }

    /// Remove and return every entry.
    pub fn drain(&self) -> Vec<LogEntry> {
        let mut log = self.0.lock();
        let out = log.entries().cloned().collect();
        log.clear();
        out
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }
}

impl PresentationSink for SharedLog {
    fn emit(&mut self, text: &str, level: LogLevel) {
        self.0.lock().push(level, text);
    }
}

/// Forwards output to `tracing`, for hosts without a console view.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl PresentationSink for TracingSink {
    fn emit(&mut self, text: &str, level: LogLevel) {
        match level {
            LogLevel::Log => tracing::info!(target: "console", "{text}"),
            LogLevel::Warning => tracing::warn!(target: "console", "{text}"),
            LogLevel::Error | LogLevel::Exception => tracing::error!(target: "console", "{text}"),
        }
    }
}
