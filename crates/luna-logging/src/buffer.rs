//! Ring buffer of recent log lines.
//!
//! `LogBuffer` is a cheap cloneable handle; components that want to record
//! diagnostics take one at construction. `BufferLogger` plugs the same buffer
//! into the `log` facade so `log::info!` and friends land in it too.

use chrono::{SecondsFormat, Utc};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Number of entries kept when no capacity is configured
pub const DEFAULT_LOG_CAPACITY: usize = 100;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("logging already initialized; refusing to install a second logger")]
    AlreadyInitialized,
    #[error("unsupported log level `{0}`; expected trace|debug|info|warn|error|off")]
    InvalidLevel(String),
}

/// Bounded, shared buffer holding the most recent formatted log entries
#[derive(Debug, Clone)]
pub struct LogBuffer {
    entries: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Format and append one entry, evicting the oldest when full.
    pub fn push(&self, level: Level, message: &str) {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        self.push_line(format!("[{}] [{}] {}", timestamp, level, message));
    }

    /// Append an already formatted line.
    pub fn push_line(&self, line: String) {
        let mut entries = self.lock();
        entries.push_back(line);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    /// Snapshot of the buffered entries, oldest first
    pub fn entries(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }

    /// Remove and return every buffered entry
    pub fn drain(&self) -> Vec<String> {
        self.lock().drain(..).collect()
    }

    /// Put previously drained entries back in front of anything logged since.
    ///
    /// The newest entries win when the combined total exceeds capacity.
    pub fn restore(&self, drained: Vec<String>) {
        let mut entries = self.lock();
        for line in drained.into_iter().rev() {
            entries.push_front(line);
        }
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

/// `log::Log` implementation that records into a `LogBuffer`
pub struct BufferLogger {
    buffer: LogBuffer,
    level: LevelFilter,
    echo: bool,
}

impl BufferLogger {
    pub fn new(buffer: LogBuffer, level: LevelFilter) -> Self {
        Self {
            buffer,
            level,
            echo: true,
        }
    }

    /// Disable mirroring entries to stderr
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }
}

impl Log for BufferLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = record.args().to_string();
        if self.echo {
            eprintln!("[{}] {}: {}", record.level(), record.target(), message);
        }
        self.buffer.push(record.level(), &message);
    }

    fn flush(&self) {}
}

/// Install a `BufferLogger` as the process logger.
///
/// The logger can only be installed once; later calls fail with
/// `LoggingError::AlreadyInitialized` and leave the first logger in place.
pub fn init_logging(buffer: LogBuffer, level: &str) -> Result<(), LoggingError> {
    let filter = parse_level(level)?;
    log::set_boxed_logger(Box::new(BufferLogger::new(buffer, filter)))
        .map_err(|_| LoggingError::AlreadyInitialized)?;
    log::set_max_level(filter);
    Ok(())
}

fn parse_level(level: &str) -> Result<LevelFilter, LoggingError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "warning" => Ok(LevelFilter::Warn),
        other => other
            .parse::<LevelFilter>()
            .map_err(|_| LoggingError::InvalidLevel(level.to_string())),
    }
}
