// Logging module - in-memory log ring and request diagnostics
pub mod buffer;
pub mod request_logger;

pub use buffer::{init_logging, BufferLogger, LogBuffer, LoggingError, DEFAULT_LOG_CAPACITY};

pub use request_logger::{log_request, log_response_status, log_stream_line};

/// Safely truncate a string to a maximum number of characters
pub fn safe_truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        // Reserve space for "..." suffix
        let trunc_chars = max_chars.saturating_sub(3);
        format!("{}...", s.chars().take(trunc_chars).collect::<String>())
    }
}
