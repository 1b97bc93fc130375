//! Log capture module - keeps recent log lines for the control panel.
//!
//! A custom `log::Log` that records every message into a bounded buffer and,
//! unless the panel owns the terminal, also prints it to the console.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use heapless::Deque;
use log::{Level, LevelFilter, Log, Metadata, Record};

/// Maximum number of log lines kept for the panel.
pub const LOG_BUFFER_CAPACITY: usize = 100;

#[derive(Clone, Debug)]
pub struct LogLine {
    pub level: Level,
    pub target: String,
    pub message: String,
}

/// Global log buffer for capturing log messages.
static LOG_BUFFER: Mutex<Deque<LogLine, LOG_BUFFER_CAPACITY>> = Mutex::new(Deque::new());

/// Whether captured lines are also printed.
static ECHO: AtomicBool = AtomicBool::new(true);

pub struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = LogLine {
            level: record.level(),
            target: record.target().to_string(),
            message: record.args().to_string(),
        };

        if ECHO.load(Ordering::Relaxed) {
            println!("[{}] {}: {}", line.level, line.target, line.message);
        }

        if let Ok(mut buffer) = LOG_BUFFER.lock() {
            if buffer.is_full() {
                buffer.pop_front();
            }
            // room was just made
            let _ = buffer.push_back(line);
        }
    }

    fn flush(&self) {}
}

/// Global logger instance.
static LOGGER: CaptureLogger = CaptureLogger;

/// Initialize the log capture system.
pub fn init(max_level: LevelFilter) {
    match log::set_logger(&LOGGER) {
        Ok(()) => {
            log::set_max_level(max_level);
        }
        Err(_) => {
            // Logger already set
        }
    }
}

/// Stop or resume printing; the terminal belongs to the panel while it runs.
pub fn set_echo(echo: bool) {
    ECHO.store(echo, Ordering::Relaxed);
}

/// The most recent `count` lines, oldest first.
pub fn recent_lines(count: usize) -> Vec<LogLine> {
    LOG_BUFFER
        .lock()
        .map(|buffer| {
            let skip = buffer.len().saturating_sub(count);
            buffer.iter().skip(skip).cloned().collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test only: the buffer is process-wide
    #[test]
    fn test_capture_keeps_recent_lines() {
        init(LevelFilter::Debug);
        set_echo(false);

        log::info!(target: "capture_test", "first");
        log::warn!(target: "capture_test", "second");

        let lines: Vec<_> = recent_lines(LOG_BUFFER_CAPACITY)
            .into_iter()
            .filter(|line| line.target == "capture_test")
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].message, "first");
        assert_eq!(lines[1].level, Level::Warn);

        for i in 0..(LOG_BUFFER_CAPACITY + 5) {
            log::debug!(target: "capture_test", "Message {}", i);
        }

        let lines = recent_lines(LOG_BUFFER_CAPACITY + 50);
        assert_eq!(lines.len(), LOG_BUFFER_CAPACITY);
        let newest = lines.iter().rev().find(|line| line.target == "capture_test");
        assert_eq!(newest.map(|line| line.message.as_str()), Some("Message 104"));
        assert!(!lines.iter().any(|line| line.message == "first"));
        assert_eq!(recent_lines(3).len(), 3);
    }
}
