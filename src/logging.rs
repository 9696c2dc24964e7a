//! Logging for the polling loop.
//!
//! No global logger: the loop owns one explicitly constructed [`LogSink`].
//! Records always land in an append-only file, and when a log bot is
//! configured they are forwarded to the Telegram chat as well.

use anyhow::{Context, Result};
use chrono::Local;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::telegram::TelegramBot;

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARNING"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Destination for log records. Sinks never fail the caller; a record that
/// cannot be written degrades to stderr.
pub trait LogSink {
    fn record(&mut self, level: LogLevel, message: &str);
}

/// Appends `YYYY-MM-DD HH:MM:SS LEVEL message` lines to a local file.
#[derive(Debug)]
pub struct FileLog {
    file: File,
}

impl FileLog {
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;

        Ok(Self { file })
    }
}

impl LogSink for FileLog {
    fn record(&mut self, level: LogLevel, message: &str) {
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        if let Err(err) = writeln!(self.file, "{stamp} {level} {message}") {
            eprintln!("log file write failed: {err}");
        }
    }
}

/// Forwards records to a Telegram chat through a dedicated log bot.
pub struct TelegramLog {
    bot: TelegramBot,
    chat_id: String,
}

impl TelegramLog {
    pub fn new(bot: TelegramBot, chat_id: impl Into<String>) -> Self {
        Self {
            bot,
            chat_id: chat_id.into(),
        }
    }
}

impl LogSink for TelegramLog {
    fn record(&mut self, level: LogLevel, message: &str) {
        // Best effort only; a failed forward must not feed back into the
        // log pipeline.
        let text = format!("{level}: {message}");
        if let Err(err) = self.bot.send_message(&self.chat_id, &text) {
            eprintln!("log forwarding to Telegram failed: {err:#}");
        }
    }
}

/// Fans every record out to all contained sinks.
pub struct Fanout {
    sinks: Vec<Box<dyn LogSink>>,
}

impl Fanout {
    pub fn new(sinks: Vec<Box<dyn LogSink>>) -> Self {
        Self { sinks }
    }
}

impl LogSink for Fanout {
    fn record(&mut self, level: LogLevel, message: &str) {
        for sink in &mut self.sinks {
            sink.record(level, message);
        }
    }
}
