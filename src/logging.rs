//! Structured logging for the edge IP selector
//!
//! This module provides:
//! - Leveled, structured log entries with arbitrary JSON fields
//! - Console, JSON and compact output formats
//! - Session and operation correlation IDs
//! - An optional append-only log file that receives every entry at Info
//!   level and above, independent of what the console shows
//! - A probe-specific logger for outcomes, pool summaries and rankings

use crate::error::{AppError, Result};
use crate::executor::PoolSummary;
use crate::models::{Config, ProbeOutcome};
use crate::ranking::RankedResult;
use crate::types::ProbeFailure;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    /// Trace level - most detailed
    Trace = 0,
    /// Debug level - per-probe detail
    Debug = 1,
    /// Info level - run progress and results
    Info = 2,
    /// Warning level - degraded but continuing
    Warn = 3,
    /// Error level - the run cannot produce a result
    Error = 4,
}

impl LogLevel {
    /// Get log level name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// Get ANSI color code for console output
    pub fn color_code(&self) -> &'static str {
        match self {
            LogLevel::Trace => "\x1b[37m",    // White
            LogLevel::Debug => "\x1b[36m",    // Cyan
            LogLevel::Info => "\x1b[32m",     // Green
            LogLevel::Warn => "\x1b[33m",     // Yellow
            LogLevel::Error => "\x1b[31m",    // Red
        }
    }

    /// Reset ANSI color code
    pub fn reset_code() -> &'static str {
        "\x1b[0m"
    }
}

impl std::str::FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            _ => Err(AppError::parse(format!("Invalid log level: {}", s))),
        }
    }
}

/// Log entry structure for structured logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Timestamp when log entry was created
    pub timestamp: DateTime<Utc>,
    /// Log level
    pub level: LogLevel,
    /// Log message
    pub message: String,
    /// Logger name/component
    pub logger: String,
    /// Correlation ID for tracking related events
    pub correlation_id: Option<String>,
    /// Additional structured fields
    pub fields: BTreeMap<String, serde_json::Value>,
    /// File and line information
    pub location: Option<LogLocation>,
}

/// Source code location information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLocation {
    pub file: String,
    pub line: u32,
    pub module: Option<String>,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    /// Human-readable console format
    Console,
    /// JSON format for structured logging
    Json,
    /// Compact single-line format
    Compact,
}

/// Shared logging context for correlation and session tracking
#[derive(Debug, Default)]
struct LogContext {
    session_id: Option<String>,
    current_correlation_id: Option<String>,
    context_fields: BTreeMap<String, serde_json::Value>,
}

/// Append-only log file shared by every logger of a session
#[derive(Clone)]
pub struct LogSink {
    file: Arc<Mutex<File>>,
    min_level: LogLevel,
    failed: Arc<AtomicBool>,
}

impl LogSink {
    /// Open (or create) a log file for appending
    pub fn open(path: &Path, min_level: LogLevel) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| AppError::io(format!("Failed to open log file {}: {}", path.display(), e)))?;

        Ok(Self {
            file: Arc::new(Mutex::new(file)),
            min_level,
            failed: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Whether a write to the log file has failed this session
    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::Relaxed)
    }

    fn write_line(&self, level: LogLevel, line: &str) {
        if level < self.min_level {
            return;
        }
        if let Ok(mut file) = self.file.lock() {
            let result = writeln!(file, "{}", line).and_then(|_| file.flush());
            if let Err(e) = result {
                // Warn once per sink; later failures stay quiet
                if !self.failed.swap(true, Ordering::Relaxed) {
                    eprintln!("Warning: failed to write log file: {}", e);
                }
            }
        }
    }
}

/// Logger implementation with multiple output formats
pub struct Logger {
    min_level: LogLevel,
    use_color: bool,
    include_location: bool,
    format: LogFormat,
    name: String,
    context: Arc<RwLock<LogContext>>,
    sink: Option<LogSink>,
    muted: bool,
}

impl Logger {
    /// Create a new logger
    pub fn new(name: String) -> Self {
        Self {
            min_level: LogLevel::Info,
            use_color: true,
            include_location: false,
            format: LogFormat::Console,
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
            sink: None,
            muted: false,
        }
    }

    /// Create a logger with specific configuration
    pub fn with_config(name: String, config: &Config) -> Self {
        let min_level = if config.debug {
            LogLevel::Debug
        } else if config.verbose {
            LogLevel::Info
        } else {
            LogLevel::Warn
        };

        Self {
            min_level,
            use_color: config.enable_color,
            include_location: config.debug,
            format: if config.debug { LogFormat::Json } else { LogFormat::Console },
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
            sink: None,
            muted: false,
        }
    }

    /// A logger that prints nothing at any level, for library callers that
    /// want no console output. An attached log file still receives entries.
    pub fn silent(name: String) -> Self {
        let mut logger = Self::new(name);
        logger.format = LogFormat::Compact;
        logger.use_color = false;
        logger.muted = true;
        logger
    }

    /// Attach a log file
    pub fn with_sink(mut self, sink: LogSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Set minimum log level
    pub fn set_level(&mut self, level: LogLevel) {
        self.min_level = level;
    }

    /// Set output format
    pub fn set_format(&mut self, format: LogFormat) {
        self.format = format;
    }

    /// Enable or disable colored output
    pub fn set_color(&mut self, use_color: bool) {
        self.use_color = use_color;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set session correlation ID
    pub async fn set_session_id(&self, session_id: String) {
        let mut context = self.context.write().await;
        context.session_id = Some(session_id);
    }

    /// Add context field for all subsequent log entries
    pub async fn add_context_field<T: Serialize>(&self, key: String, value: T) {
        if let Ok(json_value) = serde_json::to_value(value) {
            let mut context = self.context.write().await;
            context.context_fields.insert(key, json_value);
        }
    }

    /// Start a correlated operation
    pub async fn start_operation(&self, operation_name: &str) -> String {
        let correlation_id = Uuid::new_v4().to_string();
        {
            let mut context = self.context.write().await;
            context.current_correlation_id = Some(correlation_id.clone());
        }

        self.info(&format!("Started operation: {}", operation_name))
            .correlation_id(&correlation_id)
            .field("operation", operation_name)
            .field("operation_type", "start")
            .log()
            .await;

        correlation_id
    }

    /// End a correlated operation
    pub async fn end_operation(&self, correlation_id: &str, operation_name: &str, success: bool) {
        self.info(&format!("Completed operation: {} (success: {})", operation_name, success))
            .correlation_id(correlation_id)
            .field("operation", operation_name)
            .field("operation_type", "end")
            .field("success", success)
            .log()
            .await;

        let mut context = self.context.write().await;
        if context.current_correlation_id.as_deref() == Some(correlation_id) {
            context.current_correlation_id = None;
        }
    }

    /// Create a log entry builder
    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Error, message)
    }

    /// Check if a log level would reach the console
    pub fn would_log(&self, level: LogLevel) -> bool {
        !self.muted && level >= self.min_level
    }

    fn wants(&self, level: LogLevel) -> bool {
        self.would_log(level) || self.sink.as_ref().is_some_and(|sink| level >= sink.min_level)
    }

    /// Write log entry to the console and the log file
    async fn write_entry(&self, mut entry: LogEntry) {
        if !self.wants(entry.level) {
            return;
        }

        {
            let context = self.context.read().await;
            if let Some(session_id) = &context.session_id {
                entry.fields.insert("session_id".to_string(), serde_json::Value::String(session_id.clone()));
            }
            if entry.correlation_id.is_none() {
                entry.correlation_id = context.current_correlation_id.clone();
            }
            for (key, value) in &context.context_fields {
                entry.fields.insert(key.clone(), value.clone());
            }
        }

        if let Some(sink) = &self.sink {
            sink.write_line(entry.level, &self.format_console(&entry, false));
        }

        if !self.would_log(entry.level) {
            return;
        }

        let output = match self.format {
            LogFormat::Console => self.format_console(&entry, self.use_color),
            LogFormat::Json => self.format_json(&entry),
            LogFormat::Compact => self.format_compact(&entry),
        };

        // Write to stderr for errors/warnings, stdout for others
        if entry.level >= LogLevel::Warn {
            let _ = writeln!(io::stderr(), "{}", output);
        } else {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }

    /// Format log entry for console output
    fn format_console(&self, entry: &LogEntry, use_color: bool) -> String {
        let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
        let level_str = entry.level.as_str();

        let formatted_level = if use_color {
            format!("{}{:>5}{}", entry.level.color_code(), level_str, LogLevel::reset_code())
        } else {
            format!("{:>5}", level_str)
        };

        let mut output = format!("{} {} [{}] {}", timestamp, formatted_level, entry.logger, entry.message);

        if let Some(correlation_id) = &entry.correlation_id {
            let short = correlation_id.get(..8).unwrap_or(correlation_id);
            output.push_str(&format!(" [{}]", short));
        }

        if !entry.fields.is_empty() {
            let fields_str: Vec<String> = entry.fields.iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            output.push_str(&format!(" {{{}}}", fields_str.join(", ")));
        }

        if self.include_location {
            if let Some(location) = &entry.location {
                output.push_str(&format!(" @ {}:{}", location.file, location.line));
            }
        }

        output
    }

    /// Format log entry as JSON
    fn format_json(&self, entry: &LogEntry) -> String {
        match serde_json::to_string(entry) {
            Ok(json) => json,
            Err(_) => format!("{{\"error\": \"Failed to serialize log entry\", \"message\": {:?}}}", entry.message),
        }
    }

    /// Format log entry in compact format
    fn format_compact(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%H:%M:%S");
        format!("{} {} {}: {}",
            timestamp,
            entry.level.as_str().chars().next().unwrap_or('?'),
            entry.logger,
            entry.message
        )
    }
}

/// Builder pattern for creating log entries
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: logger.name.clone(),
                correlation_id: None,
                fields: BTreeMap::new(),
                location: None,
            },
        }
    }

    /// Add a correlation ID
    pub fn correlation_id(mut self, id: &str) -> Self {
        self.entry.correlation_id = Some(id.to_string());
        self
    }

    /// Add a structured field
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    /// Add location information
    pub fn location(mut self, file: &str, line: u32, module: Option<&str>) -> Self {
        self.entry.location = Some(LogLocation {
            file: file.to_string(),
            line,
            module: module.map(String::from),
        });
        self
    }

    /// Add probe failure information
    pub fn failure(self, failure: &ProbeFailure) -> Self {
        self.field("stage", failure.stage.as_str())
            .field("reason", failure.reason.to_string())
    }

    /// Finalize and write the log entry
    pub async fn log(self) {
        self.logger.write_entry(self.entry).await;
    }
}

/// Specialized logger for probe outcomes and run results
pub struct ProbeLogger {
    logger: Logger,
}

impl ProbeLogger {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    /// Access the underlying logger
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Log a single probe outcome
    pub async fn log_outcome(&self, outcome: &ProbeOutcome) {
        match (outcome.latency_millis(), outcome.failure()) {
            (Some(latency), _) => {
                self.logger.debug(&format!("IP: {}, latency: {:.2}ms", outcome.address(), latency))
                    .field("ip", outcome.address())
                    .field("latency_ms", latency)
                    .field("available", true)
                    .log()
                    .await;
            }
            (None, Some(failure)) => {
                self.logger.debug(&format!("IP: {}, probe failed: {}", outcome.address(), failure))
                    .field("ip", outcome.address())
                    .field("available", false)
                    .failure(failure)
                    .log()
                    .await;
            }
            (None, None) => {
                self.logger.debug(&format!("IP: {}, unavailable", outcome.address()))
                    .field("ip", outcome.address())
                    .field("available", false)
                    .log()
                    .await;
            }
        }
    }

    /// Log the aggregate result of a pool run
    pub async fn log_pool_summary(&self, summary: &PoolSummary) {
        let failures: BTreeMap<&str, usize> = summary.failures_by_stage
            .iter()
            .map(|(stage, count)| (stage.as_str(), *count))
            .collect();

        self.logger.info(&format!(
            "Probed {} addresses in {:.2}s: {} available, {} unavailable",
            summary.total,
            summary.elapsed.as_secs_f64(),
            summary.available,
            summary.unavailable
        ))
            .field("total", summary.total)
            .field("available", summary.available)
            .field("unavailable", summary.unavailable)
            .field("timed_out", summary.timed_out)
            .field("workers", summary.workers)
            .field("elapsed_seconds", summary.elapsed.as_secs_f64())
            .field("failures_by_stage", failures)
            .log()
            .await;
    }

    /// Log the ranked addresses, best first
    pub async fn log_ranking(&self, ranked: &RankedResult) {
        if ranked.is_empty() {
            self.logger.warn("No available address found").log().await;
            return;
        }

        self.logger.info(&format!("Selected the best {} addresses", ranked.len()))
            .field("count", ranked.len())
            .log()
            .await;

        for (position, outcome) in ranked.iter().enumerate() {
            self.logger.info(&format!(
                "{}. IP: {}, latency: {:.2}ms",
                position + 1,
                outcome.address(),
                outcome.sort_latency()
            ))
                .field("rank", position + 1)
                .field("ip", outcome.address())
                .field("latency_ms", outcome.sort_latency())
                .log()
                .await;
        }
    }
}

/// Creates loggers that share one session id and one log file
pub struct LoggerFactory {
    config: Config,
    session_id: String,
    sink: Option<LogSink>,
}

impl LoggerFactory {
    /// Create a new logger factory, opening the configured log file
    pub fn new(config: Config) -> Result<Self> {
        let sink = match &config.log_file {
            Some(path) => {
                let level = if config.debug { LogLevel::Debug } else { LogLevel::Info };
                Some(LogSink::open(Path::new(path), level)?)
            }
            None => None,
        };

        Ok(Self {
            config,
            session_id: Uuid::new_v4().to_string(),
            sink,
        })
    }

    /// Create a logger with a specific name
    pub async fn create_logger(&self, name: &str) -> Logger {
        let mut logger = Logger::with_config(name.to_string(), &self.config);
        if let Some(sink) = &self.sink {
            logger = logger.with_sink(sink.clone());
        }
        logger.set_session_id(self.session_id.clone()).await;
        logger
    }

    /// Create a probe logger
    pub async fn create_probe_logger(&self) -> ProbeLogger {
        ProbeLogger::new(self.create_logger("PROBE").await)
    }

    /// Get session ID
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// Convenience macros for logging with location information
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(&format!($($arg)*))
            .location(file!(), line!(), Some(module_path!()))
            .log()
            .await
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.info(&format!($($arg)*))
            .location(file!(), line!(), Some(module_path!()))
            .log()
            .await
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        $logger.warn(&format!($($arg)*))
            .location(file!(), line!(), Some(module_path!()))
            .log()
            .await
    };
}
