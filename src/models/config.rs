//! Configuration data model and validation

use crate::types::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Budget for one probe, covering connect and verification
    #[serde(default = "default_timeout_secs")]
    pub timeout_seconds: u64,

    /// Width of the probe worker pool
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Number of addresses kept in the ranked result
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Random addresses sampled from each published range
    #[serde(default = "default_samples_per_range")]
    pub samples_per_range: usize,

    /// Document listing the provider's IPv4 ranges, one CIDR per line
    #[serde(default = "default_ranges_url")]
    pub ranges_url: String,

    /// Host name presented in SNI and the Host header of the trace request
    #[serde(default = "default_trace_host")]
    pub trace_host: String,

    /// Where the ranked result is saved
    #[serde(default = "default_output_file")]
    pub output_file: String,

    /// Optional ceiling on the whole probing run
    #[serde(default)]
    pub run_deadline_seconds: Option<u64>,

    /// Optional file that receives a copy of every log line
    #[serde(default)]
    pub log_file: Option<String>,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_secs(),
            max_concurrency: default_max_concurrency(),
            top_n: default_top_n(),
            samples_per_range: default_samples_per_range(),
            ranges_url: default_ranges_url(),
            trace_host: default_trace_host(),
            output_file: default_output_file(),
            run_deadline_seconds: None,
            log_file: None,
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get per-probe timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Get the run-level deadline, if one is configured
    pub fn run_deadline(&self) -> Option<Duration> {
        self.run_deadline_seconds.map(Duration::from_secs)
    }

    /// Validate the configuration and return the first problem found
    pub fn validate(&self) -> Result<()> {
        if self.timeout_seconds == 0 {
            return Err(AppError::config("Timeout must be greater than 0"));
        }

        if self.timeout_seconds > 300 {
            return Err(AppError::config("Timeout cannot exceed 300 seconds"));
        }

        if self.max_concurrency == 0 {
            return Err(AppError::config("Concurrency must be greater than 0"));
        }

        if self.max_concurrency > 1000 {
            return Err(AppError::config("Concurrency cannot exceed 1000"));
        }

        if self.top_n == 0 || self.top_n > 1000 {
            return Err(AppError::config(format!("Top count must be between 1 and 1000, got: {}", self.top_n)));
        }

        if self.samples_per_range == 0 || self.samples_per_range > 256 {
            return Err(AppError::config(format!(
                "Samples per range must be between 1 and 256, got: {}",
                self.samples_per_range
            )));
        }

        match url::Url::parse(&self.ranges_url) {
            Ok(parsed) if parsed.scheme() == "https" => {}
            Ok(parsed) => {
                return Err(AppError::config(format!(
                    "Ranges URL must use https, got scheme '{}'",
                    parsed.scheme()
                )));
            }
            Err(e) => {
                return Err(AppError::config(format!("Invalid ranges URL '{}': {}", self.ranges_url, e)));
            }
        }

        if self.trace_host.trim().is_empty() {
            return Err(AppError::config("Trace host cannot be empty"));
        }

        if self.trace_host.contains('/') || self.trace_host.contains(':') {
            return Err(AppError::config(format!("Trace host must be a bare host name: {}", self.trace_host)));
        }

        if self.output_file.trim().is_empty() {
            return Err(AppError::config("Output file path cannot be empty"));
        }

        if self.run_deadline_seconds == Some(0) {
            return Err(AppError::config("Run deadline must be greater than 0"));
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        self.merge_from_source(|key| std::env::var(key).ok())
    }

    /// Merge values from a key lookup, using the environment variable names
    pub fn merge_from_source<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(timeout) = lookup("TIMEOUT_SECONDS") {
            self.timeout_seconds = timeout.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid TIMEOUT_SECONDS value '{}': {}", timeout, e)))?;
        }

        if let Some(concurrency) = lookup("MAX_CONCURRENCY") {
            self.max_concurrency = concurrency.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid MAX_CONCURRENCY value '{}': {}", concurrency, e)))?;
        }

        if let Some(top_n) = lookup("TOP_N") {
            self.top_n = top_n.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid TOP_N value '{}': {}", top_n, e)))?;
        }

        if let Some(samples) = lookup("SAMPLES_PER_RANGE") {
            self.samples_per_range = samples.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid SAMPLES_PER_RANGE value '{}': {}", samples, e)))?;
        }

        if let Some(ranges_url) = non_empty(lookup("RANGES_URL")) {
            self.ranges_url = ranges_url;
        }

        if let Some(trace_host) = non_empty(lookup("TRACE_HOST")) {
            self.trace_host = trace_host;
        }

        if let Some(output_file) = non_empty(lookup("OUTPUT_FILE")) {
            self.output_file = output_file;
        }

        if let Some(deadline) = lookup("RUN_DEADLINE_SECONDS") {
            self.run_deadline_seconds = Some(deadline.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid RUN_DEADLINE_SECONDS value '{}': {}", deadline, e)))?);
        }

        if let Some(log_file) = non_empty(lookup("LOG_FILE")) {
            self.log_file = Some(log_file);
        }

        if let Some(enable_color) = lookup("ENABLE_COLOR") {
            self.enable_color = enable_color.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", enable_color, e)))?;
        }

        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// Default value functions for serde
fn default_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_TIMEOUT.as_secs()
}

fn default_max_concurrency() -> usize {
    crate::defaults::DEFAULT_MAX_CONCURRENCY
}

fn default_top_n() -> usize {
    crate::defaults::DEFAULT_TOP_N
}

fn default_samples_per_range() -> usize {
    crate::defaults::DEFAULT_SAMPLES_PER_RANGE
}

fn default_ranges_url() -> String {
    crate::defaults::DEFAULT_RANGES_URL.to_string()
}

fn default_trace_host() -> String {
    crate::defaults::DEFAULT_TRACE_HOST.to_string()
}

fn default_output_file() -> String {
    crate::defaults::DEFAULT_OUTPUT_FILE.to_string()
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}
