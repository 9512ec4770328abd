//! Core formatting traits and implementations
//!
//! This module defines the output formatting interface and provides
//! a plain text implementation.

use crate::{
    error::{AppError, Result},
    executor::PoolSummary,
    models::ProbeOutcome,
    ranking::RankedResult,
};
use std::fmt::Write as _;
use std::time::Duration;

/// Main trait for output formatting
pub trait OutputFormatter: Send + Sync {
    /// Format a header section
    fn format_header(&self, title: &str) -> Result<String>;

    /// Format the aggregate result of a probe run
    fn format_run_summary(&self, summary: &PoolSummary) -> Result<String>;

    /// Format the ranked addresses as a numbered list, best first
    fn format_ranking(&self, ranked: &RankedResult) -> Result<String>;

    /// Format error messages
    fn format_error(&self, error: &str) -> Result<String>;

    /// Format warning messages
    fn format_warning(&self, warning: &str) -> Result<String>;

    /// Format success messages
    fn format_success(&self, message: &str) -> Result<String>;
}

/// Configuration options for formatting
#[derive(Debug, Clone)]
pub struct FormattingOptions {
    /// Enable colored output
    pub enable_color: bool,
    /// Include failure breakdowns in summaries
    pub verbose_mode: bool,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            enable_color: true,
            verbose_mode: false,
        }
    }
}

/// Plain text formatter implementation
pub struct PlainFormatter {
    options: FormattingOptions,
}

impl PlainFormatter {
    /// Create a new plain formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self { options }
    }
}

/// `N. <ip> - <latency>ms`, the line layout of the ranked list
pub(crate) fn ranking_line(position: usize, outcome: &ProbeOutcome) -> String {
    format!("{}. {} - {}", position, outcome.address(), format_latency(outcome.sort_latency()))
}

pub(crate) fn format_latency(latency_ms: f64) -> String {
    format!("{:.2}ms", latency_ms)
}

/// Format elapsed time in human-readable format
pub(crate) fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.2}s", secs)
    } else {
        format!("{}m{:.1}s", (secs / 60.0) as u32, secs % 60.0)
    }
}

/// Format percentage with appropriate precision
pub(crate) fn format_percentage(percentage: f64) -> String {
    if percentage >= 99.95 {
        "100.0%".to_string()
    } else if percentage < 0.05 {
        "0.0%".to_string()
    } else {
        format!("{:.1}%", percentage)
    }
}

/// `connect=3, verify=2`, or `None` when nothing failed
pub(crate) fn failure_breakdown(summary: &PoolSummary) -> Option<String> {
    if summary.failures_by_stage.is_empty() {
        return None;
    }
    let parts: Vec<String> = summary.failures_by_stage
        .iter()
        .map(|(stage, count)| format!("{}={}", stage, count))
        .collect();
    Some(parts.join(", "))
}

fn fmt_err(e: std::fmt::Error) -> AppError {
    AppError::io(format!("Failed to format output: {}", e))
}

impl OutputFormatter for PlainFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let mut output = String::new();
        let border = "=".repeat(title.len() + 4);

        writeln!(output, "{}", border).map_err(fmt_err)?;
        writeln!(output, "  {}  ", title).map_err(fmt_err)?;
        write!(output, "{}", border).map_err(fmt_err)?;

        Ok(output)
    }

    fn format_run_summary(&self, summary: &PoolSummary) -> Result<String> {
        let mut output = String::new();

        writeln!(output, "Run Summary:").map_err(fmt_err)?;
        writeln!(output, "------------").map_err(fmt_err)?;
        writeln!(
            output,
            "Probed:       {} addresses ({} workers, {})",
            summary.total,
            summary.workers,
            format_elapsed(summary.elapsed)
        )
        .map_err(fmt_err)?;
        writeln!(
            output,
            "Available:    {} ({})",
            summary.available,
            format_percentage(summary.availability_rate())
        )
        .map_err(fmt_err)?;
        write!(output, "Unavailable:  {} ({} timed out)", summary.unavailable, summary.timed_out).map_err(fmt_err)?;

        if self.options.verbose_mode {
            if let Some(breakdown) = failure_breakdown(summary) {
                write!(output, "\nFailures:     {}", breakdown).map_err(fmt_err)?;
            }
        }

        Ok(output)
    }

    fn format_ranking(&self, ranked: &RankedResult) -> Result<String> {
        if ranked.is_empty() {
            return Ok("No available IP found.".to_string());
        }

        let mut output = String::new();
        writeln!(output, "Best {} IPs:", ranked.len()).map_err(fmt_err)?;
        for (index, outcome) in ranked.iter().enumerate() {
            if index > 0 {
                output.push('\n');
            }
            output.push_str(&ranking_line(index + 1, outcome));
        }

        Ok(output)
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("ERROR: {}", error))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("WARNING: {}", warning))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("SUCCESS: {}", message))
    }
}
