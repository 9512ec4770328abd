//! Colored formatter implementation with terminal color support

use crate::{
    error::{AppError, Result},
    executor::PoolSummary,
    ranking::RankedResult,
    types::LatencyLevel,
};
use super::formatter::{
    failure_breakdown, format_elapsed, format_latency, format_percentage, FormattingOptions, OutputFormatter,
};
use colored::*;
use std::fmt::Write as _;

impl LatencyLevel {
    /// Get color for this latency level
    pub fn color(&self) -> Color {
        match self {
            Self::Fast => Color::Green,
            Self::Moderate => Color::Yellow,
            Self::Slow => Color::Red,
        }
    }
}

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub muted: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            info: Color::Cyan,
            muted: Color::BrightBlack,
        }
    }
}

/// Colored formatter implementation
pub struct ColoredFormatter {
    options: FormattingOptions,
    color_scheme: ColorScheme,
}

impl ColoredFormatter {
    /// Create a new colored formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self {
            options,
            color_scheme: ColorScheme::default(),
        }
    }

    /// Create a colored formatter with custom color scheme
    pub fn with_color_scheme(options: FormattingOptions, color_scheme: ColorScheme) -> Self {
        Self { options, color_scheme }
    }

    /// Apply color to text if colors are enabled
    fn colorize(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.color(color)
        } else {
            text.normal()
        }
    }

    /// Apply bold formatting if colors are enabled
    fn bold(&self, text: &str) -> ColoredString {
        if self.options.enable_color {
            text.bold()
        } else {
            text.normal()
        }
    }

    /// Bold and colored if colors are enabled
    fn emphasize(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.color(color).bold()
        } else {
            text.normal()
        }
    }

    fn latency_colored(&self, latency_ms: f64) -> ColoredString {
        self.colorize(&format_latency(latency_ms), LatencyLevel::from_millis(latency_ms).color())
    }

    fn rate_colored(&self, percentage: f64) -> ColoredString {
        let color = if percentage >= 50.0 {
            self.color_scheme.success
        } else if percentage >= 10.0 {
            self.color_scheme.warning
        } else {
            self.color_scheme.error
        };
        self.colorize(&format_percentage(percentage), color)
    }
}

fn fmt_err(e: std::fmt::Error) -> AppError {
    AppError::io(format!("Failed to format output: {}", e))
}

impl OutputFormatter for ColoredFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let border = "═".repeat(title.chars().count() + 4);
        let mut output = String::new();

        writeln!(output, "{}", self.colorize(&border, self.color_scheme.header)).map_err(fmt_err)?;
        writeln!(output, "  {}  ", self.emphasize(title, self.color_scheme.header)).map_err(fmt_err)?;
        write!(output, "{}", self.colorize(&border, self.color_scheme.header)).map_err(fmt_err)?;

        Ok(output)
    }

    fn format_run_summary(&self, summary: &PoolSummary) -> Result<String> {
        let mut output = String::new();

        writeln!(output, "{}", self.bold("Run Summary")).map_err(fmt_err)?;
        writeln!(
            output,
            "  Probed       {} addresses {}",
            self.bold(&summary.total.to_string()),
            self.colorize(
                &format!("({} workers, {})", summary.workers, format_elapsed(summary.elapsed)),
                self.color_scheme.muted
            )
        )
        .map_err(fmt_err)?;
        writeln!(
            output,
            "  Available    {} ({})",
            self.colorize(&summary.available.to_string(), self.color_scheme.success),
            self.rate_colored(summary.availability_rate())
        )
        .map_err(fmt_err)?;
        write!(
            output,
            "  Unavailable  {} ({} timed out)",
            self.colorize(&summary.unavailable.to_string(), self.color_scheme.error),
            summary.timed_out
        )
        .map_err(fmt_err)?;

        if self.options.verbose_mode {
            if let Some(breakdown) = failure_breakdown(summary) {
                write!(output, "\n  Failures     {}", self.colorize(&breakdown, self.color_scheme.muted))
                    .map_err(fmt_err)?;
            }
        }

        Ok(output)
    }

    fn format_ranking(&self, ranked: &RankedResult) -> Result<String> {
        if ranked.is_empty() {
            return Ok(self.colorize("No available IP found.", self.color_scheme.warning).to_string());
        }

        let mut output = String::new();
        writeln!(output, "{}", self.bold(&format!("Best {} IPs:", ranked.len()))).map_err(fmt_err)?;

        for (index, outcome) in ranked.iter().enumerate() {
            if index > 0 {
                output.push('\n');
            }
            write!(
                output,
                "{} {} - {}",
                self.bold(&format!("{}.", index + 1)),
                self.colorize(outcome.address(), self.color_scheme.info),
                self.latency_colored(outcome.sort_latency())
            )
            .map_err(fmt_err)?;
        }

        Ok(output)
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("{} {}", self.emphasize("✗ Error:", self.color_scheme.error), error))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("{} {}", self.emphasize("⚠ Warning:", self.color_scheme.warning), warning))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("{} {}", self.emphasize("✓", self.color_scheme.success), message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProbeOutcome;
    use crate::ranking::rank;

    fn uncolored() -> ColoredFormatter {
        ColoredFormatter::new(FormattingOptions {
            enable_color: false,
            verbose_mode: false,
        })
    }

    #[test]
    fn test_latency_level_colors() {
        assert_eq!(LatencyLevel::Fast.color(), Color::Green);
        assert_eq!(LatencyLevel::Moderate.color(), Color::Yellow);
        assert_eq!(LatencyLevel::Slow.color(), Color::Red);
    }

    #[test]
    fn test_ranking_contains_every_address() {
        let formatter = ColoredFormatter::new(FormattingOptions::default());
        let ranked = rank(
            &[
                ProbeOutcome::available("104.16.1.1", 420.0),
                ProbeOutcome::available("1.0.0.1", 5.0),
            ],
            20,
        );

        let text = formatter.format_ranking(&ranked).unwrap();
        let first = text.find("1.0.0.1").unwrap();
        let second = text.find("104.16.1.1").unwrap();
        assert!(first < second);
        assert!(text.contains("5.00ms"));
        assert!(text.contains("420.00ms"));
    }

    #[test]
    fn test_uncolored_ranking_matches_plain_layout() {
        let ranked = rank(&[ProbeOutcome::available("1.0.0.1", 5.0)], 20);
        let text = uncolored().format_ranking(&ranked).unwrap();
        assert!(text.ends_with("1. 1.0.0.1 - 5.00ms"));
    }

    #[test]
    fn test_empty_ranking_is_warning_text() {
        let text = uncolored().format_ranking(&RankedResult::default()).unwrap();
        assert_eq!(text, "No available IP found.");
    }

    #[test]
    fn test_messages_keep_text() {
        let formatter = uncolored();
        assert!(formatter.format_error("boom").unwrap().ends_with("boom"));
        assert!(formatter.format_warning("careful").unwrap().ends_with("careful"));
        assert!(formatter.format_success("saved").unwrap().ends_with("saved"));
    }
}
