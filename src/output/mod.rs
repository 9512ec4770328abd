//! Output formatting and display system
//!
//! This module renders run summaries and ranked results for the console,
//! with either colored or plain text output.

mod formatter;
mod colored;

pub use self::formatter::{FormattingOptions, OutputFormatter, PlainFormatter};
pub use self::colored::{ColorScheme, ColoredFormatter};

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Create a formatter based on color support and preferences
    pub fn create_formatter(enable_color: bool, verbose: bool) -> Box<dyn OutputFormatter> {
        let options = FormattingOptions {
            enable_color,
            verbose_mode: verbose,
        };

        if enable_color {
            Box::new(ColoredFormatter::new(options))
        } else {
            Box::new(PlainFormatter::new(options))
        }
    }

    /// Create a formatter from the effective configuration
    pub fn from_config(config: &crate::models::Config) -> Box<dyn OutputFormatter> {
        Self::create_formatter(config.enable_color, config.verbose || config.debug)
    }

    /// Create a plain text formatter for scripts/logs
    pub fn create_plain_formatter() -> Box<dyn OutputFormatter> {
        Self::create_formatter(false, true)
    }
}
