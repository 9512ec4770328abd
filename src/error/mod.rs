//! Error handling for the edge IP selector
//!
//! Only failures of the surrounding program surface as [`AppError`]: bad
//! configuration, I/O on the result file, and failure to build a candidate
//! list. Individual probe failures are never errors here; they are recorded
//! inside the probe outcome as a [`crate::types::ProbeFailure`].

use thiserror::Error;

/// Custom error types for the edge IP selector
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (flags, environment, .env file)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors (result file, ranges file, log file)
    #[error("I/O error: {0}")]
    Io(String),

    /// Parsing errors (saved result file, serialization)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// The candidate address list could not be built or came back empty
    #[error("Candidate acquisition error: {0}")]
    CandidateAcquisition(String),
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new candidate acquisition error
    pub fn candidates<S: Into<String>>(message: S) -> Self {
        Self::CandidateAcquisition(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Io(_) => "IO",
            Self::Parse(_) => "PARSE",
            Self::CandidateAcquisition(_) => "CANDIDATES",
        }
    }

    /// Check if error is recoverable (running again may succeed)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::CandidateAcquisition(_) => true,
            Self::Config(_) | Self::Io(_) | Self::Parse(_) => false,
        }
    }

    /// Get user-friendly error message with suggestions
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Config(msg) => {
                format!("Configuration problem: {}\n\nSuggestion: Check your .env file or command line arguments.", msg)
            }
            Self::Io(msg) => {
                format!("File operation failed: {}\n\nSuggestion: Check file permissions and disk space.", msg)
            }
            Self::Parse(msg) => {
                format!("Failed to parse data: {}\n\nSuggestion: Check the format of your saved result file.", msg)
            }
            Self::CandidateAcquisition(msg) => {
                format!("Could not build the candidate list: {}\n\nSuggestion: Pass addresses with --ip, or point --ranges-file at a list of CIDR ranges.", msg)
            }
        }
    }

    /// Get exit code for this error type
    ///
    /// Code 4 is reserved for a completed run that found no available
    /// address, see [`crate::app::RunStatus::exit_code`].
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Parse(_) => 1,
            Self::Io(_) => 5,
            Self::CandidateAcquisition(_) => 6,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Parse(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::CandidateAcquisition(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::Io(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

// Standard library error conversions
impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON error: {}", error))
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Error context trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error
    fn context(self, message: &'static str) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<AppError>,
{
    /// Keeps the original category and prefixes its message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let context = f();
            match e.into() {
                AppError::Config(msg) => AppError::Config(format!("{}: {}", context, msg)),
                AppError::Io(msg) => AppError::Io(format!("{}: {}", context, msg)),
                AppError::Parse(msg) => AppError::Parse(format!("{}: {}", context, msg)),
                AppError::CandidateAcquisition(msg) => {
                    AppError::CandidateAcquisition(format!("{}: {}", context, msg))
                }
            }
        })
    }

    fn context(self, message: &'static str) -> Result<T> {
        self.with_context(|| message.to_string())
    }
}

/// Error reporter for structured error output and user feedback
pub struct ErrorReporter {
    pub use_color: bool,
    pub verbose: bool,
}

impl ErrorReporter {
    /// Create a new error reporter
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Self { use_color, verbose }
    }

    /// Render an error report, including suggestions in verbose mode
    pub fn render(&self, error: &AppError) -> String {
        let mut report = error.format_for_console(self.use_color);

        if self.verbose {
            report.push_str("\n\n");
            report.push_str(&error.user_friendly_message());

            if error.is_recoverable() {
                let hint = "This error might be temporary. You can try running the command again.";
                report.push_str("\n\n");
                if self.use_color {
                    use colored::Colorize;
                    report.push_str(&hint.green().to_string());
                } else {
                    report.push_str(hint);
                }
            }
        }

        report
    }

    /// Report an error to the user on stderr
    pub fn report_error(&self, error: &AppError) {
        eprintln!("{}", self.render(error));
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_error = AppError::config("Invalid configuration");
        assert_eq!(config_error.category(), "CONFIG");
        assert!(!config_error.is_recoverable());
        assert_eq!(config_error.exit_code(), 1);

        let candidates_error = AppError::candidates("range list was empty");
        assert_eq!(candidates_error.category(), "CANDIDATES");
        assert!(candidates_error.is_recoverable());
        assert_eq!(candidates_error.exit_code(), 6);
    }

    #[test]
    fn test_error_display() {
        let error = AppError::candidates("no ranges");
        let display = error.to_string();
        assert!(display.contains("Candidate acquisition error"));
        assert!(display.contains("no ranges"));
    }

    #[test]
    fn test_error_categories() {
        let errors = [
            AppError::config("config"),
            AppError::io("io"),
            AppError::parse("parse"),
            AppError::candidates("candidates"),
        ];

        let expected_categories = ["CONFIG", "IO", "PARSE", "CANDIDATES"];

        for (error, expected) in errors.iter().zip(expected_categories.iter()) {
            assert_eq!(error.category(), *expected);
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(AppError::config("x").exit_code(), 1);
        assert_eq!(AppError::parse("x").exit_code(), 1);
        assert_eq!(AppError::io("x").exit_code(), 5);
        assert_eq!(AppError::candidates("x").exit_code(), 6);

        for error in [AppError::config("x"), AppError::io("x"), AppError::parse("x"), AppError::candidates("x")] {
            assert_ne!(error.exit_code(), 0);
            assert_ne!(error.exit_code(), 4, "{} collides with the no-available exit code", error.category());
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let app_error: AppError = io_error.into();
        assert_eq!(app_error.category(), "IO");
        assert!(app_error.to_string().contains("File not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let app_error: AppError = json_error.into();
        assert_eq!(app_error.category(), "PARSE");
        assert!(app_error.to_string().contains("JSON error"));
    }

    #[test]
    fn test_dotenv_error_conversion() {
        let dotenv_error = dotenv::Error::LineParse(".env".to_string(), 1);
        let app_error: AppError = dotenv_error.into();
        assert_eq!(app_error.category(), "CONFIG");
    }

    #[test]
    fn test_context_keeps_category() {
        let result: Result<()> = Err(AppError::candidates("empty response"));
        let error = result.context("While fetching ranges").unwrap_err();

        assert_eq!(error.category(), "CANDIDATES");
        assert!(error.to_string().contains("While fetching ranges: empty response"));
    }

    #[test]
    fn test_with_context_on_foreign_error() {
        let result: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"));
        let error = result.with_context(|| "Writing warp_best_ips.json".to_string()).unwrap_err();

        assert_eq!(error.category(), "IO");
        assert!(error.to_string().contains("Writing warp_best_ips.json"));
    }

    #[test]
    fn test_console_formatting() {
        let error = AppError::config("Test error");
        let formatted_no_color = error.format_for_console(false);
        let formatted_color = error.format_for_console(true);

        assert_eq!(formatted_no_color, "[CONFIG] Configuration error: Test error");
        assert!(formatted_color.contains("CONFIG"));
        assert!(formatted_color.contains("Test error"));
    }

    #[test]
    fn test_reporter_verbose_render() {
        let reporter = ErrorReporter::new(false, true);
        let rendered = reporter.render(&AppError::candidates("ranges unavailable"));

        assert!(rendered.starts_with("[CANDIDATES]"));
        assert!(rendered.contains("Suggestion:"));
        assert!(rendered.contains("might be temporary"));

        let quiet = ErrorReporter::new(false, false).render(&AppError::config("bad"));
        assert!(!quiet.contains("Suggestion:"));
    }

    #[test]
    fn test_error_reporter_default() {
        let reporter = ErrorReporter::default();
        assert!(reporter.use_color);
        assert!(!reporter.verbose);
    }
}
