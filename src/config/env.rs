//! Environment variable handling and .env file management

use crate::error::{AppError, ErrorContext, Result};
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load a .env file into the process environment if it exists
    ///
    /// Variables already set in the environment are not overridden.
    /// Returns whether a file was loaded.
    pub fn load_env_file(path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }

        dotenv::from_path(path).with_context(|| format!("Failed to load {}", path.display()))?;

        Ok(true)
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        let mut content = String::from(
            "# Edge IP Selector Configuration\n\
             #\n\
             # Values here are used as defaults and can be overridden by\n\
             # environment variables and command-line arguments.\n\n",
        );

        for (var, description, example) in Self::get_supported_env_vars() {
            content.push_str(&format!("# {}\n# {}={}\n\n", description, var, example));
        }

        content
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "TIMEOUT_SECONDS" => Self::check_range(key, value, 1, 300)?,
            "MAX_CONCURRENCY" => Self::check_range(key, value, 1, 1000)?,
            "TOP_N" => Self::check_range(key, value, 1, 1000)?,
            "SAMPLES_PER_RANGE" => Self::check_range(key, value, 1, 256)?,
            "RUN_DEADLINE_SECONDS" => Self::check_range(key, value, 1, u64::MAX)?,
            "RANGES_URL" => {
                let parsed = url::Url::parse(value)
                    .map_err(|e| AppError::config(format!("Invalid RANGES_URL '{}': {}", value, e)))?;
                if parsed.scheme() != "https" {
                    return Err(AppError::config(format!("RANGES_URL must use https: {}", value)));
                }
            }
            "TRACE_HOST" => {
                if value.is_empty() || value.contains('/') || value.contains(':') {
                    return Err(AppError::config(format!("TRACE_HOST must be a bare host name, got: '{}'", value)));
                }
            }
            "ENABLE_COLOR" => {
                value.parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", value, e)))?;
            }
            _ => {
                // Free-form or unknown variable, nothing to check
            }
        }

        Ok(())
    }

    fn check_range(key: &str, value: &str, min: u64, max: u64) -> Result<()> {
        let number: u64 = value.parse()
            .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
        if number < min || number > max {
            return Err(AppError::config(format!("{} must be between {} and {}, got: {}", key, min, max, number)));
        }
        Ok(())
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("TIMEOUT_SECONDS", "Per-probe timeout in seconds (1-300)", "5"),
            ("MAX_CONCURRENCY", "Maximum probes in flight (1-1000)", "100"),
            ("TOP_N", "Number of best addresses to keep (1-1000)", "20"),
            ("SAMPLES_PER_RANGE", "Random addresses sampled per range (1-256)", "5"),
            ("RANGES_URL", "URL of the published IPv4 range list", crate::defaults::DEFAULT_RANGES_URL),
            ("TRACE_HOST", "Host name sent in SNI and the Host header", crate::defaults::DEFAULT_TRACE_HOST),
            ("OUTPUT_FILE", "File the ranked result is saved to", crate::defaults::DEFAULT_OUTPUT_FILE),
            ("RUN_DEADLINE_SECONDS", "Stop starting new probes after this many seconds", "300"),
            ("LOG_FILE", "Append log lines to this file", "edge_ip_selector.log"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<22} {}\n", var, description));
            help.push_str(&format!("  {:<22} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }
}
