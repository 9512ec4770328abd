//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    config::env::EnvManager,
    error::Result,
    models::Config,
};
use std::path::PathBuf;

/// Configuration parser that combines CLI arguments with environment variables
///
/// Layers, lowest to highest priority: defaults, `.env` file, process
/// environment, command-line arguments. The result is validated last.
pub struct ConfigParser {
    cli: Cli,
    env_file: PathBuf,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self {
            cli,
            env_file: PathBuf::from(".env"),
        }
    }

    /// Read the `.env` layer from another file
    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.env_file = path.into();
        self
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        // dotenv leaves variables that are already set untouched, so the
        // environment keeps priority over the file
        EnvManager::load_env_file(&self.env_file)?;
        self.parse_with_source(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an explicit variable lookup instead of the process environment
    pub fn parse_with_source<F>(&self, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        for (var, _, _) in EnvManager::get_supported_env_vars() {
            if let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) {
                EnvManager::validate_env_var(var, &value)?;
            }
        }
        config.merge_from_source(&lookup)?;

        self.apply_cli_overrides(&mut config);

        config.validate()?;

        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) {
        let cli = &self.cli;

        if let Some(timeout) = cli.timeout {
            config.timeout_seconds = timeout;
        }
        if let Some(concurrency) = cli.concurrency {
            config.max_concurrency = concurrency;
        }
        if let Some(top) = cli.top {
            config.top_n = top;
        }
        if let Some(samples) = cli.samples {
            config.samples_per_range = samples;
        }
        if let Some(url) = &cli.ranges_url {
            config.ranges_url = url.clone();
        }
        if let Some(host) = &cli.trace_host {
            config.trace_host = host.clone();
        }
        if let Some(output) = &cli.output {
            config.output_file = output.clone();
        }
        if let Some(deadline) = cli.deadline {
            config.run_deadline_seconds = Some(deadline);
        }
        if let Some(log_file) = &cli.log_file {
            config.log_file = Some(log_file.clone());
        }
        if let Some(enable_color) = cli.color_override() {
            config.enable_color = enable_color;
        }

        // Verbose and debug flags are CLI-only
        config.verbose = cli.verbose;
        config.debug = cli.debug;
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    summary.push(format!("Ranges URL: {}", config.ranges_url));
    summary.push(format!("Trace Host: {}", config.trace_host));
    summary.push(format!("Samples Per Range: {}", config.samples_per_range));
    summary.push(format!("Timeout: {}s", config.timeout_seconds));
    summary.push(format!("Max Concurrency: {}", config.max_concurrency));
    summary.push(format!("Top N: {}", config.top_n));
    summary.push(format!(
        "Run Deadline: {}",
        config.run_deadline_seconds.map_or_else(|| "none".to_string(), |secs| format!("{}s", secs))
    ));
    summary.push(format!("Output File: {}", config.output_file));
    summary.push(format!("Log File: {}", config.log_file.as_deref().unwrap_or("none")));
    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Verbose: {}", config.verbose));
    summary.push(format!("Debug: {}", config.debug));

    summary.join("\n")
}
