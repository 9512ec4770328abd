//! Command-line interface

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Edge IP Selector - find the lowest-latency CDN edge addresses from this machine
#[derive(Parser, Debug, Clone)]
#[command(name = "edge-ip-selector")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Per-probe timeout in seconds
    #[arg(short, long, value_parser = parse_duration)]
    pub timeout: Option<u64>,

    /// Maximum number of probes in flight
    #[arg(short, long, value_parser = parse_concurrency)]
    pub concurrency: Option<usize>,

    /// Number of best addresses to keep
    #[arg(short = 'n', long, value_parser = parse_top)]
    pub top: Option<usize>,

    /// Random addresses sampled from each published range
    #[arg(long, value_parser = parse_samples)]
    pub samples: Option<usize>,

    /// URL of the published IPv4 range list
    #[arg(long, value_name = "URL")]
    pub ranges_url: Option<String>,

    /// Read the range list from a local file instead of the URL
    #[arg(long, value_name = "PATH")]
    pub ranges_file: Option<PathBuf>,

    /// Probe this address instead of sampling ranges (can be used multiple times)
    #[arg(long = "ip", value_name = "ADDRESS", action = ArgAction::Append)]
    pub ips: Vec<String>,

    /// File the ranked result is saved to
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<String>,

    /// Do not save the ranked result
    #[arg(long)]
    pub no_save: bool,

    /// Print the previously saved result and exit
    #[arg(long)]
    pub load: bool,

    /// Stop starting new probes after this many seconds
    #[arg(long, value_name = "SECONDS", value_parser = parse_deadline)]
    pub deadline: Option<u64>,

    /// Host name used for SNI and the Host header of the trace request
    #[arg(long, value_name = "HOST")]
    pub trace_host: Option<String>,

    /// Append log lines to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<String>,

    /// Force colored output
    #[arg(long, conflicts_with = "no_color")]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Validate CLI arguments for conflicts and requirements
    pub fn validate(&self) -> Result<(), String> {
        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }

        if self.load && (!self.ips.is_empty() || self.ranges_file.is_some()) {
            return Err("--load prints a saved result and cannot be combined with --ip or --ranges-file".to_string());
        }

        if self.load && self.no_save {
            return Err("--load and --no-save cannot be used together".to_string());
        }

        if !self.ips.is_empty() && self.ranges_file.is_some() {
            return Err("Use either --ip or --ranges-file, not both".to_string());
        }

        Ok(())
    }

    /// Color preference from flags and terminal detection
    ///
    /// `None` leaves the decision to the configuration.
    pub fn color_override(&self) -> Option<bool> {
        if self.color {
            Some(true)
        } else if self.no_color || !supports_color() {
            Some(false)
        } else {
            None
        }
    }
}

/// Parse duration from seconds string
fn parse_duration(s: &str) -> Result<u64, String> {
    // Reject strings with leading + sign or other invalid formats
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid duration: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid duration: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Duration must be greater than 0".to_string())
            } else if secs > 300 {
                Err("Duration cannot exceed 300 seconds".to_string())
            } else {
                Ok(secs)
            }
        })
}

/// Parse a run deadline in seconds; unlike the probe timeout it has no upper bound
fn parse_deadline(s: &str) -> Result<u64, String> {
    match s.parse::<u64>() {
        Ok(0) => Err("Deadline must be greater than 0".to_string()),
        Ok(secs) => Ok(secs),
        Err(_) => Err(format!("Invalid deadline: {}", s)),
    }
}

fn parse_bounded(s: &str, what: &str, max: usize) -> Result<usize, String> {
    let value = s.parse::<usize>().map_err(|_| format!("Invalid {}: {}", what, s))?;
    if value == 0 || value > max {
        return Err(format!("{} must be between 1 and {}", what, max));
    }
    Ok(value)
}

fn parse_concurrency(s: &str) -> Result<usize, String> {
    parse_bounded(s, "concurrency", 1000)
}

fn parse_top(s: &str) -> Result<usize, String> {
    parse_bounded(s, "top count", 1000)
}

fn parse_samples(s: &str) -> Result<usize, String> {
    parse_bounded(s, "samples per range", 256)
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    supports_color_with(|key| std::env::var(key).ok())
}

fn supports_color_with<F>(lookup: F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    if lookup("TERM").as_deref() == Some("dumb") {
        return false;
    }

    if lookup("NO_COLOR").is_some() {
        return false;
    }

    if lookup("FORCE_COLOR").is_some() {
        return true;
    }

    #[cfg(target_os = "windows")]
    {
        if lookup("ANSICON").is_some() || lookup("ConEmuANSI").is_some() {
            return true;
        }
    }

    // Default to true on Unix-like systems, false on Windows
    cfg!(unix)
}
