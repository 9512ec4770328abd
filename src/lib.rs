//! Edge IP Selector
//!
//! Finds the content-delivery edge addresses with the lowest latency from
//! this machine. Candidate addresses are sampled from the provider's
//! published IPv4 ranges, probed concurrently (TCP handshake plus an HTTPS
//! request to the trace endpoint), ranked by latency and saved for use by
//! a tunneling client.

pub mod app;
pub mod candidates;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod models;
pub mod output;
pub mod probe;
pub mod ranking;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use executor::{run_all, PoolSettings, PoolSummary, ProbePool};
pub use models::{Config, ProbeOutcome};
pub use output::{ColoredFormatter, OutputFormatter, OutputFormatterFactory, PlainFormatter};
pub use probe::{HttpsProber, Prober};
pub use ranking::{rank, RankedResult};
pub use store::ResultStore;

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Build metadata recorded by the build script
pub mod build_info {
    pub const BUILD_TIME: &str = env!("BUILD_TIME");
    pub const GIT_COMMIT: Option<&str> = option_env!("GIT_COMMIT");
    pub const TARGET_TRIPLE: &str = env!("TARGET_TRIPLE");

    /// Version with build metadata, logged in debug mode
    pub fn long_version() -> String {
        format!(
            "{} ({}, built {} for {})",
            crate::VERSION,
            GIT_COMMIT.unwrap_or("unknown commit"),
            BUILD_TIME,
            TARGET_TRIPLE
        )
    }
}

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
    pub const DEFAULT_MAX_CONCURRENCY: usize = 100;
    pub const DEFAULT_TOP_N: usize = 20;
    pub const DEFAULT_SAMPLES_PER_RANGE: usize = 5;
    pub const DEFAULT_RANGES_URL: &str = "https://www.cloudflare.com/ips-v4";
    pub const DEFAULT_TRACE_HOST: &str = "www.cloudflare.com";
    pub const DEFAULT_OUTPUT_FILE: &str = "warp_best_ips.json";
    pub const DEFAULT_ENABLE_COLOR: bool = true;

    /// Edge port probed on every candidate
    pub const EDGE_PORT: u16 = 443;
    pub const TRACE_PATH: &str = "/cdn-cgi/trace";
}
