//! Data models and structures for the edge IP selector

pub mod config;
pub mod outcome;

// Re-export main model types
pub use config::Config;
pub use outcome::ProbeOutcome;
