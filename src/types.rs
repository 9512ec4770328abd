//! Type definitions shared by the probe, scheduler and output layers

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// The step of a probe at which it stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProbeStage {
    /// Parsing the candidate string as an IPv4 address
    Address,
    /// TCP handshake with the edge port
    Connect,
    /// HTTPS request to the trace endpoint
    Verify,
    /// Enforced by the worker pool rather than the probe itself
    Scheduler,
}

impl ProbeStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeStage::Address => "address",
            ProbeStage::Connect => "connect",
            ProbeStage::Verify => "verify",
            ProbeStage::Scheduler => "scheduler",
        }
    }
}

impl fmt::Display for ProbeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a probe stage failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FailureReason {
    /// Input was not a dotted-quad IPv4 address
    InvalidAddress(String),
    /// Connection refused, reset, unreachable, TLS failure
    Connection(String),
    /// The probe budget ran out
    Timeout,
    /// The trace endpoint answered with something other than 200
    Status(u16),
    /// The request could not be built or the response was malformed
    Request(String),
    /// Not started because the run-level deadline had passed
    DeadlineExceeded,
    /// The worker running this probe died before reporting
    Aborted,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::InvalidAddress(detail) => write!(f, "invalid address ({})", detail),
            FailureReason::Connection(detail) => write!(f, "connection failed ({})", detail),
            FailureReason::Timeout => f.write_str("timed out"),
            FailureReason::Status(code) => write!(f, "unexpected HTTP status {}", code),
            FailureReason::Request(detail) => write!(f, "request failed ({})", detail),
            FailureReason::DeadlineExceeded => f.write_str("run deadline exceeded before probing"),
            FailureReason::Aborted => f.write_str("probe worker aborted"),
        }
    }
}

/// A failed probe stage, returned by each step and folded into the outcome
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{stage} stage: {reason}")]
pub struct ProbeFailure {
    pub stage: ProbeStage,
    pub reason: FailureReason,
}

impl ProbeFailure {
    pub fn new(stage: ProbeStage, reason: FailureReason) -> Self {
        Self { stage, reason }
    }

    pub fn invalid_address<S: Into<String>>(detail: S) -> Self {
        Self::new(ProbeStage::Address, FailureReason::InvalidAddress(detail.into()))
    }

    pub fn connection<S: Into<String>>(detail: S) -> Self {
        Self::new(ProbeStage::Connect, FailureReason::Connection(detail.into()))
    }

    pub fn timeout(stage: ProbeStage) -> Self {
        Self::new(stage, FailureReason::Timeout)
    }

    pub fn status(code: u16) -> Self {
        Self::new(ProbeStage::Verify, FailureReason::Status(code))
    }

    pub fn request<S: Into<String>>(detail: S) -> Self {
        Self::new(ProbeStage::Verify, FailureReason::Request(detail.into()))
    }

    pub fn deadline_exceeded() -> Self {
        Self::new(ProbeStage::Scheduler, FailureReason::DeadlineExceeded)
    }

    pub fn aborted() -> Self {
        Self::new(ProbeStage::Scheduler, FailureReason::Aborted)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.reason, FailureReason::Timeout)
    }
}

/// Latency classification used to color console output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyLevel {
    /// Under 150 ms
    Fast,
    /// 150 ms up to 400 ms
    Moderate,
    /// 400 ms or more
    Slow,
}

impl LatencyLevel {
    pub fn from_millis(millis: f64) -> Self {
        if millis < 150.0 {
            Self::Fast
        } else if millis < 400.0 {
            Self::Moderate
        } else {
            Self::Slow
        }
    }
}
