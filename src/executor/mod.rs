//! Probe execution engine
//!
//! This module runs a [`Prober`] over a whole candidate list:
//! - a fixed-width pool of worker tasks pulling from a shared work queue
//! - a wall-clock budget around every probe
//! - channel fan-in of outcomes, drained completely before returning
//! - an optional run-level deadline after which unstarted work is skipped

mod pool;

pub use pool::{ProbePool, PoolRun};

use crate::{
    models::{Config, ProbeOutcome},
    probe::Prober,
    types::ProbeStage,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Execution parameters for a probe run
#[derive(Debug, Clone, PartialEq)]
pub struct PoolSettings {
    /// Budget for a single probe
    pub timeout_per_probe: Duration,
    /// Maximum number of probes in flight
    pub max_concurrency: usize,
    /// Stop starting new probes once this much time has passed
    pub run_deadline: Option<Duration>,
}

impl PoolSettings {
    pub fn new(timeout_per_probe: Duration, max_concurrency: usize) -> Self {
        Self {
            timeout_per_probe,
            max_concurrency,
            run_deadline: None,
        }
    }

    pub fn with_run_deadline(mut self, deadline: Duration) -> Self {
        self.run_deadline = Some(deadline);
        self
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self::new(crate::defaults::DEFAULT_TIMEOUT, crate::defaults::DEFAULT_MAX_CONCURRENCY)
    }
}

impl From<&Config> for PoolSettings {
    fn from(config: &Config) -> Self {
        Self {
            timeout_per_probe: config.timeout(),
            max_concurrency: config.max_concurrency,
            run_deadline: config.run_deadline(),
        }
    }
}

/// Summary of one probe run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolSummary {
    /// Number of outcomes, always equal to the number of input addresses
    pub total: usize,
    pub available: usize,
    pub unavailable: usize,
    /// Unavailable outcomes whose failure was a timeout at any stage
    pub timed_out: usize,
    pub failures_by_stage: BTreeMap<ProbeStage, usize>,
    /// Worker tasks actually started
    pub workers: usize,
    pub elapsed: Duration,
}

impl PoolSummary {
    pub fn from_outcomes(outcomes: &[ProbeOutcome], workers: usize, elapsed: Duration) -> Self {
        let mut failures_by_stage = BTreeMap::new();
        let mut timed_out = 0;
        let mut available = 0;

        for outcome in outcomes {
            if outcome.is_available() {
                available += 1;
                continue;
            }
            if let Some(failure) = outcome.failure() {
                *failures_by_stage.entry(failure.stage).or_insert(0) += 1;
                if failure.is_timeout() {
                    timed_out += 1;
                }
            }
        }

        Self {
            total: outcomes.len(),
            available,
            unavailable: outcomes.len() - available,
            timed_out,
            failures_by_stage,
            workers,
            elapsed,
        }
    }

    /// Share of probed addresses that were available, as a percentage
    pub fn availability_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.available as f64 / self.total as f64 * 100.0
        }
    }
}

/// Probe every address with bounded parallelism and collect one outcome each
///
/// Convenience wrapper around [`ProbePool`] without a run deadline or logger.
pub async fn run_all<P>(
    prober: Arc<P>,
    addresses: &[String],
    timeout_per_probe: Duration,
    max_concurrency: usize,
) -> Vec<ProbeOutcome>
where
    P: Prober + ?Sized + 'static,
{
    ProbePool::new(prober, PoolSettings::new(timeout_per_probe, max_concurrency))
        .run_all(addresses)
        .await
}
