//! Fixed-width probe worker pool

use crate::{
    executor::{PoolSettings, PoolSummary},
    logging::ProbeLogger,
    models::ProbeOutcome,
    probe::Prober,
    types::{ProbeFailure, ProbeStage},
};
use futures::future::join_all;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::{
    sync::mpsc,
    time::{timeout, Instant},
};

/// Outcomes of a run plus their summary
#[derive(Debug, Clone)]
pub struct PoolRun {
    /// One outcome per input address, in input order
    pub outcomes: Vec<ProbeOutcome>,
    pub summary: PoolSummary,
}

/// Runs a prober over candidate lists with a fixed number of workers
pub struct ProbePool<P: Prober + ?Sized + 'static> {
    prober: Arc<P>,
    settings: PoolSettings,
    logger: Option<Arc<ProbeLogger>>,
}

/// Shared list of addresses handed out by an atomic cursor
struct WorkQueue {
    addresses: Vec<String>,
    cursor: AtomicUsize,
    deadline: Option<Instant>,
}

impl WorkQueue {
    fn new(addresses: Vec<String>, deadline: Option<Instant>) -> Self {
        Self {
            addresses,
            cursor: AtomicUsize::new(0),
            deadline,
        }
    }

    /// Each index is handed out at most once across all workers
    fn next(&self) -> Option<(usize, &str)> {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.addresses.get(index).map(|address| (index, address.as_str()))
    }

    fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

impl<P: Prober + ?Sized + 'static> ProbePool<P> {
    pub fn new(prober: Arc<P>, settings: PoolSettings) -> Self {
        Self {
            prober,
            settings,
            logger: None,
        }
    }

    /// Log every outcome and the final summary through `logger`
    pub fn with_logger(mut self, logger: Arc<ProbeLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    /// Probe every address and return one outcome each
    pub async fn run_all(&self, addresses: &[String]) -> Vec<ProbeOutcome> {
        self.run(addresses).await.outcomes
    }

    /// Probe every address and return the outcomes with a summary
    ///
    /// Returns only after every worker has finished. Outcomes come back in
    /// input order whatever the completion order was. An address whose
    /// worker died before reporting is recorded as aborted.
    pub async fn run(&self, addresses: &[String]) -> PoolRun {
        let started = Instant::now();
        let total = addresses.len();

        if total == 0 {
            let summary = PoolSummary::from_outcomes(&[], 0, started.elapsed());
            return PoolRun { outcomes: Vec::new(), summary };
        }

        let workers = self.settings.max_concurrency.clamp(1, total);
        let deadline = self.settings.run_deadline.map(|limit| started + limit);
        let queue = Arc::new(WorkQueue::new(addresses.to_vec(), deadline));

        let (sender, mut receiver) = mpsc::channel(workers);
        let mut handles = Vec::with_capacity(workers);

        for _ in 0..workers {
            handles.push(tokio::spawn(work(
                queue.clone(),
                self.prober.clone(),
                self.settings.timeout_per_probe,
                sender.clone(),
            )));
        }

        // Drop the sender to signal completion
        drop(sender);

        let mut slots: Vec<Option<ProbeOutcome>> = (0..total).map(|_| None).collect();
        while let Some((index, outcome)) = receiver.recv().await {
            if let Some(logger) = &self.logger {
                logger.log_outcome(&outcome).await;
            }
            slots[index] = Some(outcome);
        }

        for joined in join_all(handles).await {
            if let Err(e) = joined {
                if let Some(logger) = &self.logger {
                    logger.logger()
                        .warn(&format!("Probe worker stopped unexpectedly: {}", e))
                        .log()
                        .await;
                }
            }
        }

        let outcomes: Vec<ProbeOutcome> = slots
            .into_iter()
            .zip(addresses)
            .map(|(slot, address)| {
                slot.unwrap_or_else(|| ProbeOutcome::unavailable(address.clone(), ProbeFailure::aborted()))
            })
            .collect();

        let summary = PoolSummary::from_outcomes(&outcomes, workers, started.elapsed());
        if let Some(logger) = &self.logger {
            logger.log_pool_summary(&summary).await;
        }

        PoolRun { outcomes, summary }
    }
}

/// Worker loop: pull an address, probe it, report, repeat until the queue is empty
async fn work<P: Prober + ?Sized>(
    queue: Arc<WorkQueue>,
    prober: Arc<P>,
    budget: Duration,
    sender: mpsc::Sender<(usize, ProbeOutcome)>,
) {
    while let Some((index, address)) = queue.next() {
        let outcome = if queue.deadline_passed() {
            ProbeOutcome::unavailable(address, ProbeFailure::deadline_exceeded())
        } else {
            probe_within(prober.as_ref(), address, budget).await
        };

        if sender.send((index, outcome)).await.is_err() {
            break;
        }
    }
}

async fn probe_within<P: Prober + ?Sized>(prober: &P, address: &str, budget: Duration) -> ProbeOutcome {
    match timeout(budget, prober.probe(address, budget)).await {
        Ok(outcome) => outcome,
        Err(_) => ProbeOutcome::unavailable(address, ProbeFailure::timeout(ProbeStage::Scheduler)),
    }
}
