//! Main application orchestration and execution

use crate::{
    candidates::{self, CandidateSource},
    cli::Cli,
    config::{display_config_summary, load_config},
    error::{AppError, Result},
    executor::{PoolSettings, PoolSummary, ProbePool},
    logging::{Logger, LoggerFactory},
    models::Config,
    output::{OutputFormatter, OutputFormatterFactory},
    probe::HttpsProber,
    ranking::{rank, RankedResult},
    store::ResultStore,
};
use std::path::PathBuf;
use std::sync::Arc;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// At least one address was available and ranked
    Ranked,
    /// Every candidate failed, or the loaded result was empty
    NoneAvailable,
}

impl RunStatus {
    /// Process exit code for this status
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Ranked => 0,
            Self::NoneAvailable => 4,
        }
    }
}

/// What a completed run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    pub status: RunStatus,
    /// Candidates probed; zero when a saved result was loaded
    pub tested: usize,
    pub ranked: RankedResult,
    /// Pool statistics; absent when a saved result was loaded
    pub summary: Option<PoolSummary>,
    /// Where the ranked result was written, if it was
    pub saved_to: Option<PathBuf>,
}

impl RunReport {
    fn new(tested: usize, ranked: RankedResult, summary: Option<PoolSummary>) -> Self {
        let status = if ranked.is_empty() {
            RunStatus::NoneAvailable
        } else {
            RunStatus::Ranked
        };

        Self {
            status,
            tested,
            ranked,
            summary,
            saved_to: None,
        }
    }
}

/// Main application struct that coordinates all components
pub struct App {
    cli: Cli,
    config: Config,
    formatter: Box<dyn OutputFormatter>,
}

impl App {
    /// Create a new application instance, loading configuration from all layers
    pub fn new(cli: Cli) -> Result<Self> {
        cli.validate().map_err(AppError::config)?;
        let config = load_config(cli.clone())?;
        Ok(Self::with_config(cli, config))
    }

    /// Create an application instance with an already resolved configuration
    pub fn with_config(cli: Cli, config: Config) -> Self {
        let formatter = OutputFormatterFactory::from_config(&config);
        Self { cli, config, formatter }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the application
    pub async fn run(&self) -> Result<RunReport> {
        let factory = LoggerFactory::new(self.config.clone())?;
        let logger = factory.create_logger("APP").await;

        crate::log_debug!(logger, "{}", crate::build_info::long_version());
        crate::log_debug!(logger, "Configuration:\n{}", display_config_summary(&self.config));

        if self.config.verbose {
            println!("{}", self.formatter.format_header(&format!("{} v{}", crate::PKG_NAME, crate::VERSION))?);
        }

        let store = ResultStore::new(&self.config.output_file);

        if self.cli.load {
            return self.show_saved(&store, &logger).await;
        }

        let source = CandidateSource::select(self.cli.ips.clone(), self.cli.ranges_file.clone(), &self.config);
        crate::log_info!(logger, "Acquiring candidates from {}", source.describe());

        let candidates = candidates::acquire(&source, self.config.samples_per_range).await?;
        if !candidates.rejected.is_empty() {
            crate::log_warn!(
                logger,
                "Ignored {} unusable range lines: {}",
                candidates.rejected.len(),
                candidates.rejected.join(", ")
            );
        }
        crate::log_info!(
            logger,
            "Testing {} candidate addresses ({} networks sampled)",
            candidates.addresses.len(),
            candidates.network_count
        );

        let probe_logger = Arc::new(factory.create_probe_logger().await);
        let prober = Arc::new(HttpsProber::from_config(&self.config));
        let pool = ProbePool::new(prober, PoolSettings::from(&self.config)).with_logger(probe_logger.clone());

        let correlation_id = logger.start_operation("probe_run").await;
        let run = pool.run(&candidates.addresses).await;
        logger.end_operation(&correlation_id, "probe_run", run.summary.available > 0).await;

        let ranked = rank(&run.outcomes, self.config.top_n);
        probe_logger.log_ranking(&ranked).await;

        println!("{}", self.formatter.format_run_summary(&run.summary)?);
        println!();
        println!("{}", self.formatter.format_ranking(&ranked)?);

        let mut report = RunReport::new(candidates.addresses.len(), ranked, Some(run.summary));

        if report.status == RunStatus::Ranked && !self.cli.no_save {
            store.save(&report.ranked)?;
            crate::log_info!(logger, "Saved {} addresses to {}", report.ranked.len(), store.path().display());
            println!("{}", self.formatter.format_success(&format!("Results saved to {}", store.path().display()))?);
            report.saved_to = Some(store.path().to_path_buf());
        }

        Ok(report)
    }

    async fn show_saved(&self, store: &ResultStore, logger: &Logger) -> Result<RunReport> {
        if !store.exists() {
            crate::log_warn!(logger, "No saved result at {}", store.path().display());
            println!("{}", self.formatter.format_warning(&format!("No saved result at {}", store.path().display()))?);
        }

        let ranked = store.load()?;
        crate::log_info!(logger, "Loaded {} addresses from {}", ranked.len(), store.path().display());
        println!("{}", self.formatter.format_ranking(&ranked)?);

        Ok(RunReport::new(0, ranked, None))
    }
}
