//! Candidate address acquisition
//!
//! Candidates come from one of three places: addresses given explicitly,
//! a local range document, or the provider's published range document.
//! Range documents are turned into candidates by sampling random hosts
//! from every network they list.

pub mod ranges;
pub mod sampler;

pub use ranges::{parse_ranges, ParsedRanges, RangeFetcher};
pub use sampler::{host_count, sample_addresses, sample_network};

use crate::{models::Config, AppError, Result};
use std::fs;
use std::path::PathBuf;

/// Where candidate addresses come from
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateSource {
    /// Addresses to probe as given
    Explicit(Vec<String>),
    /// Range document on disk
    RangesFile(PathBuf),
    /// Range document served over HTTP
    RangesUrl(String),
}

impl CandidateSource {
    /// Pick the source: explicit addresses win over a ranges file, which wins over the URL
    pub fn select(explicit: Vec<String>, ranges_file: Option<PathBuf>, config: &Config) -> Self {
        if !explicit.is_empty() {
            Self::Explicit(explicit)
        } else if let Some(path) = ranges_file {
            Self::RangesFile(path)
        } else {
            Self::RangesUrl(config.ranges_url.clone())
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Explicit(addresses) => format!("{} explicit addresses", addresses.len()),
            Self::RangesFile(path) => format!("ranges file {}", path.display()),
            Self::RangesUrl(url) => format!("ranges URL {}", url),
        }
    }
}

/// Candidate list plus how it was built
#[derive(Debug, Clone, PartialEq)]
pub struct Candidates {
    pub addresses: Vec<String>,
    /// Networks sampled; zero for explicit addresses
    pub network_count: usize,
    /// Range lines that could not be used
    pub rejected: Vec<String>,
}

/// Build the candidate list for one run
///
/// An empty list is an error: nothing can be probed.
pub async fn acquire(source: &CandidateSource, samples_per_range: usize) -> Result<Candidates> {
    let candidates = match source {
        CandidateSource::Explicit(addresses) => {
            let mut addresses: Vec<String> = addresses
                .iter()
                .map(|address| address.trim().to_string())
                .filter(|address| !address.is_empty())
                .collect();
            dedup_in_order(&mut addresses);

            Candidates {
                addresses,
                network_count: 0,
                rejected: Vec::new(),
            }
        }
        CandidateSource::RangesFile(path) => {
            let text = fs::read_to_string(path).map_err(|e| {
                AppError::candidates(format!("Failed to read ranges file {}: {}", path.display(), e))
            })?;
            from_ranges(parse_ranges(&text), samples_per_range)
        }
        CandidateSource::RangesUrl(url) => {
            let ranges = RangeFetcher::new()?.fetch(url).await?;
            from_ranges(ranges, samples_per_range)
        }
    };

    if candidates.addresses.is_empty() {
        return Err(AppError::candidates(format!(
            "No candidate addresses available to test from {}",
            source.describe()
        )));
    }

    Ok(candidates)
}

fn from_ranges(ranges: ParsedRanges, samples_per_range: usize) -> Candidates {
    let mut rng = rand::thread_rng();
    Candidates {
        addresses: sample_addresses(&ranges.networks, samples_per_range, &mut rng),
        network_count: ranges.networks.len(),
        rejected: ranges.rejected,
    }
}

fn dedup_in_order(addresses: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    addresses.retain(|address| seen.insert(address.clone()));
}
