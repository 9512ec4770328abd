//! Persistence of ranked results
//!
//! Results are stored as a JSON array of `{"ip", "response_time",
//! "available"}` records indented with four spaces, the layout tunneling
//! client tooling reads.

use crate::error::{AppError, ErrorContext, Result};
use crate::models::ProbeOutcome;
use crate::ranking::RankedResult;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// JSON file holding the latest ranked result
#[derive(Debug, Clone)]
pub struct ResultStore {
    path: PathBuf,
}

impl ResultStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the ranked result, replacing any previous file
    pub fn save(&self, ranked: &RankedResult) -> Result<()> {
        let mut buffer = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
        ranked.serialize(&mut serializer)?;
        buffer.push(b'\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        fs::write(&self.path, buffer)
            .with_context(|| format!("Failed to write results to {}", self.path.display()))
    }

    /// Whether a saved result exists
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read a saved result back
    ///
    /// A missing file yields an empty result. Records are re-ranked on load.
    pub fn load(&self) -> Result<RankedResult> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(RankedResult::default()),
            Err(e) => {
                return Err(AppError::io(format!("Failed to read results from {}: {}", self.path.display(), e)));
            }
        };

        let records: Vec<ProbeOutcome> = serde_json::from_str(&contents).map_err(|e| {
            AppError::parse(format!("Malformed results file {}: {}", self.path.display(), e))
        })?;

        Ok(RankedResult::from_saved(records))
    }
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new(crate::defaults::DEFAULT_OUTPUT_FILE)
    }
}
