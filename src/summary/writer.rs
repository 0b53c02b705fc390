use crate::Result;
use crate::config::SummaryPolicy;
use crate::error::PipelineError;
use crate::log::{Sample, VersionTable};
use crate::summary::io::{read_csv, write_csv_atomic};

use std::path::{Path, PathBuf};
use tracing::debug;

pub const VERSION_SUMMARY_FILE: &str = "summary.csv";
pub const VERSION_SUMMARY_HEADER: [&str; 2] = ["service", "loading_time_ms"];

/// What a call to [`VersionSummaryWriter::write`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written { rows: usize },
    /// An artifact was already present and the policy says to keep it.
    KeptExisting,
}

/// Persists one `<version>/summary.csv` artifact per version under a
/// dataset's result directory.
#[derive(Debug, Clone)]
pub struct VersionSummaryWriter {
    result_root: PathBuf,
    policy: SummaryPolicy,
}

impl VersionSummaryWriter {
    pub fn new(result_root: impl Into<PathBuf>, policy: SummaryPolicy) -> Self {
        Self {
            result_root: result_root.into(),
            policy,
        }
    }

    pub fn artifact_path(&self, version: &str) -> PathBuf {
        self.result_root.join(version).join(VERSION_SUMMARY_FILE)
    }

    pub fn has_artifact(&self, version: &str) -> bool {
        self.artifact_path(version).is_file()
    }

    /// True when the existing artifact for `version` is authoritative and the
    /// logs need not be parsed again.
    pub fn keeps_existing(&self, version: &str) -> bool {
        self.policy == SummaryPolicy::SkipExisting && self.has_artifact(version)
    }

    pub fn write(&self, table: &VersionTable) -> Result<WriteOutcome> {
        if self.keeps_existing(&table.version) {
            debug!(version = %table.version, "keeping existing version summary");
            return Ok(WriteOutcome::KeptExisting);
        }

        let path = self.artifact_path(&table.version);
        let header: Vec<String> = VERSION_SUMMARY_HEADER.iter().map(|s| s.to_string()).collect();
        let rows = std::iter::once(header).chain(
            table
                .samples
                .iter()
                .map(|s| vec![s.service.clone(), s.loading_time_ms.to_string()]),
        );
        write_csv_atomic(&path, rows)?;
        Ok(WriteOutcome::Written { rows: table.len() })
    }

    /// Load a previously written artifact back into a VersionTable.
    pub fn read(&self, version: &str) -> Result<VersionTable> {
        read_version_summary(version, &self.artifact_path(version))
    }
}

/// Parse a per-version artifact. Rows that are short or carry a non-numeric
/// value are skipped.
pub fn read_version_summary(version: &str, path: &Path) -> Result<VersionTable> {
    if !path.is_file() {
        return Err(PipelineError::missing("version summary", path).into());
    }
    let doc = read_csv(path)?;
    if doc.header.first().map(String::as_str) != Some(VERSION_SUMMARY_HEADER[0]) {
        return Err(PipelineError::InvalidInput(format!(
            "{} must start with a 'service' column",
            path.display()
        ))
        .into());
    }

    let mut table = VersionTable::new(version);
    for row in &doc.rows {
        let (Some(service), Some(value)) = (row.get(0), row.get(1)) else {
            continue;
        };
        let Ok(ms) = value.trim().parse::<u64>() else {
            continue;
        };
        table.samples.push(Sample::new(service.trim(), ms));
    }
    Ok(table)
}
