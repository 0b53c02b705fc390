//! Pipeline settings. Everything the pipeline needs to know is passed in
//! through [`PipelineConfig`]; nothing is cached process-wide.

use crate::stats::{Exclusions, QualityRules};

use clap::ValueEnum;
use std::path::{Path, PathBuf};

/// What to do when a version summary artifact already exists.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum SummaryPolicy {
    /// Keep the existing artifact and treat it as authoritative; the version's
    /// logs are not parsed again.
    #[default]
    SkipExisting,
    /// Re-parse the logs and replace the artifact.
    Overwrite,
}

impl SummaryPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SkipExisting => "skip-existing",
            Self::Overwrite => "overwrite",
        }
    }
}

pub const DEFAULT_MIN_VERSIONS: usize = 3;

pub const VERSION_STATS_FILE: &str = "summary_stats.csv";
pub const SERVICE_STATS_FILE: &str = "service_stats.csv";
pub const DASHBOARD_FILE: &str = "dashboard.html";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub data_root: PathBuf,
    /// Result directory of this dataset (`<result base>/<data folder name>`).
    pub result_root: PathBuf,
    pub policy: SummaryPolicy,
    pub min_versions: usize,
    pub exclusions: Exclusions,
    pub rules: QualityRules,
}

impl PipelineConfig {
    pub fn new(data_root: impl Into<PathBuf>, result_base: &Path) -> Self {
        let data_root = data_root.into();
        let result_root = result_root_for(&data_root, result_base);
        Self {
            data_root,
            result_root,
            policy: SummaryPolicy::default(),
            min_versions: DEFAULT_MIN_VERSIONS,
            exclusions: Exclusions::default(),
            rules: QualityRules::default(),
        }
    }

    pub fn with_policy(mut self, policy: SummaryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn combined_path(&self) -> PathBuf {
        self.result_root.join(crate::summary::combine::COMBINED_FILE)
    }

    pub fn version_stats_path(&self) -> PathBuf {
        self.result_root.join(VERSION_STATS_FILE)
    }

    pub fn service_stats_path(&self) -> PathBuf {
        self.result_root.join(SERVICE_STATS_FILE)
    }

    pub fn dashboard_path(&self) -> PathBuf {
        self.result_root.join(DASHBOARD_FILE)
    }
}

/// Results for a data folder live under a directory named after it.
pub fn result_root_for(data_root: &Path, result_base: &Path) -> PathBuf {
    match data_root.file_name() {
        Some(name) => result_base.join(name),
        None => result_base.to_path_buf(),
    }
}
