//! Statistics over the combined table: pooled per-version metrics,
//! per-service metrics, and the data quality report.

pub mod metrics;
pub mod output;
pub mod quality;

pub use metrics::{Metric, Metrics, format_value};
pub use quality::{DataQualityReport, QualityRules};

use crate::Result;
use crate::error::PipelineError;
use crate::summary::{CombinedTable, ServiceColumns};

use serde::Serialize;
use tracing::debug;

/// Services left out of every statistic and check. Matching trims the name
/// and ignores ASCII case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusions(Vec<String>);

impl Default for Exclusions {
    fn default() -> Self {
        Self::new(["EIP2", "EIP 2", "Microsoft 365", "OUTLOOK"])
    }
}

impl Exclusions {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn is_excluded(&self, service: &str) -> bool {
        let service = service.trim();
        self.0.iter().any(|n| n.trim().eq_ignore_ascii_case(service))
    }
}

/// Pooled metrics per version, indexed like `versions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionStats {
    pub versions: Vec<String>,
    pub per_version: Vec<Metrics>,
}

/// One row of the overall stats artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionStatsRow {
    pub metric: Metric,
    pub values: Vec<Option<f64>>,
}

impl VersionStats {
    pub fn rows(&self) -> Vec<VersionStatsRow> {
        Metric::ALL
            .iter()
            .map(|&metric| VersionStatsRow {
                metric,
                values: self.per_version.iter().map(|m| m.get(metric)).collect(),
            })
            .collect()
    }

    pub fn get(&self, version: &str) -> Option<&Metrics> {
        let idx = self.versions.iter().position(|v| v == version)?;
        self.per_version.get(idx)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceStatsRow {
    pub service: String,
    pub per_version: Vec<Metrics>,
}

/// Metrics per (service, version), services in combined-table order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceStats {
    pub versions: Vec<String>,
    pub services: Vec<ServiceStatsRow>,
}

impl ServiceStats {
    pub fn get(&self, service: &str, version: &str) -> Option<&Metrics> {
        let idx = self.versions.iter().position(|v| v == version)?;
        self.services
            .iter()
            .find(|row| row.service == service)
            .and_then(|row| row.per_version.get(idx))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    pub version_stats: VersionStats,
    pub service_stats: ServiceStats,
    pub quality: DataQualityReport,
}

#[derive(Debug, Clone, Default)]
pub struct StatsEngine {
    pub exclusions: Exclusions,
    pub rules: QualityRules,
}

impl StatsEngine {
    pub fn new(exclusions: Exclusions, rules: QualityRules) -> Self {
        Self { exclusions, rules }
    }

    /// Compute every statistic for `versions` over `table`.
    ///
    /// A version absent from the table is treated as having no samples.
    /// Fails only when `versions` is empty.
    pub fn compute(&self, table: &CombinedTable, versions: &[String]) -> Result<StatsReport> {
        if versions.is_empty() {
            return Err(
                PipelineError::InvalidInput("statistics need at least one version".into()).into(),
            );
        }

        let columns: Vec<Option<usize>> = versions.iter().map(|v| table.version_index(v)).collect();
        let kept: Vec<&ServiceColumns> = table
            .services()
            .iter()
            .filter(|s| !self.exclusions.is_excluded(&s.service))
            .collect();
        debug!(
            services = kept.len(),
            excluded = table.services().len() - kept.len(),
            "computing statistics"
        );

        let values_of = |service: &ServiceColumns, column: Option<usize>| -> Vec<u64> {
            column
                .and_then(|c| service.per_version.get(c))
                .cloned()
                .unwrap_or_default()
        };

        let per_version = columns
            .iter()
            .map(|&column| {
                let pooled: Vec<u64> = kept.iter().flat_map(|&s| values_of(s, column)).collect();
                Metrics::from_values(&pooled)
            })
            .collect();

        let services = kept
            .iter()
            .map(|&s| ServiceStatsRow {
                service: s.service.clone(),
                per_version: columns
                    .iter()
                    .map(|&column| Metrics::from_values(&values_of(s, column)))
                    .collect(),
            })
            .collect();

        let quality = quality::assess(
            &self.rules,
            kept.iter().map(|&s| {
                let total: usize = columns.iter().map(|&c| values_of(s, c).len()).sum();
                (s.service.as_str(), total)
            }),
        );

        Ok(StatsReport {
            version_stats: VersionStats {
                versions: versions.to_vec(),
                per_version,
            },
            service_stats: ServiceStats {
                versions: versions.to_vec(),
                services,
            },
            quality,
        })
    }
}
