//! Dashboard model: chart-ready structures built from the pipeline outputs.

use crate::Result;
use crate::stats::{Metric, StatsReport};
use crate::summary::CombinedTable;
use crate::summary::io::read_csv;

use anyhow::Context;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize)]
pub struct VersionStatsView {
    pub metric: &'static str,
    /// Indexed like `DashboardData::versions`, rounded to two decimals.
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStatsView {
    pub service: String,
    pub min: Option<f64>,
    pub median: Option<f64>,
    pub avg: Option<f64>,
    pub max: Option<f64>,
}

/// A CSV artifact offered for raw inspection.
#[derive(Debug, Clone, Serialize)]
pub struct ReportFile {
    /// Relative to the dataset result directory, `/`-separated.
    pub path: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompareDefaults {
    pub version_a: String,
    pub version_b: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardData {
    pub dataset: String,
    pub versions: Vec<String>,
    pub warnings: Vec<String>,
    pub error: Option<String>,
    /// Warnings followed by the error, shown above the bar chart.
    pub bar_alerts: Vec<String>,
    /// The grouped bar chart is withheld while the dataset has an error.
    pub show_bar: bool,
    pub version_stats: Vec<VersionStatsView>,
    /// Services sorted case-insensitively.
    pub service_order: Vec<String>,
    /// Per service, mean per version (indexed like `versions`).
    pub service_averages: BTreeMap<String, Vec<Option<f64>>>,
    /// Per service, sample count per version (indexed like `versions`).
    pub sample_counts: BTreeMap<String, Vec<usize>>,
    /// Per version, the distribution summary of every service.
    pub box_stats: BTreeMap<String, Vec<BoxStatsView>>,
    pub reports: Vec<ReportFile>,
    pub compare: CompareDefaults,
}

fn round2(v: Option<f64>) -> Option<f64> {
    v.map(|x| (x * 100.0).round() / 100.0)
}

/// Assemble the dashboard for one dataset.
pub fn build_dashboard(
    dataset: &str,
    combined: &CombinedTable,
    stats: &StatsReport,
    reports: Vec<ReportFile>,
) -> DashboardData {
    let versions = stats.version_stats.versions.clone();

    let version_stats = stats
        .version_stats
        .rows()
        .into_iter()
        .map(|row| VersionStatsView {
            metric: row.metric.as_str(),
            values: row.values.into_iter().map(round2).collect(),
        })
        .collect();

    // Services that have at least one sample somewhere.
    let mut service_order: Vec<String> = stats
        .service_stats
        .services
        .iter()
        .filter(|row| row.per_version.iter().any(|m| m.avg.is_some()))
        .map(|row| row.service.clone())
        .collect();
    service_order.sort_by_key(|s| s.to_lowercase());

    let mut service_averages = BTreeMap::new();
    for row in &stats.service_stats.services {
        if service_order.contains(&row.service) {
            service_averages.insert(
                row.service.clone(),
                row.per_version.iter().map(|m| m.avg).collect(),
            );
        }
    }

    let mut sample_counts = BTreeMap::new();
    for service in &service_order {
        let counts = versions
            .iter()
            .map(|v| {
                combined
                    .version_index(v)
                    .zip(combined.service(service))
                    .map_or(0, |(idx, cols)| cols.per_version[idx].len())
            })
            .collect();
        sample_counts.insert(service.clone(), counts);
    }

    let mut box_stats = BTreeMap::new();
    for version in &versions {
        let mut boxes = Vec::new();
        for service in &service_order {
            let Some(m) = stats.service_stats.get(service, version) else {
                continue;
            };
            if Metric::ALL.iter().all(|&metric| m.get(metric).is_none()) {
                continue;
            }
            boxes.push(BoxStatsView {
                service: service.clone(),
                min: m.min,
                median: m.median,
                avg: m.avg,
                max: m.max,
            });
        }
        box_stats.insert(version.clone(), boxes);
    }

    let warnings = stats.quality.warnings.clone();
    let error = stats.quality.error.clone();
    let mut bar_alerts = warnings.clone();
    bar_alerts.extend(error.iter().cloned());

    let version_a = versions.first().cloned().unwrap_or_default();
    let version_b = versions.get(1).cloned().unwrap_or_else(|| version_a.clone());

    DashboardData {
        dataset: dataset.to_string(),
        show_bar: error.is_none(),
        versions,
        warnings,
        error,
        bar_alerts,
        version_stats,
        service_order,
        service_averages,
        sample_counts,
        box_stats,
        reports,
        compare: CompareDefaults {
            version_a,
            version_b,
        },
    }
}

/// Every `*.csv` under `result_root`, sorted by relative path.
pub fn collect_reports(result_root: &Path) -> Result<Vec<ReportFile>> {
    let mut paths = Vec::new();
    walk_csv(result_root, &mut paths)?;
    paths.sort();

    let mut out = Vec::with_capacity(paths.len());
    for path in paths {
        let doc = read_csv(&path)?;
        let rel = path
            .strip_prefix(result_root)
            .unwrap_or(&path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        out.push(ReportFile {
            path: rel,
            header: doc.header,
            rows: doc
                .rows
                .iter()
                .map(|r| r.iter().map(str::to_string).collect())
                .collect(),
        });
    }
    Ok(out)
}

fn walk_csv(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in fs::read_dir(dir).with_context(|| format!("read directory {}", dir.display()))? {
        let path = entry
            .with_context(|| format!("read entry in {}", dir.display()))?
            .path();
        if path.is_dir() {
            walk_csv(&path, out)?;
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
        {
            out.push(path);
        }
    }
    Ok(())
}
