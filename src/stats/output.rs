//! Stats artifacts: `summary_stats.csv` and `service_stats.csv`.

use crate::Result;
use crate::stats::{Metric, ServiceStats, VersionStats, format_value};
use crate::summary::io::write_csv_atomic;

use std::path::Path;

/// `metric,<v1>,<v2>,...` followed by exactly the four metric rows.
pub fn write_version_stats(path: &Path, stats: &VersionStats) -> Result<()> {
    let header: Vec<String> = std::iter::once("metric".to_string())
        .chain(stats.versions.iter().cloned())
        .collect();
    let body = stats.rows().into_iter().map(|row| {
        std::iter::once(row.metric.as_str().to_string())
            .chain(row.values.into_iter().map(format_value))
            .collect::<Vec<String>>()
    });
    write_csv_atomic(path, std::iter::once(header).chain(body))
}

/// `service,<v1>_avg,<v1>_max,<v1>_min,<v1>_median,<v2>_avg,...`
pub fn write_service_stats(path: &Path, stats: &ServiceStats) -> Result<()> {
    let mut header = vec!["service".to_string()];
    for version in &stats.versions {
        for metric in Metric::ALL {
            header.push(format!("{}_{}", version, metric.suffix()));
        }
    }

    let body = stats.services.iter().map(|row| {
        let mut cells = vec![row.service.clone()];
        for metrics in &row.per_version {
            cells.extend(Metric::ALL.iter().map(|&m| format_value(metrics.get(m))));
        }
        cells
    });
    write_csv_atomic(path, std::iter::once(header).chain(body))
}
