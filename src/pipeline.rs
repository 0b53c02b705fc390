//! One synchronous run over a dataset: parse every version, persist the
//! per-version summaries, combine them, compute statistics, write artifacts.

use crate::Result;
use crate::config::PipelineConfig;
use crate::dataset::{VersionDir, find_log_dir, list_version_dirs};
use crate::error::PipelineError;
use crate::log::{VersionTable, parse_version_dir};
use crate::stats::output::{write_service_stats, write_version_stats};
use crate::stats::{StatsEngine, StatsReport};
use crate::summary::{CombinedTable, VersionSummaryWriter, WriteOutcome, combine};

use tracing::{debug, error, info, warn};

/// A version left out of the run and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedVersion {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub combined: CombinedTable,
    pub stats: StatsReport,
    pub skipped: Vec<SkippedVersion>,
}

impl PipelineOutcome {
    pub fn versions(&self) -> &[String] {
        self.combined.versions()
    }
}

/// Run the whole pipeline for `config.data_root`.
///
/// A version whose directories are missing is skipped and reported in the
/// outcome. The run fails when fewer than `config.min_versions` versions
/// remain, or on any other IO error.
pub fn run(config: &PipelineConfig) -> Result<PipelineOutcome> {
    let writer = VersionSummaryWriter::new(&config.result_root, config.policy);
    info!(
        data = %config.data_root.display(),
        policy = config.policy.as_str(),
        "generating reports"
    );

    let mut tables: Vec<VersionTable> = Vec::new();
    let mut skipped = Vec::new();
    for version in list_version_dirs(&config.data_root)? {
        let table = match load_version(&writer, &version) {
            Ok(table) => table,
            Err(err) => match err.downcast_ref::<PipelineError>() {
                Some(typed) if typed.is_missing_input() => {
                    warn!(version = %version.name, error = %typed, "skipping version");
                    skipped.push(SkippedVersion {
                        name: version.name.clone(),
                        reason: typed.to_string(),
                    });
                    continue;
                }
                _ => return Err(err),
            },
        };
        tables.push(table);
    }

    if tables.len() < config.min_versions {
        return Err(PipelineError::InvalidInput(format!(
            "{} has {} usable version folder(s), need at least {}",
            config.data_root.display(),
            tables.len(),
            config.min_versions
        ))
        .into());
    }

    let combined = combine(&tables);
    if combined.is_empty() {
        warn!(data = %config.data_root.display(), "no samples in any version");
    }
    let combined_path = config.combined_path();
    combined.write_csv(&combined_path)?;
    let samples: usize = (0..combined.versions().len())
        .map(|idx| combined.sample_count(idx))
        .sum();
    info!(
        services = combined.services().len(),
        samples,
        path = %combined_path.display(),
        "wrote combined summary"
    );

    let stats = compute_and_write(config, &combined)?;
    Ok(PipelineOutcome {
        combined,
        stats,
        skipped,
    })
}

/// Parse one version, or read back its stored summary when the policy keeps
/// it. Either way the version must still have a log directory to qualify.
fn load_version(writer: &VersionSummaryWriter, version: &VersionDir) -> Result<VersionTable> {
    if writer.keeps_existing(&version.name) {
        if find_log_dir(&version.root)?.is_none() {
            return Err(PipelineError::missing("performance log directory", &version.root).into());
        }
        info!(version = %version.name, "reusing existing version summary");
        return writer.read(&version.name);
    }

    let table = parse_version_dir(version)?;
    if table.is_empty() {
        warn!(version = %version.name, "no matching log lines");
    }
    if let WriteOutcome::Written { rows } = writer.write(&table)? {
        info!(
            version = %version.name,
            rows,
            path = %writer.artifact_path(&version.name).display(),
            "wrote version summary"
        );
    }
    Ok(table)
}

/// Rebuild statistics from an existing combined artifact without touching
/// the logs.
pub fn load_existing(config: &PipelineConfig) -> Result<(CombinedTable, StatsReport)> {
    let combined = CombinedTable::read_csv(&config.combined_path())?;
    let stats = compute_and_write(config, &combined)?;
    Ok((combined, stats))
}

fn compute_and_write(config: &PipelineConfig, combined: &CombinedTable) -> Result<StatsReport> {
    let engine = StatsEngine::new(config.exclusions.clone(), config.rules.clone());
    let stats = engine.compute(combined, combined.versions())?;

    write_version_stats(&config.version_stats_path(), &stats.version_stats)?;
    write_service_stats(&config.service_stats_path(), &stats.service_stats)?;
    info!(
        path = %config.result_root.display(),
        "wrote statistics"
    );
    for version in combined.versions() {
        let avg = stats.version_stats.get(version).and_then(|m| m.avg);
        debug!(%version, avg = ?avg, "version average");
    }

    if stats.quality.is_clean() {
        info!("data quality checks passed");
    }
    for warning in &stats.quality.warnings {
        warn!(%warning, "data quality");
    }
    if let Some(message) = &stats.quality.error {
        error!(error = %message, "data quality");
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SummaryPolicy;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_log(data: &Path, version: &str, file: &str, lines: &[(&str, u64)]) {
        let dir = data.join(version).join("PerformanceLog");
        fs::create_dir_all(&dir).unwrap();
        let mut text = String::from("08:00:00.000 INFO session started\n");
        for (i, (service, ms)) in lines.iter().enumerate() {
            text.push_str(&format!(
                "08:00:{:02}.{:03} {} - loading_time: {} ms\n",
                i % 60,
                i,
                service,
                ms
            ));
        }
        fs::write(dir.join(file), text).unwrap();
    }

    fn three_version_dataset(data: &Path) {
        let service_a = [100, 110, 120, 130, 140];
        for (version, offset) in [("v1", 0), ("v2", 10), ("v3", 20)] {
            let mut lines: Vec<(&str, u64)> = Vec::new();
            for i in 0..5 {
                lines.push(("AUTO TEST", 50 + i * 10 + offset));
            }
            for ms in service_a {
                lines.push(("Service A", ms + offset));
            }
            write_log(data, version, "app_loading.log", &lines);
        }
    }

    #[test]
    fn end_to_end_three_versions() {
        let tmp = TempDir::new().unwrap();
        let data = tmp.path().join("release");
        three_version_dataset(&data);
        let config = PipelineConfig::new(&data, &tmp.path().join("result"));

        let outcome = run(&config).unwrap();
        assert_eq!(outcome.versions(), ["v1", "v2", "v3"]);
        assert!(outcome.skipped.is_empty());

        // AUTO TEST 50..90 and Service A 100..140 pooled: 10 values.
        let v1 = outcome.stats.version_stats.get("v1").unwrap();
        assert_eq!(v1.avg, Some(95.0));
        assert_eq!(v1.median, Some(95.0));
        assert_eq!(v1.max, Some(140.0));
        assert_eq!(v1.min, Some(50.0));

        let a = outcome.stats.service_stats.get("Service A", "v1").unwrap();
        assert_eq!(
            (a.avg, a.max, a.min, a.median),
            (Some(120.0), Some(140.0), Some(100.0), Some(120.0))
        );

        assert_eq!(
            outcome.stats.quality.warnings,
            vec!["Warning: dataset must include 24 services, found 2.".to_string()]
        );
        assert_eq!(outcome.stats.quality.error, None);

        for path in [
            config.combined_path(),
            config.version_stats_path(),
            config.service_stats_path(),
            config.result_root.join("v2").join("summary.csv"),
        ] {
            assert!(path.is_file(), "missing {}", path.display());
        }
        let combined = fs::read_to_string(config.combined_path()).unwrap();
        assert_eq!(combined.lines().next(), Some("service,v1,v2,v3"));
        assert_eq!(combined.lines().count(), 11);
    }

    #[test]
    fn broken_version_is_skipped_and_reported() {
        let tmp = TempDir::new().unwrap();
        let data = tmp.path().join("release");
        three_version_dataset(&data);
        fs::create_dir_all(data.join("v0-no-logs").join("misc")).unwrap();
        let config = PipelineConfig::new(&data, &tmp.path().join("result"));

        let outcome = run(&config).unwrap();
        assert_eq!(outcome.versions(), ["v1", "v2", "v3"]);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].name, "v0-no-logs");
    }

    #[test]
    fn too_few_versions_is_invalid_input() {
        let tmp = TempDir::new().unwrap();
        let data = tmp.path().join("small");
        write_log(&data, "v1", "a.log", &[("AUTO TEST", 1)]);
        write_log(&data, "v2", "a.log", &[("AUTO TEST", 1)]);
        let config = PipelineConfig::new(&data, &tmp.path().join("result"));

        let err = run(&config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::InvalidInput(_))
        ));
    }

    #[test]
    fn existing_summaries_are_authoritative_under_skip_policy() {
        let tmp = TempDir::new().unwrap();
        let data = tmp.path().join("release");
        three_version_dataset(&data);
        let config = PipelineConfig::new(&data, &tmp.path().join("result"));
        run(&config).unwrap();
        let artifact = config.result_root.join("v1").join("summary.csv");
        let before = fs::read(&artifact).unwrap();

        // New log lines are ignored while the artifact exists.
        write_log(&data, "v1", "more_loading.log", &[("Service B", 5)]);
        let outcome = run(&config).unwrap();
        assert!(outcome.combined.service("Service B").is_none());
        assert_eq!(fs::read(&artifact).unwrap(), before);

        let outcome = run(&config.clone().with_policy(SummaryPolicy::Overwrite)).unwrap();
        assert!(outcome.combined.service("Service B").is_some());
    }

    #[test]
    fn kept_summary_without_log_dir_does_not_qualify() {
        let tmp = TempDir::new().unwrap();
        let data = tmp.path().join("release");
        three_version_dataset(&data);
        let config = PipelineConfig::new(&data, &tmp.path().join("result"));
        run(&config).unwrap();

        fs::remove_dir_all(data.join("v1").join("PerformanceLog")).unwrap();
        let err = run(&config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::InvalidInput(_))
        ));

        fs::create_dir_all(data.join("v4").join("PerformanceLog")).unwrap();
        let outcome = run(&config).unwrap();
        assert_eq!(outcome.versions(), ["v2", "v3", "v4"]);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].name, "v1");
    }

    #[test]
    fn missing_canary_is_reported_not_raised() {
        let tmp = TempDir::new().unwrap();
        let data = tmp.path().join("release");
        for v in ["v1", "v2", "v3"] {
            write_log(&data, v, "x.log", &[("Service A", 1), ("OUTLOOK", 2)]);
        }
        let config = PipelineConfig::new(&data, &tmp.path().join("result"));

        let outcome = run(&config).unwrap();
        assert!(outcome.stats.quality.error.is_some());
        assert!(outcome.combined.service("OUTLOOK").is_some());
        assert!(outcome.stats.service_stats.get("OUTLOOK", "v1").is_none());
    }

    #[test]
    fn load_existing_recomputes_from_combined_artifact() {
        let tmp = TempDir::new().unwrap();
        let data = tmp.path().join("release");
        three_version_dataset(&data);
        let config = PipelineConfig::new(&data, &tmp.path().join("result"));
        let outcome = run(&config).unwrap();

        let (combined, stats) = load_existing(&config).unwrap();
        assert_eq!(combined, outcome.combined);
        assert_eq!(stats, outcome.stats);
    }
}
