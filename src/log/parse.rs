use crate::Result;
use crate::dataset::{VersionDir, find_log_dir};
use crate::error::PipelineError;
use crate::log::row::{Sample, VersionTable};

use anyhow::Context;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Performance log line, e.g.
/// 09:15:02.417  Document Viewer - loading_time: 532 ms
///
/// Capture:
/// 1) service: everything between the timestamp and " - "
/// 2) value: integer milliseconds
const LOG_LINE_RE: &str =
    r"(?i)^\d{2}:\d{2}:\d{2}\.\d{3}\s+(\S.*?)\s+-\s+(?:loading_time|elapsed):\s+(\d+)\s+ms";

static LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(LOG_LINE_RE).expect("Invalid log line regex"));

const LOADING_SUFFIX: &str = "loading.log";

/// Extract every sample from `text`. Lines that do not match are skipped.
pub fn parse_log_lines(text: &str) -> Vec<Sample> {
    let mut out = Vec::new();
    for line in text.lines() {
        let Some(caps) = LINE_RE.captures(line) else {
            continue;
        };
        let (Some(service), Some(value)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        // Digits that overflow are treated like any other unusable line.
        let Ok(ms) = value.as_str().parse::<u64>() else {
            continue;
        };
        out.push(Sample::new(service.as_str().trim(), ms));
    }
    out
}

/// Pick the log files of a PerformanceLog directory, sorted by file name.
///
/// Files ending in `loading.log` win; when there are none, every `*.log`
/// file is used instead.
pub fn select_log_files(log_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(log_dir).with_context(|| format!("read log directory {}", log_dir.display()))?;

    let mut loading = Vec::new();
    let mut any_log = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("read entry in {}", log_dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_ascii_lowercase();
        if name.ends_with(LOADING_SUFFIX) {
            loading.push(path.clone());
        }
        if name.ends_with(".log") {
            any_log.push(path);
        }
    }

    let mut files = if loading.is_empty() { any_log } else { loading };
    files.sort();
    Ok(files)
}

/// Parse one version directory into a VersionTable.
///
/// Fails with `MissingInput` when the version directory or its log directory
/// is absent. An existing directory without matches yields an empty table.
pub fn parse_version_dir(version: &VersionDir) -> Result<VersionTable> {
    if !version.root.is_dir() {
        return Err(PipelineError::missing("version directory", &version.root).into());
    }
    let log_dir = find_log_dir(&version.root)?
        .ok_or_else(|| PipelineError::missing("performance log directory", &version.root))?;

    let mut table = VersionTable::new(&version.name);
    for file in select_log_files(&log_dir)? {
        let text = read_log_text(&file)?;
        table.samples.extend(parse_log_lines(&text));
    }
    Ok(table)
}

/// Read a log file as text. A leading BOM is dropped and invalid UTF-8
/// sequences are left out rather than rejected.
fn read_log_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("read log file {}", path.display()))?;
    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => e.as_bytes().utf8_chunks().map(|chunk| chunk.valid()).collect(),
    };
    Ok(match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn matches_loading_time_and_elapsed_lines() {
        let text = "\
09:15:02.417  Document Viewer - loading_time: 532 ms
09:15:03.001 AUTO TEST - ELAPSED: 87 ms
09:15:04.000 INFO starting up
garbage line
10:00:00.000 Mail - loading_time: abc ms
";
        let samples = parse_log_lines(text);
        assert_eq!(
            samples,
            vec![
                Sample::new("Document Viewer", 532),
                Sample::new("AUTO TEST", 87),
            ]
        );
    }

    #[test]
    fn sample_count_equals_matching_line_count() {
        let mut text = String::new();
        for i in 0..7 {
            text.push_str(&format!("12:00:0{}.000 Svc - elapsed: {} ms\n", i, i * 10));
            text.push_str("12:00:00 Svc - elapsed: 1 ms\n");
        }
        assert_eq!(parse_log_lines(&text).len(), 7);
    }

    #[test]
    fn service_with_dash_in_name_is_kept_whole() {
        let samples = parse_log_lines("01:02:03.004 Search - Advanced - loading_time: 9 ms");
        assert_eq!(samples, vec![Sample::new("Search - Advanced", 9)]);
    }

    #[test]
    fn empty_service_never_matches() {
        assert!(parse_log_lines("01:02:03.004  - elapsed: 9 ms").is_empty());
    }

    #[test]
    fn overflowing_value_is_skipped() {
        let samples = parse_log_lines("01:02:03.004 Svc - elapsed: 99999999999999999999999 ms");
        assert!(samples.is_empty());
    }

    #[test]
    fn prefers_loading_logs_then_falls_back_to_any_log() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b_loading.log"), "").unwrap();
        fs::write(tmp.path().join("a_login.log"), "").unwrap();
        fs::write(tmp.path().join("readme.txt"), "").unwrap();

        let files = select_log_files(tmp.path()).unwrap();
        assert_eq!(files, vec![tmp.path().join("b_loading.log")]);

        fs::remove_file(tmp.path().join("b_loading.log")).unwrap();
        let files = select_log_files(tmp.path()).unwrap();
        assert_eq!(files, vec![tmp.path().join("a_login.log")]);
    }

    #[test]
    fn parses_version_in_file_then_line_order_with_bom() {
        let tmp = TempDir::new().unwrap();
        let log_dir = tmp.path().join("v1").join("PerformanceLog");
        fs::create_dir_all(&log_dir).unwrap();
        fs::write(
            log_dir.join("2.log"),
            "00:00:00.000 B - elapsed: 2 ms\n00:00:00.000 B - elapsed: 3 ms\n",
        )
        .unwrap();
        fs::write(log_dir.join("1.log"), "\u{feff}00:00:00.000 A - elapsed: 1 ms\n").unwrap();

        let version = VersionDir {
            name: "v1".to_string(),
            root: tmp.path().join("v1"),
        };
        let table = parse_version_dir(&version).unwrap();
        assert_eq!(table.version, "v1");
        assert_eq!(
            table.samples,
            vec![Sample::new("A", 1), Sample::new("B", 2), Sample::new("B", 3)]
        );
    }

    #[test]
    fn invalid_utf8_bytes_are_dropped_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let log_dir = tmp.path().join("v1").join("PerformanceLog");
        fs::create_dir_all(&log_dir).unwrap();
        let mut bytes = b"00:00:00.000 AUTO TEST\xff - elapsed: 5 ms\n".to_vec();
        bytes.extend_from_slice(b"\xc3\x28 junk\n00:00:01.000 Mail - elapsed: 7 ms\n");
        fs::write(log_dir.join("x.log"), bytes).unwrap();

        let version = VersionDir {
            name: "v1".to_string(),
            root: tmp.path().join("v1"),
        };
        let table = parse_version_dir(&version).unwrap();
        assert_eq!(
            table.samples,
            vec![Sample::new("AUTO TEST", 5), Sample::new("Mail", 7)]
        );
    }

    #[test]
    fn missing_log_dir_is_missing_input() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("v1").join("other")).unwrap();

        for root in [tmp.path().join("v1"), tmp.path().join("v2")] {
            let version = VersionDir {
                name: "v".to_string(),
                root,
            };
            let err = parse_version_dir(&version).unwrap_err();
            assert!(err.downcast_ref::<PipelineError>().unwrap().is_missing_input());
        }
    }

    #[test]
    fn existing_dir_without_matches_is_empty_table() {
        let tmp = TempDir::new().unwrap();
        let log_dir = tmp.path().join("v1").join("PerformanceLog");
        fs::create_dir_all(&log_dir).unwrap();
        fs::write(log_dir.join("x.log"), "nothing to see\n").unwrap();

        let version = VersionDir {
            name: "v1".to_string(),
            root: tmp.path().join("v1"),
        };
        assert!(parse_version_dir(&version).unwrap().is_empty());
    }
}
