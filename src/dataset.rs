//! Dataset layout: a data root holding one sub-directory per version, each of
//! which carries a `PerformanceLog` directory (directly or somewhere below).

use crate::Result;
use crate::error::PipelineError;

use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

pub const LOG_DIR_NAME: &str = "PerformanceLog";

/// A version candidate under the data root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDir {
    pub name: String,
    pub root: PathBuf,
}

/// List every immediate sub-directory of `data_root`, sorted by name.
///
/// Candidates are not checked for a log directory here; that happens when
/// the version is parsed so a broken version can be reported on its own.
pub fn list_version_dirs(data_root: &Path) -> Result<Vec<VersionDir>> {
    if !data_root.is_dir() {
        return Err(PipelineError::missing("data folder", data_root).into());
    }

    Ok(sorted_subdirs(data_root)?
        .into_iter()
        .map(|root| VersionDir {
            name: root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            root,
        })
        .collect())
}

/// Locate the performance log directory of one version.
///
/// A direct `PerformanceLog` child wins; otherwise the first match of a
/// name-sorted depth-first walk is used.
pub fn find_log_dir(version_root: &Path) -> Result<Option<PathBuf>> {
    let direct = version_root.join(LOG_DIR_NAME);
    if direct.is_dir() {
        return Ok(Some(direct));
    }

    for child in sorted_subdirs(version_root)? {
        if let Some(found) = find_log_dir(&child)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).with_context(|| format!("read directory {}", dir.display()))?;

    let mut out = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("read entry in {}", dir.display()))?;
        let path = entry.path();
        if path.is_dir() {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}
