//! Combined wide table: every sample of every version, keyed by service.
//!
//! Internally each service owns one growable sequence per version. Rows only
//! exist at output time: service S gets max_v(len(S, v)) rows, and row i holds
//! the i-th sample of S in each version or an empty cell. Row index carries no
//! pairing between versions; it only keeps ragged samples from being lost.

use crate::Result;
use crate::error::PipelineError;
use crate::log::VersionTable;
use crate::summary::io::{read_csv, write_csv_atomic};

use std::collections::BTreeMap;
use std::path::Path;

pub const COMBINED_FILE: &str = "summary.csv";

/// Samples of one service, one sequence per version (indexed like
/// [`CombinedTable::versions`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceColumns {
    pub service: String,
    pub per_version: Vec<Vec<u64>>,
}

impl ServiceColumns {
    pub fn row_count(&self) -> usize {
        self.per_version.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// One materialized output row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedRow<'a> {
    pub service: &'a str,
    pub cells: Vec<Option<u64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombinedTable {
    versions: Vec<String>,
    services: Vec<ServiceColumns>,
    index: BTreeMap<String, usize>,
}

impl CombinedTable {
    pub fn new(versions: Vec<String>) -> Self {
        Self {
            versions,
            services: Vec::new(),
            index: BTreeMap::new(),
        }
    }

    pub fn versions(&self) -> &[String] {
        &self.versions
    }

    /// Services in first-appearance order.
    pub fn services(&self) -> &[ServiceColumns] {
        &self.services
    }

    pub fn service(&self, name: &str) -> Option<&ServiceColumns> {
        self.index.get(name).map(|&i| &self.services[i])
    }

    pub fn version_index(&self, version: &str) -> Option<usize> {
        self.versions.iter().position(|v| v == version)
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Number of non-missing cells in the column of `version_idx`.
    pub fn sample_count(&self, version_idx: usize) -> usize {
        self.services
            .iter()
            .map(|s| s.per_version.get(version_idx).map_or(0, Vec::len))
            .sum()
    }

    /// Append one sample for `service` in the version at `version_idx`.
    pub fn push(&mut self, service: &str, version_idx: usize, value: u64) {
        let width = self.versions.len();
        let slot = match self.index.get(service) {
            Some(&i) => i,
            None => {
                self.services.push(ServiceColumns {
                    service: service.to_string(),
                    per_version: vec![Vec::new(); width],
                });
                self.index.insert(service.to_string(), self.services.len() - 1);
                self.services.len() - 1
            }
        };
        self.services[slot].per_version[version_idx].push(value);
    }

    pub fn rows(&self) -> Vec<CombinedRow<'_>> {
        let mut out = Vec::new();
        for columns in &self.services {
            for i in 0..columns.row_count() {
                out.push(CombinedRow {
                    service: &columns.service,
                    cells: columns.per_version.iter().map(|v| v.get(i).copied()).collect(),
                });
            }
        }
        out
    }

    /// Write the `service,<v1>,<v2>,...` artifact. Missing cells are empty.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let header: Vec<String> = std::iter::once("service".to_string())
            .chain(self.versions.iter().cloned())
            .collect();
        let body = self.rows().into_iter().map(|row| {
            std::iter::once(row.service.to_string())
                .chain(
                    row.cells
                        .iter()
                        .map(|c| c.map(|v| v.to_string()).unwrap_or_default()),
                )
                .collect::<Vec<String>>()
        });
        write_csv_atomic(path, std::iter::once(header).chain(body))
    }

    /// Load a combined artifact. Empty or non-numeric cells are missing values.
    pub fn read_csv(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(PipelineError::missing("combined summary", path).into());
        }
        let doc = read_csv(path)?;
        match doc.header.first().map(String::as_str) {
            Some("service") => {}
            _ => {
                return Err(PipelineError::InvalidInput(format!(
                    "{} must start with a 'service' column",
                    path.display()
                ))
                .into());
            }
        }

        let mut table = Self::new(doc.header[1..].to_vec());
        for row in &doc.rows {
            let Some(service) = row.get(0) else {
                continue;
            };
            for idx in 0..table.versions.len() {
                let Some(Ok(value)) = row.get(idx + 1).map(|c| c.trim().parse::<u64>()) else {
                    continue;
                };
                table.push(service, idx, value);
            }
        }
        Ok(table)
    }
}

/// Merge per-version tables into one combined table.
///
/// Versions keep their input order; services are ordered by first appearance
/// walking the versions in that order.
pub fn combine(tables: &[VersionTable]) -> CombinedTable {
    let mut out = CombinedTable::new(tables.iter().map(|t| t.version.clone()).collect());
    for (idx, table) in tables.iter().enumerate() {
        for sample in &table.samples {
            out.push(&sample.service, idx, sample.loading_time_ms);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::Sample;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn vt(version: &str, samples: &[(&str, u64)]) -> VersionTable {
        VersionTable {
            version: version.to_string(),
            samples: samples.iter().map(|(s, v)| Sample::new(*s, *v)).collect(),
        }
    }

    fn fixture() -> Vec<VersionTable> {
        vec![
            vt("v1", &[("A", 1), ("B", 10), ("A", 2)]),
            vt("v2", &[("C", 100), ("A", 3), ("A", 4), ("A", 5)]),
            vt("v3", &[]),
        ]
    }

    #[test]
    fn ragged_rows_are_padded_with_missing_not_zero() {
        let table = combine(&fixture());
        let rows: Vec<(String, Vec<Option<u64>>)> = table
            .rows()
            .into_iter()
            .map(|r| (r.service.to_string(), r.cells))
            .collect();

        assert_eq!(
            rows,
            vec![
                ("A".to_string(), vec![Some(1), Some(3), None]),
                ("A".to_string(), vec![Some(2), Some(4), None]),
                ("A".to_string(), vec![None, Some(5), None]),
                ("B".to_string(), vec![Some(10), None, None]),
                ("C".to_string(), vec![None, Some(100), None]),
            ]
        );
    }

    #[test]
    fn no_sample_is_lost() {
        let tables = fixture();
        let combined = combine(&tables);
        for (idx, t) in tables.iter().enumerate() {
            assert_eq!(combined.sample_count(idx), t.len());
        }
    }

    #[test]
    fn empty_inputs_give_empty_table() {
        assert!(combine(&[]).is_empty());
        assert!(combine(&[vt("v1", &[]), vt("v2", &[])]).is_empty());
    }

    #[test]
    fn csv_artifact_has_empty_cells_and_reads_back() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(COMBINED_FILE);
        let table = combine(&fixture());
        table.write_csv(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "service,v1,v2,v3");
        assert_eq!(lines[3], "A,,5,");

        assert_eq!(CombinedTable::read_csv(&path).unwrap(), table);
    }

    #[test]
    fn reading_requires_service_column() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.csv");
        fs::write(&path, "name,v1\nA,1\n").unwrap();
        assert!(CombinedTable::read_csv(&path).is_err());
        assert!(
            CombinedTable::read_csv(&tmp.path().join("missing.csv"))
                .unwrap_err()
                .downcast_ref::<PipelineError>()
                .unwrap()
                .is_missing_input()
        );
    }
}
