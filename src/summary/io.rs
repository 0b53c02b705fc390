//! CSV artifact plumbing shared by every stage that touches disk.

use crate::Result;

use anyhow::Context;
use csv::{ReaderBuilder, StringRecord, Writer};
use std::fs;
use std::path::Path;
use tempfile::NamedTempFile;

/// A CSV artifact split into its header and data records.
#[derive(Debug, Clone, Default)]
pub struct CsvDocument {
    pub header: Vec<String>,
    pub rows: Vec<StringRecord>,
}

/// Read a CSV artifact. A UTF-8 byte order mark is accepted and dropped;
/// ragged rows are kept as-is.
pub fn read_csv(path: &Path) -> Result<CsvDocument> {
    let text = fs::read_to_string(path).with_context(|| format!("read csv {}", path.display()))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(first) => first
            .with_context(|| format!("parse csv header {}", path.display()))?
            .iter()
            .map(str::to_string)
            .collect(),
        None => return Ok(CsvDocument::default()),
    };

    let mut rows = Vec::new();
    for (idx, record) in records.enumerate() {
        // Header is line 1.
        let record =
            record.with_context(|| format!("parse csv {} at row {}", path.display(), idx + 2))?;
        rows.push(record);
    }
    Ok(CsvDocument { header, rows })
}

/// Write `rows` (header first) to `path` via a temp file in the same
/// directory that is renamed into place once complete.
pub fn write_csv_atomic<I, R>(path: &Path, rows: I) -> Result<()>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).with_context(|| format!("create directory {}", dir.display()))?;

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;
    {
        let mut writer = Writer::from_writer(tmp.as_file_mut());
        for row in rows {
            writer
                .write_record(row)
                .with_context(|| format!("write csv row for {}", path.display()))?;
        }
        writer
            .flush()
            .with_context(|| format!("flush csv {}", path.display()))?;
    }
    tmp.persist(path)
        .with_context(|| format!("move csv into place at {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn reads_bom_prefixed_csv() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("s.csv");
        fs::write(&path, "\u{feff}service,v1\nA,1\nB\n").unwrap();

        let doc = read_csv(&path).unwrap();
        assert_eq!(doc.header, vec!["service".to_string(), "v1".to_string()]);
        assert_eq!(doc.rows.len(), 2);
        assert_eq!(doc.rows[1].len(), 1);
    }

    #[test]
    fn empty_file_has_no_header() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("e.csv");
        fs::write(&path, "").unwrap();
        assert!(read_csv(&path).unwrap().header.is_empty());
    }

    #[test]
    fn atomic_write_creates_parent_and_leaves_no_temp_files() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("out.csv");
        write_csv_atomic(&path, vec![vec!["service", "v1"], vec!["Mail, Web", "3"]]).unwrap();

        let doc = read_csv(&path).unwrap();
        assert_eq!(doc.rows[0].get(0), Some("Mail, Web"));

        let entries: Vec<_> = fs::read_dir(tmp.path().join("nested")).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
