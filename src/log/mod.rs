//! Log parsing for the per-version PerformanceLog directories.

pub mod parse;
pub mod row;

pub use parse::parse_version_dir;
pub use row::{Sample, VersionTable};
