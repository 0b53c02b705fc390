//! Tabular artifacts: per-version summaries and the combined wide table.

pub mod combine;
pub mod io;
pub mod writer;

pub use combine::{CombinedTable, ServiceColumns, combine};
pub use writer::{VersionSummaryWriter, WriteOutcome};
