//! Typed failures of the extraction pipeline.
//!
//! These travel inside `anyhow::Error`; callers that need to branch on the
//! kind recover them with `err.downcast_ref::<PipelineError>()`.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A directory the pipeline needs does not exist.
    #[error("missing {what}: {}", .path.display())]
    MissingInput { what: &'static str, path: PathBuf },

    /// The caller handed the pipeline something it cannot work with.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl PipelineError {
    pub fn missing(what: &'static str, path: impl Into<PathBuf>) -> Self {
        Self::MissingInput {
            what,
            path: path.into(),
        }
    }

    pub fn is_missing_input(&self) -> bool {
        matches!(self, Self::MissingInput { .. })
    }
}
