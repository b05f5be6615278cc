// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Fatal failures of a staging run. Cell-level coercion problems never show up here;
/// they become nulls in the dataset.
#[derive(Debug, Error)]
pub enum StagingError {
    #[error("source `{source_file}` unavailable: {reason}")]
    SourceUnavailable { source_file: String, reason: String },

    #[error("source `{source_file}` is not valid {encoding}")]
    Undecodable {
        source_file: String,
        encoding: &'static str,
    },

    #[error("source `{source_file}` could not be split into records: {reason}")]
    Malformed { source_file: String, reason: String },

    #[error("could not persist staging dataset to {}: {reason}", path.display())]
    Persist { path: PathBuf, reason: String },
}
