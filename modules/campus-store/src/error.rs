use std::path::PathBuf;

use campus_common::DatasetKind;
use thiserror::Error;

/// Persistence failure. Aborts the synchronization pass; the previous
/// dataset file is left untouched.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Deserialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize dataset: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to replace {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Dataset {0} expects a different shape")]
    ShapeMismatch(DatasetKind),
}
