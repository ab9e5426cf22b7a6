use std::path::PathBuf;

use campus_store::MergeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Failed to read graph file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse graph file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write graph: {0}")]
    Write(#[from] MergeError),
}

/// A supervision cue or project leader named someone absent from the person
/// index. The edge is skipped, never guessed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unresolved name \"{mention}\" on {person}")]
pub struct GraphResolutionWarning {
    /// Identity of the profile or project carrying the mention.
    pub person: String,
    pub mention: String,
}
