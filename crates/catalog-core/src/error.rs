use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while walking and parsing an input filesystem tree.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("reading input tree: {0}")]
    Io(#[from] std::io::Error),

    #[error("walking {path}: {source}")]
    Dir {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("parsing {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("parsing {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("walk cancelled")]
    Cancelled,
}
