use crate::style::css_matcher::SelectorError;
use std::path::PathBuf;

/// Errors from the library's fallible entry points. Matching itself never fails.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("invalid query selector: {0}")]
    Query(#[from] SelectorError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
