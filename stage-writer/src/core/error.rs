/*!
Errors surfaced by the staging writer
*/

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StagerError {
    #[error("failed to read config {path:?}: {source}")]
    ConfigRead { path: PathBuf, source: io::Error },

    #[error("invalid config {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("target {0:?} has no file name")]
    NoFileName(PathBuf),

    #[error("failed to {action} {path:?}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        source: io::Error,
    },

    #[error("write interrupted before {0:?} was replaced")]
    Interrupted(PathBuf),

    #[error("staging task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl StagerError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| StagerError::Io {
            action,
            path,
            source,
        }
    }
}
