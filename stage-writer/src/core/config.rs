/*!
Configuration management for the staging writer
*/

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::StagerError;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StagerConfig {
    /// Where and how staging files are created
    pub staging: StagingConfig,
    /// Log output settings
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StagingConfig {
    /// Suffix appended to every staging file name
    pub suffix: String,
    /// Directory for staging files; defaults to the target's own directory.
    /// Must live on the same filesystem as the target for the final rename.
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` filter, overridden by `RUST_LOG`
    pub level: String,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            suffix: ".tmp".to_string(),
            directory: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl StagerConfig {
    /// `<config dir>/stage-writer/config.toml`, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("stage-writer").join("config.toml"))
    }

    /// Load from `path`, or from [`StagerConfig::default_path`] when it exists,
    /// falling back to defaults
    pub async fn load(path: Option<&Path>) -> Result<Self, StagerError> {
        match path {
            Some(path) => Self::from_file(path).await,
            None => match Self::default_path() {
                Some(path) if tokio::fs::try_exists(&path).await.unwrap_or(false) => {
                    Self::from_file(&path).await
                }
                _ => Ok(Self::default()),
            },
        }
    }

    pub async fn from_file(path: &Path) -> Result<Self, StagerError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| StagerError::ConfigRead {
                path: path.to_path_buf(),
                source,
            })?;
        toml::from_str(&content).map_err(|source| StagerError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}
