//! Configuration service implementation.
//!
//! Loads `FolioConfig` from a TOML file. Without an explicit path the
//! service looks for `folio.toml` in the working directory and falls back
//! to built-in defaults when that file is absent.

use folio_core::config::FolioConfig;
use folio_core::{FolioError, Result};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "folio.toml";

#[derive(Debug, Clone, Default)]
pub struct ConfigService {
    /// Explicitly requested file; must exist when set.
    path: Option<PathBuf>,
}

impl ConfigService {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// The file that `load` will read, if any.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        match &self.path {
            Some(path) => Some(path.clone()),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                fallback.is_file().then_some(fallback)
            }
        }
    }

    /// Reads, parses and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `FolioError::Config` when an explicit path is missing, the
    /// file is not valid TOML, or a value is out of range.
    pub async fn load(&self) -> Result<FolioConfig> {
        let config = match self.resolved_path() {
            Some(path) => Self::load_file(&path).await?,
            None => {
                tracing::debug!("No configuration file found; using defaults");
                FolioConfig::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    async fn load_file(path: &Path) -> Result<FolioConfig> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            FolioError::config(format!("cannot read {}: {}", path.display(), e))
        })?;

        let config: FolioConfig = toml::from_str(&content).map_err(|e| {
            FolioError::config(format!("invalid TOML in {}: {}", path.display(), e))
        })?;

        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }
}
