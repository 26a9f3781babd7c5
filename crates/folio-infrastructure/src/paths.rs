//! Path layout for a Folio site root.
//!
//! # Directory Structure
//!
//! ```text
//! <root>/
//! ├── data/                     # canonical content, one file per type
//! │   └── footer.json
//! ├── backups/                  # archived versions
//! │   └── 2024-03-05T07-08-09-123Z_footer.json
//! └── credentials.json          # salted admin password digests
//! ```

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FolioPaths {
    root: PathBuf,
}

impl FolioPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.root.join("backups")
    }

    pub fn credentials_file(&self) -> PathBuf {
        self.root.join("credentials.json")
    }

    /// Canonical location of a content file.
    pub fn content_file(&self, file_name: &str) -> PathBuf {
        self.data_dir().join(file_name)
    }

    /// Location of an archived version.
    pub fn version_file(&self, version_file_name: &str) -> PathBuf {
        self.backups_dir().join(version_file_name)
    }

    /// Creates `data/` and `backups/` if missing.
    pub async fn ensure_dirs(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(self.data_dir()).await?;
        tokio::fs::create_dir_all(self.backups_dir()).await?;
        Ok(())
    }
}
