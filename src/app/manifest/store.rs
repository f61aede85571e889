//! Durable storage for the manifest
//!
//! The manifest is rewritten in full after every state change. Writes go to
//! a temporary sibling first and are renamed over the real file, so a crash
//! mid-write leaves the previous version intact.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::app::manifest::types::Manifest;
use crate::constants::files;
use crate::errors::{ManifestError, ManifestResult};

/// Manifest file for one snapshot target
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a manifest has already been written for this target
    ///
    /// Errors other than "not found" are returned rather than read as
    /// absence, so an unreadable checkpoint is never planned over.
    pub async fn exists(&self) -> ManifestResult<bool> {
        Ok(tokio::fs::try_exists(&self.path).await?)
    }

    /// Load the manifest, or an empty one if no file exists yet
    pub async fn load(&self) -> ManifestResult<Manifest> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No manifest at {}, starting empty", self.path.display());
                return Ok(Manifest::new());
            }
            Err(e) => return Err(ManifestError::Io(e)),
        };

        let manifest: Manifest = serde_json::from_str(&content)?;
        debug!(
            "Loaded manifest {} with {} records",
            self.path.display(),
            manifest.len()
        );
        Ok(manifest)
    }

    /// Overwrite the manifest with `manifest`
    pub async fn save(&self, manifest: &Manifest) -> ManifestResult<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| ManifestError::InvalidPath {
                path: self.path.clone(),
            })?;
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut content = serde_json::to_string_pretty(manifest)?;
        content.push('\n');

        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, content).await?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| ManifestError::Persist {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        debug!("Saved manifest {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(files::TEMP_FILE_SUFFIX);
        self.path.with_file_name(name)
    }
}

/// Load the manifest stored at `path` (empty if absent)
pub async fn load(path: &Path) -> ManifestResult<Manifest> {
    ManifestStore::new(path).load().await
}

/// Overwrite the manifest stored at `path`
pub async fn save(path: &Path, manifest: &Manifest) -> ManifestResult<()> {
    ManifestStore::new(path).save(manifest).await
}
