//! Scratch directories used during a run
//!
//! Downloads and extracted members only live for the duration of one run;
//! the corrected files and the manifest live in the destination tree.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

/// Downloads and extraction directories of one pipeline
#[derive(Debug, Clone)]
pub struct Workspace {
    downloads_dir: PathBuf,
    extract_dir: PathBuf,
}

impl Workspace {
    pub fn new(downloads_dir: impl Into<PathBuf>, extract_dir: impl Into<PathBuf>) -> Self {
        Self {
            downloads_dir: downloads_dir.into(),
            extract_dir: extract_dir.into(),
        }
    }

    pub fn downloads_dir(&self) -> &Path {
        &self.downloads_dir
    }

    pub fn extract_dir(&self) -> &Path {
        &self.extract_dir
    }

    /// Remove leftovers of previous runs and recreate both directories empty
    pub async fn reset(&self) -> io::Result<()> {
        self.clean().await?;
        tokio::fs::create_dir_all(&self.downloads_dir).await?;
        tokio::fs::create_dir_all(&self.extract_dir).await?;
        Ok(())
    }

    /// Create both directories without removing anything
    pub async fn prepare(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.downloads_dir).await?;
        tokio::fs::create_dir_all(&self.extract_dir).await?;
        Ok(())
    }

    /// Remove both directories and their contents
    pub async fn clean(&self) -> io::Result<()> {
        for dir in [&self.downloads_dir, &self.extract_dir] {
            match tokio::fs::remove_dir_all(dir).await {
                Ok(()) => info!("Removed temporary directory {}", dir.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("Temporary directory {} not present", dir.display())
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
