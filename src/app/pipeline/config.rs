//! Configuration structures for the pipeline sequencer
//!
//! Paths, the remote source and the download retry policy are passed in
//! explicitly; nothing in the pipeline reads global state.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{files, limits, source};

/// Bounded retry for archive downloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Attempts per archive, including the first
    pub attempts: u32,
    /// Fixed pause between attempts
    #[serde(with = "humantime_serde")]
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: limits::DOWNLOAD_ATTEMPTS,
            delay: limits::RETRY_DELAY,
        }
    }
}

/// Configuration for one pipeline instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Root of the `<YYYY>/<M>. <Month>` destination tree
    pub destination_root: PathBuf,
    /// Where archives are downloaded
    pub downloads_dir: PathBuf,
    /// Shared extraction directory
    pub extract_dir: PathBuf,
    /// Base URL holding one listing per snapshot
    pub source_base_url: String,
    /// Extension identifying archives in the listing
    pub archive_extension: String,
    pub retry: RetryPolicy,
    /// Remove downloads and extraction directories at start and end of a run
    pub clean_workspace: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            destination_root: PathBuf::from(files::DESTINATION_ROOT),
            downloads_dir: PathBuf::from(files::DOWNLOADS_DIR),
            extract_dir: PathBuf::from(files::EXTRACT_DIR),
            source_base_url: source::BASE_URL.to_string(),
            archive_extension: source::ARCHIVE_EXTENSION.to_string(),
            retry: RetryPolicy::default(),
            clean_workspace: true,
        }
    }
}

impl PipelineConfig {
    /// Place every directory under `root`, as tests and sandboxes need
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            destination_root: root.join(files::DESTINATION_ROOT),
            downloads_dir: root.join(files::DOWNLOADS_DIR),
            extract_dir: root.join(files::EXTRACT_DIR),
            ..Default::default()
        }
    }

    pub fn with_source_base_url(mut self, url: impl Into<String>) -> Self {
        self.source_base_url = url.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.retry.attempts == 0 {
            return Err("Download attempts must be at least 1".to_string());
        }

        if self.archive_extension.is_empty() {
            return Err("Archive extension cannot be empty".to_string());
        }

        // Workspace directories are wiped with remove_dir_all
        let workspace = [
            ("Downloads", &self.downloads_dir),
            ("Extraction", &self.extract_dir),
        ];
        for (label, dir) in workspace {
            if overlaps(dir, &self.destination_root) {
                return Err(format!(
                    "{} directory {} overlaps the destination root {}",
                    label,
                    dir.display(),
                    self.destination_root.display()
                ));
            }
        }
        if overlaps(&self.downloads_dir, &self.extract_dir) {
            return Err("Downloads and extraction directories must not overlap".to_string());
        }

        Ok(())
    }
}

/// Whether one path equals or contains the other
fn overlaps(a: &Path, b: &Path) -> bool {
    let a = absolute(a);
    let b = absolute(b);
    a.starts_with(&b) || b.starts_with(&a)
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
