//! Download phase with bounded, fixed-delay retry

use std::path::Path;

use tracing::{info, warn};
use url::Url;

use crate::app::manifest::{Manifest, ManifestStore, Phase, PhaseState};
use crate::app::pipeline::Pipeline;
use crate::errors::{DownloadError, DownloadResult, ManifestResult};

impl Pipeline {
    /// Download every record whose download is pending
    pub(super) async fn download_phase(
        &self,
        manifest: &mut Manifest,
        store: &ManifestStore,
    ) -> ManifestResult<()> {
        let names = manifest.eligible(Phase::Download);
        info!("Download phase: {} files to fetch", names.len());

        for name in names {
            let Some(record) = manifest.get(&name) else {
                continue;
            };
            let source_url = record.source_url.clone();
            let archive_path = record.local_archive_path.clone();

            let state = match self.download_with_retry(&source_url, &archive_path).await {
                Ok(bytes) => {
                    info!("Downloaded {} ({} bytes)", name, bytes);
                    PhaseState::Success
                }
                Err(e) => {
                    warn!("Download of {} failed: {}", name, e);
                    PhaseState::Failed
                }
            };

            if let Some(record) = manifest.get_mut(&name) {
                record.download_state = state;
                // A fresh archive gets a fresh extraction attempt
                if state.is_success() && record.extract_state == PhaseState::Failed {
                    record.extract_state = PhaseState::Pending;
                }
            }
            store.save(manifest).await?;
        }

        Ok(())
    }

    async fn download_with_retry(
        &self,
        source_url: &str,
        destination: &Path,
    ) -> DownloadResult<u64> {
        let url = Url::parse(source_url).map_err(|e| DownloadError::InvalidUrl {
            url: source_url.to_string(),
            error: e.to_string(),
        })?;

        let policy = self.config.retry;
        let attempts = policy.attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            info!("Downloading {} (attempt {}/{})", url, attempt, attempts);

            match self.fetcher.fetch_to_file(&url, destination).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) => {
                    warn!("Attempt {}/{} for {} failed: {}", attempt, attempts, url, e);
                    last_error = e.to_string();
                }
            }

            if attempt < attempts && !policy.delay.is_zero() {
                tokio::time::sleep(policy.delay).await;
            }
        }

        Err(DownloadError::AttemptsExhausted {
            attempts,
            last_error,
        })
    }
}
