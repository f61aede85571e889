//! Streamed file downloads with atomic writes
//!
//! The response body is written chunk by chunk to a temporary sibling of the
//! destination and renamed into place once complete, so an interrupted
//! download never leaves a truncated archive under the final name.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use url::Url;

use crate::app::client::http::HttpHandler;
use crate::constants::files;
use crate::errors::{DownloadError, DownloadResult};

/// File download operations handler
pub struct DownloadHandler<'a> {
    http_handler: &'a HttpHandler,
    read_timeout: Duration,
    show_progress: bool,
}

impl<'a> DownloadHandler<'a> {
    pub fn new(http_handler: &'a HttpHandler, read_timeout: Duration, show_progress: bool) -> Self {
        Self {
            http_handler,
            read_timeout,
            show_progress,
        }
    }

    /// Downloads `url` to `destination` in a single attempt
    ///
    /// Returns the number of bytes written. An existing file at
    /// `destination` is replaced.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The server answers with a non-success status
    /// - No data arrives within the read timeout
    /// - File I/O operations fail
    pub async fn download_file(&self, url: &Url, destination: &Path) -> DownloadResult<u64> {
        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let temp_path = temp_path_for(destination);

        match self.stream_to(url, &temp_path).await {
            Ok(bytes) => {
                tokio::fs::rename(&temp_path, destination)
                    .await
                    .map_err(|_e| DownloadError::AtomicOperationFailed {
                        temp_path: temp_path.clone(),
                        final_path: destination.to_path_buf(),
                    })?;
                tracing::debug!(
                    "Downloaded {} bytes to {}",
                    bytes,
                    destination.display()
                );
                Ok(bytes)
            }
            Err(e) => {
                if tokio::fs::try_exists(&temp_path).await.unwrap_or(false) {
                    let _ = tokio::fs::remove_file(&temp_path).await;
                }
                Err(e)
            }
        }
    }

    async fn stream_to(&self, url: &Url, temp_path: &Path) -> DownloadResult<u64> {
        let response = self.http_handler.get_response(url, None).await?;
        let progress = self.progress_bar(response.content_length(), url);

        let mut writer = BufWriter::new(File::create(temp_path).await?);
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        loop {
            let next = tokio::time::timeout(self.read_timeout, stream.next())
                .await
                .map_err(|_| DownloadError::Timeout {
                    seconds: self.read_timeout.as_secs(),
                })?;
            let Some(chunk) = next else { break };
            let chunk = chunk?;
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
            progress.set_position(written);
        }

        writer.flush().await?;
        progress.finish_and_clear();
        Ok(written)
    }

    fn progress_bar(&self, total: Option<u64>, url: &Url) -> ProgressBar {
        if !self.show_progress || !atty::is(atty::Stream::Stderr) {
            return ProgressBar::hidden();
        }

        let bar = match total {
            Some(total) => ProgressBar::new(total),
            None => ProgressBar::new_spinner(),
        };
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{msg} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
        {
            bar.set_style(style.progress_chars("=> "));
        }
        let name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or("download")
            .to_string();
        bar.set_message(name);
        bar
    }
}

/// Temporary sibling used while a download is in flight
pub fn temp_path_for(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(files::TEMP_FILE_SUFFIX);
    destination.with_file_name(name)
}
