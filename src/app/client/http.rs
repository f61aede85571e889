//! Core HTTP operations
//!
//! Single-attempt request helpers. Retrying is the download phase's job, so
//! every error here is reported straight back to the caller.

use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::errors::{DownloadError, DownloadResult};

/// HTTP operations handler
#[derive(Debug, Clone)]
pub struct HttpHandler {
    client: Client,
}

impl HttpHandler {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Sends a GET request and checks the response status
    ///
    /// `timeout` bounds the whole request including the body, and is left
    /// unset for streamed downloads.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::ServerError` for non-success statuses and
    /// `DownloadError::Http` for transport failures
    pub async fn get_response(
        &self,
        url: &Url,
        timeout: Option<Duration>,
    ) -> DownloadResult<reqwest::Response> {
        let mut request = self.client.get(url.as_str());
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!("GET {} returned HTTP {}", url, status);
            return Err(DownloadError::ServerError {
                status: status.as_u16(),
            });
        }

        tracing::debug!("Successfully fetched response: {}", url);
        Ok(response)
    }

    /// Fetches the body of a page as text
    pub async fn get_page(&self, url: &Url, timeout: Duration) -> DownloadResult<String> {
        let response = self.get_response(url, Some(timeout)).await?;
        let text = response.text().await?;
        tracing::debug!("Fetched page {} ({} bytes)", url, text.len());
        Ok(text)
    }

    /// Get a reference to the underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }
}
