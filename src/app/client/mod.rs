//! HTTP client for the registry's open-data file server
//!
//! The pipeline talks to the network only through the [`Fetcher`] trait:
//! one call for the snapshot's directory listing and one call per archive
//! download. [`RegistryClient`] is the reqwest-backed implementation.
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `http`: Single-attempt request helpers
//! - `download`: Streamed downloads with atomic writes
//! - `listing`: Directory listing parsing

use std::path::Path;

use async_trait::async_trait;
use url::Url;

use crate::errors::DownloadResult;

pub mod config;
pub mod download;
pub mod http;
pub mod listing;

pub use config::ClientConfig;
pub use listing::{parse_archive_links, resolve_archives, ListedArchive};

use download::DownloadHandler;
use http::HttpHandler;

/// Network capability used by the pipeline
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the HTML directory listing at `url`
    async fn fetch_listing(&self, url: &Url) -> DownloadResult<String>;

    /// Download `url` to `destination` in a single attempt, returning the
    /// number of bytes written
    async fn fetch_to_file(&self, url: &Url, destination: &Path) -> DownloadResult<u64>;
}

/// HTTP client for the registry file server
#[derive(Debug)]
pub struct RegistryClient {
    http_handler: HttpHandler,
    config: ClientConfig,
}

impl RegistryClient {
    /// Creates a client with default configuration
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if HTTP client creation fails
    pub fn new() -> DownloadResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a client with custom configuration
    pub fn with_config(config: ClientConfig) -> DownloadResult<Self> {
        let client = config.build_http_client()?;
        let http_handler = HttpHandler::new(client);

        tracing::debug!("Created registry client");

        Ok(Self {
            http_handler,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait]
impl Fetcher for RegistryClient {
    async fn fetch_listing(&self, url: &Url) -> DownloadResult<String> {
        self.http_handler
            .get_page(url, self.config.listing_timeout)
            .await
    }

    async fn fetch_to_file(&self, url: &Url, destination: &Path) -> DownloadResult<u64> {
        let download_handler = DownloadHandler::new(
            &self.http_handler,
            self.config.read_timeout,
            self.config.show_progress,
        );
        download_handler.download_file(url, destination).await
    }
}
