//! Planning: build the manifest from the snapshot's listing

use std::path::Path;

use tracing::info;
use url::Url;

use crate::app::client::{parse_archive_links, resolve_archives};
use crate::app::manifest::{FileRecord, Manifest, ManifestStore};
use crate::app::pipeline::Pipeline;
use crate::app::target::Target;
use crate::errors::{ListingError, ListingResult, Result};

impl Pipeline {
    /// Resume the existing manifest or create one from the remote listing
    ///
    /// Nothing is written unless the listing yields at least one archive.
    pub(super) async fn plan(&self, target: &Target, store: &ManifestStore) -> Result<Manifest> {
        if store.exists().await? {
            let manifest = store.load().await?;
            info!(
                "Manifest found at {}, resuming {} files",
                store.path().display(),
                manifest.len()
            );
            return Ok(manifest);
        }

        let listing_url = target.listing_url(&self.config.source_base_url)?;
        info!("Fetching archive list from {}", listing_url);

        let html = self
            .fetcher
            .fetch_listing(&listing_url)
            .await
            .map_err(|source| ListingError::Fetch {
                url: listing_url.to_string(),
                source,
            })?;

        let manifest = build_manifest(
            &listing_url,
            &html,
            &self.config.archive_extension,
            self.workspace.downloads_dir(),
        )?;
        store.save(&manifest).await?;

        info!("Archives found: {}", manifest.len());
        Ok(manifest)
    }
}

/// Fresh manifest for every archive linked from `html`, all phases pending
pub fn build_manifest(
    listing_url: &Url,
    html: &str,
    extension: &str,
    downloads_dir: &Path,
) -> ListingResult<Manifest> {
    let hrefs = parse_archive_links(html, extension)?;
    let archives = resolve_archives(listing_url, &hrefs)?;

    if archives.is_empty() {
        return Err(ListingError::NoArchives {
            url: listing_url.to_string(),
            extension: extension.to_string(),
        });
    }

    let mut manifest = Manifest::new();
    for archive in archives {
        let record = FileRecord::new(archive.url.to_string(), downloads_dir.join(&archive.name));
        manifest.insert(archive.name, record);
    }
    Ok(manifest)
}
