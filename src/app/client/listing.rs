//! Directory listing parser
//!
//! The registry publishes each snapshot as a plain HTML directory index. The
//! archive set is every hyperlink whose target ends in the archive extension.

use scraper::{Html, Selector};
use url::Url;

use crate::constants::source;
use crate::errors::{ListingError, ListingResult};

/// One archive advertised by the listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedArchive {
    /// File name, used as the manifest key and local file name
    pub name: String,
    /// Absolute download URL
    pub url: Url,
}

/// Extracts hyperlink targets ending in `extension`, in document order,
/// keeping the first occurrence of duplicates
pub fn parse_archive_links(html: &str, extension: &str) -> ListingResult<Vec<String>> {
    let document = Html::parse_document(html);
    let selector =
        Selector::parse(source::LINK_SELECTOR).map_err(|_| ListingError::InvalidSelector {
            selector: source::LINK_SELECTOR.to_string(),
        })?;

    let mut links: Vec<String> = Vec::new();
    for href in document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| href.ends_with(extension))
    {
        if !links.iter().any(|existing| existing == href) {
            links.push(href.to_string());
        }
    }

    Ok(links)
}

/// Resolves listing hrefs against the listing URL
///
/// The manifest key is the last path segment of the resolved URL (kept
/// percent-encoded), which for the usual relative links is the href itself.
pub fn resolve_archives(listing_url: &Url, hrefs: &[String]) -> ListingResult<Vec<ListedArchive>> {
    let mut archives: Vec<ListedArchive> = Vec::with_capacity(hrefs.len());

    for href in hrefs {
        let url = listing_url
            .join(href)
            .map_err(|_| ListingError::InvalidLink { href: href.clone() })?;
        let name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ListingError::InvalidLink { href: href.clone() })?;

        if archives.iter().any(|archive| archive.name == name) {
            continue;
        }
        archives.push(ListedArchive { name, url });
    }

    Ok(archives)
}
