//! Archive extraction
//!
//! Published snapshots are zip files holding a single delimited text member.
//! Extraction distinguishes two failure classes: a corrupt archive (bad
//! central directory, truncated data, checksum failure) which should be
//! downloaded again, and local I/O failures which should not.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::constants::encoding::BUFFER_SIZE;
use crate::errors::{ExtractError, ExtractResult};

/// Archive expansion capability used by the pipeline
#[async_trait]
pub trait Expander: Send + Sync {
    /// Expand `archive` into `destination`, returning the paths of the member
    /// files written, in archive order
    async fn expand(&self, archive: &Path, destination: &Path) -> ExtractResult<Vec<PathBuf>>;
}

/// Zip archive expander
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipExpander;

#[async_trait]
impl Expander for ZipExpander {
    async fn expand(&self, archive: &Path, destination: &Path) -> ExtractResult<Vec<PathBuf>> {
        let archive = archive.to_path_buf();
        let destination = destination.to_path_buf();

        tokio::task::spawn_blocking(move || extract_zip(&archive, &destination))
            .await
            .map_err(|e| ExtractError::Task {
                reason: e.to_string(),
            })?
    }
}

/// Extract every file member of a zip archive into `destination`
pub fn extract_zip(archive: &Path, destination: &Path) -> ExtractResult<Vec<PathBuf>> {
    let file = match File::open(archive) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ExtractError::MissingArchive {
                path: archive.to_path_buf(),
            })
        }
        Err(e) => return Err(ExtractError::Io(e)),
    };

    let mut zip = ZipArchive::new(BufReader::new(file)).map_err(|e| classify(archive, e))?;
    std::fs::create_dir_all(destination)?;

    let mut members = Vec::with_capacity(zip.len());
    let mut buffer = vec![0u8; BUFFER_SIZE];

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(|e| classify(archive, e))?;
        let relative = entry.enclosed_name().ok_or_else(|| ExtractError::Corrupt {
            path: archive.to_path_buf(),
            reason: format!("member '{}' escapes the extraction directory", entry.name()),
        })?;
        let output = destination.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&output)?;
            continue;
        }
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(&output)?);
        loop {
            // Read errors come from the archive data; write errors are local
            let read = entry.read(&mut buffer).map_err(|e| ExtractError::Corrupt {
                path: archive.to_path_buf(),
                reason: e.to_string(),
            })?;
            if read == 0 {
                break;
            }
            writer.write_all(&buffer[..read])?;
        }
        writer.flush()?;

        debug!("Extracted {} from {}", output.display(), archive.display());
        members.push(output);
    }

    Ok(members)
}

fn classify(archive: &Path, error: ZipError) -> ExtractError {
    match error {
        ZipError::Io(e)
            if e.kind() != io::ErrorKind::UnexpectedEof && e.kind() != io::ErrorKind::InvalidData =>
        {
            ExtractError::Io(e)
        }
        other => ExtractError::Corrupt {
            path: archive.to_path_buf(),
            reason: other.to_string(),
        },
    }
}
