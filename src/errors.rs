//! Error types for the CNPJ ETL pipeline
//!
//! Each pipeline concern has its own error enum so that failures can be
//! scoped to one file and one phase. Only two classes are fatal for a run:
//! planning failures (no manifest can be produced) and database
//! infrastructure failures (the load phase is aborted for every file).

use std::path::PathBuf;
use thiserror::Error;

/// Invalid year/month input
#[derive(Error, Debug)]
pub enum TargetError {
    /// Year could not be parsed as a number
    #[error("Invalid year: '{input}'. Expected a four digit year such as 2025")]
    InvalidYear { input: String },

    /// Month could not be parsed as a number
    #[error("Invalid month: '{input}'. Expected a number between 1 and 12")]
    InvalidMonth { input: String },

    /// Parsed values do not form a calendar month we can process
    #[error("Year/month out of range: {year}-{month:02}")]
    OutOfRange { year: i32, month: u32 },
}

/// Download and HTTP client errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error during file operations
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No data received within the read timeout
    #[error("Download stalled: no data received for {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Invalid URL provided
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Server returned error status
    #[error("Server error: HTTP {status}")]
    ServerError { status: u16 },

    /// Atomic file operation failed
    #[error("Atomic file operation failed: could not rename {temp_path} to {final_path}")]
    AtomicOperationFailed {
        temp_path: PathBuf,
        final_path: PathBuf,
    },

    /// All attempts failed
    #[error("Download failed after {attempts} attempts: {last_error}")]
    AttemptsExhausted { attempts: u32, last_error: String },
}

/// Directory listing errors raised during planning
#[derive(Error, Debug)]
pub enum ListingError {
    /// Listing page could not be fetched
    #[error("Failed to fetch directory listing {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: DownloadError,
    },

    /// CSS selector error
    #[error("Invalid CSS selector: {selector}")]
    InvalidSelector { selector: String },

    /// A hyperlink could not be resolved against the listing URL
    #[error("Invalid archive link '{href}' in listing")]
    InvalidLink { href: String },

    /// The listing contains no archives
    #[error("No '{extension}' archives found at {url}")]
    NoArchives { url: String, extension: String },
}

/// Manifest persistence errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// JSON parsing error
    #[error("JSON error in manifest: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// I/O error reading or writing the manifest
    #[error("I/O error on manifest: {0}")]
    Io(#[from] std::io::Error),

    /// Temp file could not replace the manifest
    #[error("Could not persist manifest to {path}: {reason}")]
    Persist { path: PathBuf, reason: String },

    /// Manifest path has no parent directory
    #[error("Invalid manifest path: {path}")]
    InvalidPath { path: PathBuf },
}

/// Archive extraction errors
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Archive is unreadable; the download should be repeated
    #[error("Corrupt archive {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// Archive file is not on disk
    #[error("Archive not found: {path}")]
    MissingArchive { path: PathBuf },

    /// I/O error while writing members
    #[error("I/O error during extraction: {0}")]
    Io(#[from] std::io::Error),

    /// Blocking extraction task did not complete
    #[error("Extraction task failed: {reason}")]
    Task { reason: String },
}

impl ExtractError {
    /// Whether this failure should make the archive eligible for re-download
    pub fn requires_redownload(&self) -> bool {
        matches!(
            self,
            ExtractError::Corrupt { .. } | ExtractError::MissingArchive { .. }
        )
    }
}

/// Encoding normalization errors
#[derive(Error, Debug)]
pub enum TranscodeError {
    /// I/O error reading the source or writing the output
    #[error("I/O error during transcoding: {0}")]
    Io(#[from] std::io::Error),

    /// Record has nothing to transcode
    #[error("No extracted member available for {file}")]
    NoMember { file: String },

    /// Source file name cannot produce an output name
    #[error("Cannot derive corrected file name from {path}")]
    InvalidName { path: PathBuf },

    /// Blocking transcoding task did not complete
    #[error("Transcoding task failed: {reason}")]
    Task { reason: String },
}

/// Database load errors
#[derive(Error, Debug)]
pub enum LoadError {
    /// Database driver error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Delimited file could not be parsed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error reading the corrected file
    #[error("I/O error during load: {0}")]
    Io(#[from] std::io::Error),

    /// Record reached the load phase without a validated line count
    #[error("No validated line count recorded for {file}")]
    MissingLineCount { file: String },

    /// Record reached the load phase without a corrected file
    #[error("No corrected file recorded for {file}")]
    MissingCorrectedPath { file: String },

    /// Blocking parse task did not complete
    #[error("Load task failed: {reason}")]
    Task { reason: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    /// Configuration could not be rendered
    #[error("Could not serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// No user configuration directory on this platform
    #[error("Could not determine user config directory")]
    NoConfigDir,
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid year/month
    #[error(transparent)]
    Target(#[from] TargetError),

    /// Download error
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Planning error
    #[error(transparent)]
    Listing(#[from] ListingError),

    /// Manifest error
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Extraction error
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// Transcoding error
    #[error(transparent)]
    Transcode(#[from] TranscodeError),

    /// Database load error
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable (transient)
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Download(DownloadError::Timeout { .. })
            | AppError::Download(DownloadError::Http(_))
            | AppError::Listing(ListingError::Fetch { .. }) => true,

            AppError::Extract(e) => e.requires_redownload(),

            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Target(_) => "target",
            AppError::Download(_) => "download",
            AppError::Listing(_) => "planning",
            AppError::Manifest(_) => "manifest",
            AppError::Extract(_) => "extract",
            AppError::Transcode(_) => "correct",
            AppError::Load(_) => "load",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Download result type alias
pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// Listing result type alias
pub type ListingResult<T> = std::result::Result<T, ListingError>;

/// Manifest result type alias
pub type ManifestResult<T> = std::result::Result<T, ManifestError>;

/// Extraction result type alias
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

/// Transcoding result type alias
pub type TranscodeResult<T> = std::result::Result<T, TranscodeError>;

/// Load result type alias
pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
