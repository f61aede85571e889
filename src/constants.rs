//! Application constants for the CNPJ ETL pipeline
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain.

use std::time::Duration;

/// Environment variable names for database settings
pub mod env {
    /// Database host
    pub const DB_HOST: &str = "CNPJ_DB_HOST";

    /// Database port
    pub const DB_PORT: &str = "CNPJ_DB_PORT";

    /// Database user
    pub const DB_USER: &str = "CNPJ_DB_USER";

    /// Database password
    pub const DB_PASSWORD: &str = "CNPJ_DB_PASSWORD";

    /// Database name
    pub const DB_NAME: &str = "CNPJ_DB_NAME";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = "cnpj-etl/0.1.0 (open data loader)";

    /// Timeout for the whole directory listing request
    pub const LISTING_TIMEOUT: Duration = Duration::from_secs(60);

    /// Maximum time without receiving data during a download
    pub const READ_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum number of redirects to follow
    pub const MAX_REDIRECTS: usize = 10;
}

/// Retry policy for archive downloads
pub mod limits {
    use super::Duration;

    /// Attempts per archive before it is recorded as failed
    pub const DOWNLOAD_ATTEMPTS: u32 = 3;

    /// Fixed pause after a failed attempt
    pub const RETRY_DELAY: Duration = Duration::from_secs(5);
}

/// Remote source of the snapshots
pub mod source {
    /// Directory holding one sub-directory per `YYYY-MM` snapshot
    pub const BASE_URL: &str = "https://arquivos.receitafederal.gov.br/dados/cnpj/dados_abertos_cnpj";

    /// CSS selector for hyperlinks in the listing
    pub const LINK_SELECTOR: &str = "a[href]";

    /// Extension of the published archives
    pub const ARCHIVE_EXTENSION: &str = ".zip";
}

/// File operation constants
pub mod files {
    /// Temporary file suffix for atomic operations
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// Manifest file name inside each destination directory
    pub const MANIFEST_FILE_NAME: &str = "manifest.json";

    /// Marker inserted between stem and extension of corrected files
    pub const CORRECTED_MARKER: &str = "__corrigido";

    /// Default downloads directory
    pub const DOWNLOADS_DIR: &str = "downloads";

    /// Default shared extraction directory
    pub const EXTRACT_DIR: &str = "extracted";

    /// Default destination root
    pub const DESTINATION_ROOT: &str = "dados_cnpj";
}

/// Encoding normalization constants
pub mod encoding {
    /// Bytes sampled from the start of a file for encoding detection
    pub const SNIFF_SAMPLE_BYTES: usize = 100_000;

    /// Buffer size for streaming decode/encode passes
    pub const BUFFER_SIZE: usize = 64 * 1024;

    /// UTF-8 byte order mark written at the start of corrected files
    pub const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
}

/// Database loading constants
pub mod load {
    /// Rows sent to the database per batch
    pub const BATCH_ROWS: usize = 50_000;

    /// Field delimiter of the published files
    pub const DELIMITER: u8 = b';';

    /// Prefix of the per-snapshot schema name
    pub const SCHEMA_PREFIX: &str = "rfb_";

    /// Default PostgreSQL port
    pub const DEFAULT_PORT: u16 = 5432;

    /// Time allowed to acquire a database connection
    pub const ACQUIRE_TIMEOUT_SECS: u64 = 30;
}

/// Logging constants
pub mod logging {
    /// Default log level
    pub const DEFAULT_LOG_LEVEL: &str = "info";
}

// Re-export commonly used constants for convenience
pub use files::{CORRECTED_MARKER, MANIFEST_FILE_NAME, TEMP_FILE_SUFFIX};
pub use http::USER_AGENT;
pub use limits::{DOWNLOAD_ATTEMPTS, RETRY_DELAY};
pub use source::ARCHIVE_EXTENSION;
