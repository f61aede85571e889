//! CNPJ ETL Library
//!
//! A resumable pipeline that loads the Brazilian federal revenue service's
//! monthly CNPJ open-data snapshot into PostgreSQL: plan from the published
//! listing, download, extract, re-encode and validate, then bulk load with
//! row-count verification. Progress is checkpointed in a per-snapshot JSON
//! manifest so an interrupted run resumes where it stopped.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};

#[cfg(test)]
mod tests {
    use super::*;
    use constants::*;

    #[test]
    fn test_constants_accessible() {
        assert_eq!(DOWNLOAD_ATTEMPTS, 3);
        assert_eq!(MANIFEST_FILE_NAME, "manifest.json");
        assert!(USER_AGENT.contains("cnpj-etl"));
    }

    #[test]
    fn test_error_types() {
        let listing_error = errors::ListingError::NoArchives {
            url: "https://example.org/2025-01/".to_string(),
            extension: ".zip".to_string(),
        };
        let app_error = AppError::Listing(listing_error);

        assert_eq!(app_error.category(), "planning");
        assert!(!app_error.is_recoverable());
    }
}
