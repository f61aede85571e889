//! Core application logic for the CNPJ ETL
//!
//! This module contains the pipeline components: the snapshot target, the
//! registry HTTP client, the progress manifest, archive extraction, encoding
//! normalization, database loading and the phase sequencer tying them
//! together.
//!
//! # Examples
//!
//! ```rust,no_run
//! use cnpj_etl::app::{ManifestStore, Phase, PhaseState, Target};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let target = Target::parse("2025", "3")?;
//! let store = ManifestStore::new(target.manifest_path("dados_cnpj".as_ref()));
//!
//! let manifest = store.load().await?;
//! println!(
//!     "{}: {} of {} files loaded",
//!     target,
//!     manifest.count(Phase::Load, PhaseState::Success),
//!     manifest.len()
//! );
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod client;
pub mod encoding;
pub mod loader;
pub mod manifest;
pub mod pipeline;
pub mod target;

// Re-export main public API
pub use archive::{Expander, ZipExpander};
pub use client::{ClientConfig, Fetcher, RegistryClient};
pub use encoding::{EncodingNormalizer, NormalizeReport, Transcoder};
pub use loader::{DatabaseConfig, Loader, PgLoader};
pub use manifest::{FileRecord, Manifest, ManifestStore, Phase, PhaseState};
pub use pipeline::{read_status, Pipeline, PipelineConfig, RetryPolicy, RunReport};
pub use target::Target;
