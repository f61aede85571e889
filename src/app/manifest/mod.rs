//! Progress manifest for a snapshot run
//!
//! The manifest is the pipeline's checkpoint and audit trail: one
//! [`FileRecord`] per published archive, persisted as human-readable JSON
//! after every state change. A run that finds an existing manifest resumes
//! from it instead of planning again, and operators may hand-edit a state
//! back to `pending` between runs to force a retry.
//!
//! # Module Organization
//!
//! - [`types`] - `Manifest`, `FileRecord`, `Phase` and `PhaseState`
//! - [`store`] - Atomic load/save of the JSON file
//!
//! # Examples
//!
//! ```rust,no_run
//! use cnpj_etl::app::manifest::{FileRecord, Manifest, ManifestStore, Phase, PhaseState};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = ManifestStore::new("dados_cnpj/2025/1. Janeiro/manifest.json");
//! let mut manifest = store.load().await?;
//!
//! manifest.insert(
//!     "Empresas0.zip",
//!     FileRecord::new("https://example.org/2025-01/Empresas0.zip", "downloads/Empresas0.zip"),
//! );
//! if let Some(record) = manifest.get_mut("Empresas0.zip") {
//!     record.set_state(Phase::Download, PhaseState::Success);
//! }
//! store.save(&manifest).await?;
//! # Ok(())
//! # }
//! ```

pub mod store;
pub mod types;

pub use store::{load, save, ManifestStore};
pub use types::{FileRecord, Manifest, Phase, PhaseState};
