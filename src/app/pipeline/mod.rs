//! Phase sequencer for one monthly snapshot
//!
//! A run plans the snapshot (or resumes an existing manifest) and then walks
//! every record through download, extraction, correction and load, one file
//! at a time and one phase at a time. The manifest is saved after every
//! record outcome, so an interrupted run loses at most the in-flight step.
//!
//! # Architecture
//!
//! - [`config`] - Paths, source and retry policy
//! - [`workspace`] - Scratch directories wiped around each run
//! - [`report`] - Final summary built from the manifest
//! - `planning`, `download`, `extract`, `correct`, `load` - One phase each
//!
//! Network, archive, encoding and database work go through the capability
//! traits [`Fetcher`], [`Expander`], [`Transcoder`] and [`Loader`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cnpj_etl::app::{
//!     DatabaseConfig, EncodingNormalizer, PgLoader, Pipeline, PipelineConfig, RegistryClient,
//!     Target, ZipExpander,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = Pipeline::new(
//!     PipelineConfig::default(),
//!     Arc::new(RegistryClient::new()?),
//!     Arc::new(ZipExpander),
//!     Arc::new(EncodingNormalizer::default()),
//!     Arc::new(PgLoader::new(&DatabaseConfig::default())),
//! );
//!
//! let report = pipeline.run(&Target::new(2025, 1)?).await?;
//! println!("{}", report);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod report;
pub mod workspace;

mod correct;
mod download;
mod extract;
mod load;
mod planning;

#[cfg(test)]
mod tests;

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};

use crate::app::archive::Expander;
use crate::app::client::Fetcher;
use crate::app::encoding::Transcoder;
use crate::app::loader::Loader;
use crate::app::manifest::ManifestStore;
use crate::app::target::Target;
use crate::errors::{AppError, Result};

pub use config::{PipelineConfig, RetryPolicy};
pub use load::LoadPhaseOutcome;
pub use planning::build_manifest;
pub use report::{OutstandingFile, PhaseTally, RunReport};
pub use workspace::Workspace;

/// Sequencer for the download, extract, correct and load phases
pub struct Pipeline {
    config: PipelineConfig,
    workspace: Workspace,
    fetcher: Arc<dyn Fetcher>,
    expander: Arc<dyn Expander>,
    transcoder: Arc<dyn Transcoder>,
    loader: Arc<dyn Loader>,
}

impl Pipeline {
    /// Create a pipeline from its configuration and capabilities
    pub fn new(
        config: PipelineConfig,
        fetcher: Arc<dyn Fetcher>,
        expander: Arc<dyn Expander>,
        transcoder: Arc<dyn Transcoder>,
        loader: Arc<dyn Loader>,
    ) -> Self {
        let workspace = Workspace::new(&config.downloads_dir, &config.extract_dir);

        Self {
            config,
            workspace,
            fetcher,
            expander,
            transcoder,
            loader,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Manifest store for `target`
    pub fn manifest_store(&self, target: &Target) -> ManifestStore {
        ManifestStore::new(target.manifest_path(&self.config.destination_root))
    }

    /// Run every phase for `target` and report the outcome
    ///
    /// # Errors
    ///
    /// Returns an error only for run-fatal conditions: the configuration is
    /// invalid, planning failed, the manifest could not be read or written,
    /// or the workspace could not be prepared. Per-file failures are recorded in the manifest and in the
    /// report, and a database that cannot be reached only aborts the load
    /// phase.
    pub async fn run(&self, target: &Target) -> Result<RunReport> {
        info!("Starting pipeline for {}", target);
        self.config.validate().map_err(AppError::generic)?;

        if self.config.clean_workspace {
            self.workspace.reset().await?;
        } else {
            self.workspace.prepare().await?;
        }

        let destination = target.destination_dir(&self.config.destination_root);
        tokio::fs::create_dir_all(&destination).await?;
        let store = self.manifest_store(target);

        let mut manifest = match self.plan(target, &store).await {
            Ok(manifest) => manifest,
            Err(e) => {
                error!("Planning failed for {} [{}]: {}", target, e.category(), e);
                return Err(e);
            }
        };

        self.download_phase(&mut manifest, &store).await?;
        self.extract_phase(&mut manifest, &store).await?;
        self.correct_phase(&mut manifest, &store, &destination).await?;

        let load_phase_error = match self
            .load_phase(&mut manifest, &store, &target.schema_name())
            .await?
        {
            LoadPhaseOutcome::Completed => None,
            LoadPhaseOutcome::Aborted(e) => Some(e.to_string()),
        };

        let report = RunReport::from_manifest(target, &manifest, load_phase_error);

        if self.config.clean_workspace {
            self.workspace.clean().await?;
        }

        info!(
            "Pipeline finished for {}: {}/{} files loaded",
            target, report.succeeded, report.total
        );
        Ok(report)
    }
}

/// Report for an existing manifest without running anything
///
/// Returns `None` when `target` has never been planned.
pub async fn read_status(destination_root: &Path, target: &Target) -> Result<Option<RunReport>> {
    let store = ManifestStore::new(target.manifest_path(destination_root));
    if !store.exists().await? {
        return Ok(None);
    }

    let manifest = store.load().await?;
    Ok(Some(RunReport::from_manifest(target, &manifest, None)))
}
