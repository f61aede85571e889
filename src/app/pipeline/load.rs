//! Load phase: route corrected files to tables and verify row counts

use std::path::Path;

use tracing::{error, info, warn};

use crate::app::loader::table_for;
use crate::app::manifest::{Manifest, ManifestStore, Phase, PhaseState};
use crate::app::pipeline::Pipeline;
use crate::errors::{LoadError, LoadResult, ManifestResult};

/// How the load phase ended
#[derive(Debug)]
pub enum LoadPhaseOutcome {
    /// Every eligible record reached a terminal load state
    Completed,
    /// The schema could not be prepared; no record was touched
    Aborted(LoadError),
}

impl Pipeline {
    /// Load every corrected record into its table in `schema`
    pub(super) async fn load_phase(
        &self,
        manifest: &mut Manifest,
        store: &ManifestStore,
        schema: &str,
    ) -> ManifestResult<LoadPhaseOutcome> {
        if let Err(e) = self.loader.ensure_schema(schema).await {
            error!("Load phase aborted, schema {} unavailable: {}", schema, e);
            return Ok(LoadPhaseOutcome::Aborted(e));
        }

        let names = manifest.eligible(Phase::Load);
        info!("Load phase: {} files to load into {}", names.len(), schema);

        for name in names {
            let Some(record) = manifest.get(&name) else {
                continue;
            };
            let corrected = record.corrected_path.clone();
            let expected = record.validated_line_count;

            let state = match corrected {
                None => {
                    warn!(
                        "Load of {} failed: {}",
                        name,
                        LoadError::MissingCorrectedPath { file: name.clone() }
                    );
                    PhaseState::Failed
                }
                Some(corrected) => match table_for(&corrected) {
                    None => {
                        info!("No table for {}, skipping", corrected.display());
                        PhaseState::Skipped
                    }
                    Some(table) => {
                        match self
                            .load_file(&name, schema, table, &corrected, expected)
                            .await
                        {
                            Ok(state) => state,
                            Err(e) => {
                                warn!("Load of {} into {}.{} failed: {}", name, schema, table, e);
                                PhaseState::Failed
                            }
                        }
                    }
                },
            };

            if let Some(record) = manifest.get_mut(&name) {
                record.load_state = state;
            }
            store.save(manifest).await?;
        }

        Ok(LoadPhaseOutcome::Completed)
    }

    /// Replace the contents of `schema.table` with `file` and compare the
    /// resulting row count with the validated line count
    async fn load_file(
        &self,
        name: &str,
        schema: &str,
        table: &str,
        file: &Path,
        expected: Option<u64>,
    ) -> LoadResult<PhaseState> {
        let expected = expected.ok_or_else(|| LoadError::MissingLineCount {
            file: name.to_string(),
        })?;

        info!("Loading {} into {}.{}", file.display(), schema, table);
        self.loader.truncate(schema, table).await?;
        let sent = self.loader.bulk_insert(schema, table, file).await?;
        let rows = self.loader.count_rows(schema, table).await?;

        if rows == expected {
            info!("Load validation ok for {}: {} rows", name, rows);
            Ok(PhaseState::Success)
        } else {
            warn!(
                "Load validation failed for {}: {} lines (file) vs {} rows (table), {} sent",
                name, expected, rows, sent
            );
            Ok(PhaseState::Failed)
        }
    }
}
