//! Extraction phase

use tracing::{info, warn};

use crate::app::manifest::{Manifest, ManifestStore, Phase, PhaseState};
use crate::app::pipeline::Pipeline;
use crate::errors::ManifestResult;

impl Pipeline {
    /// Expand every downloaded archive into the shared extraction directory
    ///
    /// A corrupt or missing archive fails extraction and makes the record
    /// eligible for download again, both in the same save.
    pub(super) async fn extract_phase(
        &self,
        manifest: &mut Manifest,
        store: &ManifestStore,
    ) -> ManifestResult<()> {
        let names = manifest.eligible(Phase::Extract);
        info!("Extraction phase: {} archives to expand", names.len());

        for name in names {
            let Some(record) = manifest.get(&name) else {
                continue;
            };
            let archive = record.local_archive_path.clone();

            info!("Extracting {}", name);
            let outcome = self
                .expander
                .expand(&archive, self.workspace.extract_dir())
                .await;

            let Some(record) = manifest.get_mut(&name) else {
                continue;
            };
            match outcome {
                Ok(members) => {
                    if members.len() > 1 {
                        warn!(
                            "{} holds {} members; only the first is processed",
                            name,
                            members.len()
                        );
                    }
                    record.extracted_member_paths = members;
                    record.extract_state = PhaseState::Success;
                }
                Err(e) if e.requires_redownload() => {
                    warn!(
                        "{} is unusable and will be downloaded again on the next run: {}",
                        name, e
                    );
                    record.mark_corrupt();
                }
                Err(e) => {
                    warn!("Extraction of {} failed: {}", name, e);
                    record.extract_state = PhaseState::Failed;
                }
            }
            store.save(manifest).await?;
        }

        Ok(())
    }
}
