//! Correction phase: re-encode and validate line counts

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::app::encoding::corrected_path;
use crate::app::manifest::{Manifest, ManifestStore, Phase, PhaseState};
use crate::app::pipeline::Pipeline;
use crate::errors::{ManifestResult, TranscodeError, TranscodeResult};

/// Result of correcting one record
struct Correction {
    corrected_path: Option<PathBuf>,
    state: PhaseState,
    line_count: Option<u64>,
}

impl Correction {
    fn failed(corrected_path: Option<PathBuf>) -> Self {
        Self {
            corrected_path,
            state: PhaseState::Failed,
            line_count: None,
        }
    }
}

impl Pipeline {
    /// Normalize the first member of every extracted record into the
    /// destination directory
    pub(super) async fn correct_phase(
        &self,
        manifest: &mut Manifest,
        store: &ManifestStore,
        destination: &Path,
    ) -> ManifestResult<()> {
        let names = manifest.eligible(Phase::Correct);
        info!("Correction phase: {} files to normalize", names.len());

        for name in names {
            let Some(record) = manifest.get(&name) else {
                continue;
            };
            let member = record.primary_member().cloned();

            let correction = match plan_output(&name, member.as_deref(), destination) {
                Ok((member, output)) => self.correct_file(&name, &member, output).await,
                Err(e) => {
                    warn!("Correction of {} failed: {}", name, e);
                    Correction::failed(None)
                }
            };

            if let Some(record) = manifest.get_mut(&name) {
                if correction.corrected_path.is_some() {
                    record.corrected_path = correction.corrected_path;
                }
                if correction.line_count.is_some() {
                    record.validated_line_count = correction.line_count;
                }
                record.correct_state = correction.state;
            }
            store.save(manifest).await?;
        }

        Ok(())
    }

    async fn correct_file(&self, name: &str, member: &Path, output: PathBuf) -> Correction {
        info!("Correcting {}", member.display());

        match self.transcoder.normalize(member, &output).await {
            Ok(report) if report.is_lossless() => {
                info!(
                    "Line validation ok for {}: {} lines ({})",
                    name, report.output_lines, report.source_encoding
                );
                Correction {
                    corrected_path: Some(output),
                    state: PhaseState::Success,
                    line_count: Some(report.output_lines),
                }
            }
            Ok(report) => {
                warn!(
                    "Line validation failed for {}: {} lines (source) vs {} (corrected)",
                    name, report.source_lines, report.output_lines
                );
                Correction::failed(Some(output))
            }
            Err(e) => {
                warn!("Correction of {} failed: {}", name, e);
                Correction::failed(Some(output))
            }
        }
    }
}

/// Member to read and corrected file to write for one record
fn plan_output(
    name: &str,
    member: Option<&Path>,
    destination: &Path,
) -> TranscodeResult<(PathBuf, PathBuf)> {
    let member = member.ok_or_else(|| TranscodeError::NoMember {
        file: name.to_string(),
    })?;
    let output = corrected_path(member, destination)?;
    Ok((member.to_path_buf(), output))
}
