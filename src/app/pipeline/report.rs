//! Final run report
//!
//! Built from the manifest alone, so the same report is produced at the end
//! of a run and by the read-only `status` command.

use std::fmt;

use serde::Serialize;

use crate::app::manifest::{Manifest, Phase, PhaseState};

/// A record whose load did not succeed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutstandingFile {
    pub name: String,
    pub load_state: PhaseState,
}

/// State counts for one phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PhaseTally {
    pub pending: usize,
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl PhaseTally {
    fn for_phase(manifest: &Manifest, phase: Phase) -> Self {
        Self {
            pending: manifest.count(phase, PhaseState::Pending),
            success: manifest.count(phase, PhaseState::Success),
            failed: manifest.count(phase, PhaseState::Failed),
            skipped: manifest.count(phase, PhaseState::Skipped),
        }
    }
}

/// Summary of a snapshot's progress
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Snapshot label (`YYYY-MM`)
    pub target: String,
    pub total: usize,
    /// Records with `load_state = success`
    pub succeeded: usize,
    /// Every other record, in manifest order
    pub outstanding: Vec<OutstandingFile>,
    /// Per-phase state counts in phase order
    pub tallies: Vec<(Phase, PhaseTally)>,
    /// Why the load phase was aborted, if it was
    pub load_phase_error: Option<String>,
}

impl RunReport {
    pub fn from_manifest(
        target: impl fmt::Display,
        manifest: &Manifest,
        load_phase_error: Option<String>,
    ) -> Self {
        let outstanding: Vec<OutstandingFile> = manifest
            .iter()
            .filter(|(_, record)| !record.load_state.is_success())
            .map(|(name, record)| OutstandingFile {
                name: name.clone(),
                load_state: record.load_state,
            })
            .collect();

        Self {
            target: target.to_string(),
            total: manifest.len(),
            succeeded: manifest.len() - outstanding.len(),
            outstanding,
            tallies: Phase::ALL
                .iter()
                .map(|phase| (*phase, PhaseTally::for_phase(manifest, *phase)))
                .collect(),
            load_phase_error,
        }
    }

    /// Whether every record has been loaded
    pub fn is_complete(&self) -> bool {
        self.outstanding.is_empty() && self.load_phase_error.is_none()
    }

    pub fn failed_or_pending(&self) -> usize {
        self.outstanding.len()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Final report for {}", self.target)?;
        writeln!(f, "=====================")?;
        writeln!(f, "Files loaded: {}", self.succeeded)?;
        writeln!(f, "Files failed or pending: {}", self.failed_or_pending())?;

        writeln!(f)?;
        writeln!(f, "Phase        pending  success  failed  skipped")?;
        for (phase, tally) in &self.tallies {
            writeln!(
                f,
                "{:<12} {:>7}  {:>7}  {:>6}  {:>7}",
                phase.name(),
                tally.pending,
                tally.success,
                tally.failed,
                tally.skipped
            )?;
        }

        if let Some(error) = &self.load_phase_error {
            writeln!(f)?;
            writeln!(f, "Load phase aborted: {}", error)?;
        }

        if !self.outstanding.is_empty() {
            writeln!(f)?;
            writeln!(f, "Files not loaded:")?;
            for file in &self.outstanding {
                writeln!(f, "- {} (load: {})", file.name, file.load_state)?;
            }
        }

        Ok(())
    }
}
