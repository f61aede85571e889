//! Core types for the progress manifest
//!
//! A manifest maps each published archive name to a [`FileRecord`]. The four
//! phase fields of a record are its state machine: each one starts as
//! `pending` and moves to a terminal state, and a phase only becomes
//! eligible once the phase before it has succeeded.

use std::fmt;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// State of one phase for one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseState {
    /// Not attempted yet (or reset for another attempt)
    #[default]
    Pending,
    /// Completed and validated
    Success,
    /// Attempted and failed
    Failed,
    /// Deliberately not attempted
    Skipped,
}

impl PhaseState {
    pub fn is_pending(&self) -> bool {
        matches!(self, PhaseState::Pending)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PhaseState::Success)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseState::Pending => "pending",
            PhaseState::Success => "success",
            PhaseState::Failed => "failed",
            PhaseState::Skipped => "skipped",
        }
    }
}

impl fmt::Display for PhaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline phases in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Download,
    Extract,
    Correct,
    Load,
}

impl Phase {
    /// All phases in execution order
    pub const ALL: [Phase; 4] = [Phase::Download, Phase::Extract, Phase::Correct, Phase::Load];

    /// The phase that must have succeeded before this one may run
    pub fn predecessor(&self) -> Option<Phase> {
        match self {
            Phase::Download => None,
            Phase::Extract => Some(Phase::Download),
            Phase::Correct => Some(Phase::Extract),
            Phase::Load => Some(Phase::Correct),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Download => "download",
            Phase::Extract => "extract",
            Phase::Correct => "correct",
            Phase::Load => "load",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Progress of one published archive through the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Remote address of the archive
    pub source_url: String,
    /// Where the archive is downloaded to
    pub local_archive_path: PathBuf,
    pub download_state: PhaseState,
    pub extract_state: PhaseState,
    pub correct_state: PhaseState,
    pub load_state: PhaseState,
    /// Member files written by the last successful extraction, in archive order
    #[serde(default)]
    pub extracted_member_paths: Vec<PathBuf>,
    /// Re-encoded output of the first member
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_path: Option<PathBuf>,
    /// Line count confirmed by the correction phase; expected row count on load
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validated_line_count: Option<u64>,
}

impl FileRecord {
    /// Create a record with every phase pending
    pub fn new(source_url: impl Into<String>, local_archive_path: impl Into<PathBuf>) -> Self {
        Self {
            source_url: source_url.into(),
            local_archive_path: local_archive_path.into(),
            download_state: PhaseState::Pending,
            extract_state: PhaseState::Pending,
            correct_state: PhaseState::Pending,
            load_state: PhaseState::Pending,
            extracted_member_paths: Vec::new(),
            corrected_path: None,
            validated_line_count: None,
        }
    }

    /// Current state of a phase
    pub fn state(&self, phase: Phase) -> PhaseState {
        match phase {
            Phase::Download => self.download_state,
            Phase::Extract => self.extract_state,
            Phase::Correct => self.correct_state,
            Phase::Load => self.load_state,
        }
    }

    /// Record the outcome of a phase
    pub fn set_state(&mut self, phase: Phase, state: PhaseState) {
        match phase {
            Phase::Download => self.download_state = state,
            Phase::Extract => self.extract_state = state,
            Phase::Correct => self.correct_state = state,
            Phase::Load => self.load_state = state,
        }
    }

    /// Whether `phase` may be attempted now: it is pending and its
    /// predecessor (if any) succeeded
    pub fn is_eligible(&self, phase: Phase) -> bool {
        self.state(phase).is_pending()
            && phase
                .predecessor()
                .map_or(true, |previous| self.state(previous).is_success())
    }

    /// Mark the archive as unusable so the next run downloads it again
    pub fn mark_corrupt(&mut self) {
        self.extract_state = PhaseState::Failed;
        self.download_state = PhaseState::Pending;
    }

    /// First extracted member, the only one consumed downstream
    pub fn primary_member(&self) -> Option<&PathBuf> {
        self.extracted_member_paths.first()
    }
}

/// Ordered mapping from archive name to its progress record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    records: IndexMap<String, FileRecord>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Add a record; an existing entry with the same name is kept
    pub fn insert(&mut self, name: impl Into<String>, record: FileRecord) -> bool {
        match self.records.entry(name.into()) {
            indexmap::map::Entry::Occupied(_) => false,
            indexmap::map::Entry::Vacant(entry) => {
                entry.insert(record);
                true
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&FileRecord> {
        self.records.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FileRecord> {
        self.records.get_mut(name)
    }

    /// Iterate records in manifest order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FileRecord)> {
        self.records.iter()
    }

    /// Names of the records currently eligible for `phase`, in manifest order
    pub fn eligible(&self, phase: Phase) -> Vec<String> {
        self.records
            .iter()
            .filter(|(_, record)| record.is_eligible(phase))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Number of records whose `phase` is in `state`
    pub fn count(&self, phase: Phase, state: PhaseState) -> usize {
        self.records
            .values()
            .filter(|record| record.state(phase) == state)
            .count()
    }
}
