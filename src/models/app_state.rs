use crate::models::media::{FileOutcome, FileRecord, MediaType};
use crate::models::report::RunSummary;
use camino::Utf8PathBuf;

/// Single source of truth for the state of an organize run.
///
/// # Thread Safety
///
/// `AppState` is wrapped in `Arc<RwLock<AppState>>` by [`crate::state::StateManager`].
/// Never mutate it directly - go through the manager so change events reach the
/// progress renderer:
/// - [`read()`](crate::state::StateManager::read) for read-only access
/// - [`update()`](crate::state::StateManager::update) for mutations with automatic change events
#[derive(Clone, Debug, Default)]
pub struct AppState {
    // Runtime state
    pub is_running: bool,
    pub cancelled: bool,
    pub media_type: Option<MediaType>,
    pub current_file: Option<String>,
    pub current_operation: String,

    // Progress state
    pub processed: usize,
    pub total: usize,

    // Per-outcome tallies
    pub moved: usize,
    pub unchanged: usize,
    pub duplicates_renamed: usize,
    pub marked_for_deletion: usize,
    pub skipped: usize,
    pub failed: usize,

    // Results
    pub deletion_candidates: Vec<Utf8PathBuf>,
    pub records: Vec<FileRecord>,
}

impl AppState {
    /// Whole-number completion percentage, 100 when there is nothing to do.
    pub fn progress_percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let percent = self.processed.min(self.total) * 100 / self.total;
        percent as u8
    }

    /// Record the result of processing a single file.
    ///
    /// Bumps the matching tally, advances progress and queues byte-identical
    /// duplicates for the deletion prompt.
    pub fn record_result(&mut self, record: FileRecord) {
        match record.outcome {
            FileOutcome::Moved => self.moved += 1,
            FileOutcome::Unchanged => self.unchanged += 1,
            FileOutcome::DuplicateRenamed => self.duplicates_renamed += 1,
            FileOutcome::MarkedForDeletion => {
                self.marked_for_deletion += 1;
                if let Some(candidate) = &record.destination {
                    if !self.deletion_candidates.contains(candidate) {
                        self.deletion_candidates.push(candidate.clone());
                    }
                }
            }
            FileOutcome::Skipped => self.skipped += 1,
            FileOutcome::Failed => self.failed += 1,
        }
        self.processed += 1;
        self.records.push(record);
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            total: self.total,
            processed: self.processed,
            moved: self.moved,
            unchanged: self.unchanged,
            duplicates_renamed: self.duplicates_renamed,
            marked_for_deletion: self.marked_for_deletion,
            skipped: self.skipped,
            failed: self.failed,
            cancelled: self.cancelled,
            deletion_candidates: self.deletion_candidates.clone(),
        }
    }

    /// Reset all run-related state to initial values.
    pub fn reset_run_state(&mut self) {
        *self = AppState::default();
    }
}
