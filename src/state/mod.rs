// State management module
//
// This module provides the StateManager which wraps AppState with thread-safe access
// using Arc<RwLock<T>> and emits change events for the progress renderer.

use crate::models::{AppState, FileOutcome, FileRecord, MediaType, RunSummary};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when state is modified
///
/// These events let the terminal front end follow a run without polling.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// An organize run has started
    RunStarted {
        media_type: Option<MediaType>,
        total_files: usize,
    },

    /// Progress has been updated during a run
    ProgressUpdated {
        processed: usize,
        total: usize,
        current_file: Option<String>,
    },

    /// A file has been processed
    FileProcessed {
        file: String,
        outcome: FileOutcome,
        message: String,
    },

    /// Current operation has changed
    OperationChanged { operation: String },

    /// The run has finished or was cancelled
    RunFinished {
        moved: usize,
        failed: usize,
        deletion_candidates: usize,
        cancelled: bool,
    },

    /// State has been reset
    StateReset,
}

/// Thread-safe state manager with event emission
///
/// This is the central state management component that:
/// - Provides thread-safe access to [`AppState`] via `Arc<RwLock<T>>`
/// - Detects state changes and emits [`StateChange`] events
/// - Supports subscribing to state changes via tokio broadcast channels
///
/// # Usage
///
/// - [`read()`](Self::read) for reading state
/// - [`update()`](Self::update) for mutations with automatic event emission
/// - [`subscribe()`](Self::subscribe) for listening to state changes
///
/// # Related Types
///
/// - [`crate::models::AppState`]: The underlying state structure
/// - [`crate::services::MediaOrganizer`]: Drives runs through the convenience methods
/// - [`crate::cli::progress::ProgressRenderer`]: Primary consumer of state events
pub struct StateManager {
    /// The application state protected by RwLock for thread-safe access
    state: Arc<RwLock<AppState>>,

    /// Broadcast channel for emitting state change events
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager with default state
    ///
    /// The broadcast channel buffers 256 events; slow subscribers see `Lagged`.
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(256);
        Self {
            state: Arc::new(RwLock::new(AppState::default())),
            state_tx,
        }
    }

    /// Get a read-only snapshot of the current state
    pub fn snapshot(&self) -> AppState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let percent = state_manager.read(|state| state.progress_percent());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AppState) -> R,
    {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// 1. Captures the old state
    /// 2. Applies the update function
    /// 3. Detects what changed
    /// 4. Emits appropriate events
    ///
    /// # Returns
    /// A vector of StateChange events that were emitted
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut AppState),
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = self.detect_changes(&old_state, &state);

        for change in &changes {
            // No subscribers is fine
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    fn detect_changes(&self, old: &AppState, new: &AppState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.is_running != new.is_running {
            if new.is_running {
                changes.push(StateChange::RunStarted {
                    media_type: new.media_type,
                    total_files: new.total,
                });
            } else {
                changes.push(StateChange::RunFinished {
                    moved: new.moved,
                    failed: new.failed,
                    deletion_candidates: new.deletion_candidates.len(),
                    cancelled: new.cancelled,
                });
            }
        }

        if old.processed != new.processed
            || old.total != new.total
            || old.current_file != new.current_file
        {
            changes.push(StateChange::ProgressUpdated {
                processed: new.processed,
                total: new.total,
                current_file: new.current_file.clone(),
            });
        }

        if old.current_operation != new.current_operation {
            changes.push(StateChange::OperationChanged {
                operation: new.current_operation.clone(),
            });
        }

        changes
    }

    // Convenience methods for common state updates

    /// Start a run over `total` files
    pub fn start_run(&self, media_type: Option<MediaType>, total: usize) -> Vec<StateChange> {
        self.update(|state| {
            state.reset_run_state();
            state.is_running = true;
            state.media_type = media_type;
            state.total = total;
            state.current_operation = match media_type {
                Some(kind) => format!("Organizing {}", kind),
                None => "Starting".to_string(),
            };
        })
    }

    /// Mark a file as the one currently being processed
    pub fn begin_file(&self, file: String) -> Vec<StateChange> {
        self.update(|state| {
            state.current_file = Some(file);
        })
    }

    pub fn set_operation(&self, operation: impl Into<String>) -> Vec<StateChange> {
        let operation = operation.into();
        self.update(|state| {
            state.current_operation = operation;
        })
    }

    /// Record the result of processing a file
    pub fn record_file(&self, record: FileRecord) -> Vec<StateChange> {
        let processed_event = StateChange::FileProcessed {
            file: record.source.to_string(),
            outcome: record.outcome,
            message: record.message.clone(),
        };

        let mut changes = self.update(|state| {
            state.record_result(record);
        });

        let _ = self.state_tx.send(processed_event.clone());
        changes.push(processed_event);

        changes
    }

    /// Advance progress for work that produces no [`FileRecord`] (series folders, for instance)
    pub fn complete_item(&self) -> Vec<StateChange> {
        self.update(|state| {
            state.processed += 1;
        })
    }

    /// Flag the run as cancelled; the run still finishes through [`Self::finish_run`]
    pub fn mark_cancelled(&self) -> Vec<StateChange> {
        self.update(|state| {
            state.cancelled = true;
        })
    }

    /// Finish the run and return its summary
    pub fn finish_run(&self) -> (RunSummary, Vec<StateChange>) {
        let changes = self.update(|state| {
            state.is_running = false;
            state.current_file = None;
            state.current_operation.clear();
        });
        (self.read(AppState::summary), changes)
    }

    /// Reset all run-related state
    pub fn reset_run_state(&self) -> Vec<StateChange> {
        let mut changes = self.update(|state| {
            state.reset_run_state();
        });

        let reset_event = StateChange::StateReset;
        let _ = self.state_tx.send(reset_event.clone());
        changes.push(reset_event);

        changes
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}
