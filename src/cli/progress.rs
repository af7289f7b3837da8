use crate::models::FileOutcome;
use crate::state::{StateChange, StateManager};
use dialoguer::console::Term;
use std::thread::JoinHandle;
use tokio::sync::broadcast::error::RecvError;

/// Prints run progress to stderr from a background thread.
///
/// The thread follows [`StateChange`] events and writes one line per whole
/// percent of progress, plus one per failed file. It stops on `RunFinished`
/// or `StateReset`.
pub struct ProgressRenderer {
    handle: JoinHandle<()>,
}

impl ProgressRenderer {
    /// Subscribe to `state` and start rendering.
    pub fn spawn(state: &StateManager) -> Self {
        let mut rx = state.subscribe();
        let term = Term::stderr();

        let handle = std::thread::spawn(move || {
            tracing::debug!("Progress renderer started");
            let mut last_percent: Option<u8> = None;
            let mut operation = String::new();

            loop {
                match rx.blocking_recv() {
                    Ok(StateChange::RunStarted { media_type, total_files }) => {
                        let label = media_type
                            .map(|kind| kind.to_string())
                            .unwrap_or_else(|| "Series".to_string());
                        let _ = term.write_line(&format!("{}: {} to process", label, total_files));
                    }
                    Ok(StateChange::OperationChanged { operation: next }) => {
                        operation = next;
                    }
                    Ok(StateChange::ProgressUpdated {
                        processed,
                        total,
                        current_file,
                    }) => {
                        let percent = percent(processed, total);
                        if last_percent == Some(percent) {
                            continue;
                        }
                        last_percent = Some(percent);
                        let _ = term.write_line(&progress_line(
                            percent,
                            processed,
                            total,
                            &operation,
                            current_file.as_deref(),
                        ));
                    }
                    Ok(StateChange::FileProcessed {
                        file,
                        outcome: FileOutcome::Failed,
                        message,
                    }) => {
                        let _ = term.write_line(&format!("Failed: {} ({})", file, message));
                    }
                    Ok(StateChange::FileProcessed { .. }) => {}
                    Ok(StateChange::RunFinished { .. }) | Ok(StateChange::StateReset) => break,
                    Err(RecvError::Closed) => break,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!("Progress renderer lagged, {} events skipped", skipped);
                    }
                }
            }

            tracing::debug!("Progress renderer stopped");
        });

        Self { handle }
    }

    /// Wait for the renderer thread to exit.
    ///
    /// Call once the run has returned. If the thread has not seen `RunFinished`
    /// yet (the run failed before starting, for instance) the state is reset so
    /// the thread wakes up.
    pub fn finish(self, state: &StateManager) {
        if !self.handle.is_finished() {
            state.reset_run_state();
        }
        if self.handle.join().is_err() {
            tracing::warn!("Progress renderer thread panicked");
        }
    }
}

fn percent(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((processed.min(total) * 100) / total) as u8
}

fn progress_line(
    percent: u8,
    processed: usize,
    total: usize,
    operation: &str,
    current_file: Option<&str>,
) -> String {
    let mut line = format!("[{:>3}%] {}/{}", percent, processed, total);
    if !operation.is_empty() {
        line.push(' ');
        line.push_str(operation);
    }
    if let Some(file) = current_file {
        line.push_str(": ");
        line.push_str(file);
    }
    line
}
