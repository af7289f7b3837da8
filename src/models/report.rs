use crate::models::media::{FileRecord, MediaType};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;

/// Totals for a finished (or cancelled) organize run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub processed: usize,
    pub moved: usize,
    pub unchanged: usize,
    pub duplicates_renamed: usize,
    pub marked_for_deletion: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: bool,
    #[serde(default)]
    pub deletion_candidates: Vec<Utf8PathBuf>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} files: {} moved, {} unchanged, {} duplicates renamed, {} marked for deletion, {} skipped, {} failed",
            self.processed,
            self.total,
            self.moved,
            self.unchanged,
            self.duplicates_renamed,
            self.marked_for_deletion,
            self.skipped,
            self.failed
        )?;
        if self.cancelled {
            write!(f, " (cancelled)")?;
        }
        Ok(())
    }
}

/// YAML export of an organize run, written with `--report`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub media_type: MediaType,
    pub dry_run: bool,
    pub folders: Vec<Utf8PathBuf>,
    pub summary: RunSummary,
    pub files: Vec<FileRecord>,
}

impl RunReport {
    pub fn write_yaml(&self, path: &Utf8Path) -> Result<()> {
        let yaml = serde_yaml_ng::to_string(self).context("Failed to serialize run report")?;

        if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create report directory: {}", parent))?;
        }

        fs::write(path, yaml).with_context(|| format!("Failed to write run report: {}", path))?;

        tracing::info!("Wrote run report to {}", path);
        Ok(())
    }
}
