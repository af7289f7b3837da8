use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of library being organized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Movies,
    #[value(name = "tv", alias = "tv-shows")]
    TvShows,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Movies => write!(f, "Movies"),
            MediaType::TvShows => write!(f, "TV Shows"),
        }
    }
}

/// Raw result of parsing a TV release filename.
///
/// Season and episode stay as the matched digit strings; the organizer
/// decides the fallbacks when they are absent or out of range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedEpisode {
    pub series_title: String,
    pub season: Option<String>,
    pub episode: Option<String>,
}

impl ParsedEpisode {
    pub fn has_title(&self) -> bool {
        !self.series_title.trim().is_empty()
    }
}

/// Season/episode pair, ordered season first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EpisodeKey {
    pub season: u32,
    pub episode: u32,
}

impl EpisodeKey {
    pub fn new(season: u32, episode: u32) -> Self {
        Self { season, episode }
    }
}

impl fmt::Display for EpisodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{:02}E{:02}", self.season, self.episode)
    }
}

/// What happened to a single video file during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOutcome {
    Moved,
    Unchanged,
    DuplicateRenamed,
    MarkedForDeletion,
    Skipped,
    Failed,
}

impl FileOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileOutcome::Moved => "moved",
            FileOutcome::Unchanged => "unchanged",
            FileOutcome::DuplicateRenamed => "duplicate_renamed",
            FileOutcome::MarkedForDeletion => "marked_for_deletion",
            FileOutcome::Skipped => "skipped",
            FileOutcome::Failed => "failed",
        }
    }
}

impl fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-file result recorded in state and exported in run reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub source: Utf8PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<Utf8PathBuf>,
    pub outcome: FileOutcome,
    pub message: String,
}

impl FileRecord {
    pub fn new(source: impl Into<Utf8PathBuf>, outcome: FileOutcome, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: None,
            outcome,
            message: message.into(),
        }
    }

    pub fn with_destination(mut self, destination: impl Into<Utf8PathBuf>) -> Self {
        self.destination = Some(destination.into());
        self
    }
}
