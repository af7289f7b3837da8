use crate::models::EpisodeKey;
use crate::services::naming::{ReleaseNameParser, is_video_file, sanitize_filename};
use crate::services::sonarr::{LibraryManager, SonarrEpisode, SonarrSeries};
use crate::services::walk::list_dir;
use crate::state::StateManager;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// An episode Sonarr knows about that is not on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingEpisode {
    pub episode_id: i64,
    pub key: EpisodeKey,
    #[serde(default)]
    pub title: Option<String>,
}

impl From<SonarrEpisode> for MissingEpisode {
    fn from(episode: SonarrEpisode) -> Self {
        Self {
            episode_id: episode.id,
            key: episode.key(),
            title: episode.title,
        }
    }
}

impl fmt::Display for MissingEpisode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.title {
            Some(title) => write!(f, "{} ({})", self.key, title),
            None => write!(f, "{}", self.key),
        }
    }
}

/// Missing episodes grouped by series title, in discovery order
pub type MissingEpisodes = IndexMap<String, Vec<MissingEpisode>>;

/// Result of submitting picked episodes to Sonarr
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionSummary {
    pub submitted: usize,
    pub failed_series: Vec<String>,
}

/// Sonarr series whose title matches a folder-derived title.
///
/// Titles match case-insensitively, either verbatim or after the same
/// sanitizing the organizer applies to folder names.
pub fn find_series_id(series: &[SonarrSeries], title: &str) -> Option<i64> {
    let wanted = title.to_lowercase();
    series
        .iter()
        .find(|s| s.title.to_lowercase() == wanted)
        .or_else(|| {
            series
                .iter()
                .find(|s| sanitize_filename(&s.title).to_lowercase() == wanted)
        })
        .map(|s| s.id)
}

/// Compares series folders on disk with Sonarr's episode lists
pub struct MissingEpisodeAnalyzer {
    manager: Arc<dyn LibraryManager>,
    parser: ReleaseNameParser,
    state: StateManager,
}

impl MissingEpisodeAnalyzer {
    pub fn new(manager: Arc<dyn LibraryManager>, state: StateManager) -> Self {
        Self {
            manager,
            parser: ReleaseNameParser::new(),
            state,
        }
    }

    /// Episodes present under `series_path`, read from `Season N` subfolders.
    pub fn existing_episodes(&self, series_path: &Utf8Path) -> Result<HashSet<EpisodeKey>> {
        let mut existing = HashSet::new();

        let listing = list_dir(series_path)
            .with_context(|| format!("Failed to list series folder '{}'", series_path))?;

        for season_path in listing.dirs {
            let Some(season) = season_path
                .file_name()
                .and_then(|name| self.parser.season_from_folder(name))
                .and_then(|digits| digits.parse::<u32>().ok())
            else {
                continue;
            };

            let season_listing = list_dir(&season_path)
                .with_context(|| format!("Failed to list season folder '{}'", season_path))?;

            for file in season_listing.files {
                let Some(name) = file.file_name() else { continue };
                if !is_video_file(name) {
                    continue;
                }
                let stem = file.file_stem().unwrap_or(name);
                if let Some(episode) = self
                    .parser
                    .episode_from_stem(stem)
                    .and_then(|digits| digits.parse::<u32>().ok())
                {
                    existing.insert(EpisodeKey::new(season, episode));
                }
            }
        }

        Ok(existing)
    }

    /// Walk every series folder under `folders` and collect what Sonarr has that the disk lacks.
    pub async fn analyze(
        &self,
        folders: &[Utf8PathBuf],
        cancel: &watch::Receiver<bool>,
    ) -> Result<MissingEpisodes> {
        tracing::info!("Starting missing episodes analysis...");

        let series_list = match self.manager.list_series().await {
            Ok(series) => series,
            Err(e) => {
                tracing::error!("Failed to fetch series list from Sonarr: {}", e);
                Vec::new()
            }
        };

        let mut series_folders = Vec::new();
        for folder in folders {
            let listing = list_dir(folder)
                .with_context(|| format!("Failed to list library folder '{}'", folder))?;
            series_folders.extend(listing.dirs);
        }

        self.state.start_run(None, series_folders.len());
        self.state.set_operation("Analyzing missing episodes");

        let mut missing_episodes = MissingEpisodes::new();

        for series_path in &series_folders {
            if *cancel.borrow() {
                tracing::warn!("Missing episodes analysis cancelled");
                self.state.mark_cancelled();
                break;
            }

            let folder_name = series_path.file_name().unwrap_or(series_path.as_str());
            let series_title = self.parser.strip_year_suffix(folder_name);
            self.state.begin_file(series_title.clone());

            if let Some(missing) = self.missing_for_series(&series_list, series_path, &series_title).await {
                tracing::info!("{} missing episodes for '{}'", missing.len(), series_title);
                let entry = missing_episodes.entry(series_title).or_default();
                for episode in missing {
                    if !entry.iter().any(|known| known.episode_id == episode.episode_id) {
                        entry.push(episode);
                    }
                }
            }

            self.state.complete_item();
        }

        self.state.finish_run();
        tracing::info!("Missing episodes analysis completed.");
        Ok(missing_episodes)
    }

    async fn missing_for_series(
        &self,
        series_list: &[SonarrSeries],
        series_path: &Utf8Path,
        series_title: &str,
    ) -> Option<Vec<MissingEpisode>> {
        let Some(series_id) = find_series_id(series_list, series_title) else {
            tracing::info!("Series '{}' not found in Sonarr.", series_title);
            return None;
        };

        let episodes = match self.manager.episodes(series_id).await {
            Ok(episodes) => episodes,
            Err(e) => {
                tracing::error!("Error fetching episodes for series ID '{}': {}", series_id, e);
                return None;
            }
        };
        if episodes.is_empty() {
            tracing::info!("No episodes found for series '{}' in Sonarr.", series_title);
            return None;
        }

        let existing = match self.existing_episodes(series_path) {
            Ok(existing) => existing,
            Err(e) => {
                tracing::error!("{:#}", e);
                return None;
            }
        };

        let missing: Vec<MissingEpisode> = episodes
            .into_iter()
            .filter(|episode| !existing.contains(&episode.key()))
            .map(MissingEpisode::from)
            .collect();

        (!missing.is_empty()).then_some(missing)
    }

    /// Monitor the picked episodes and trigger a search, one request pair per series.
    pub async fn submit(&self, selected: &MissingEpisodes) -> SubmissionSummary {
        let mut summary = SubmissionSummary::default();

        for (series_title, episodes) in selected {
            let ids: Vec<i64> = episodes.iter().map(|episode| episode.episode_id).collect();
            if ids.is_empty() {
                continue;
            }

            let result = async {
                self.manager.monitor_episodes(&ids).await?;
                self.manager.search_episodes(&ids).await
            }
            .await;

            match result {
                Ok(()) => {
                    tracing::info!(
                        "Added {} episodes of '{}' to Sonarr and started a search",
                        ids.len(),
                        series_title
                    );
                    summary.submitted += ids.len();
                }
                Err(e) => {
                    tracing::error!("Error adding episodes of '{}' to Sonarr: {}", series_title, e);
                    summary.failed_series.push(series_title.clone());
                }
            }
        }

        summary
    }
}
