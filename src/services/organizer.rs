use crate::models::{FileOutcome, FileRecord, MediaType, OrganizerSettings, RunSummary};
use crate::services::duplicates::{DuplicateResolution, DuplicateResolver};
use crate::services::mediainfo::{self, MetadataProbe};
use crate::services::naming::{
    self, ReleaseNameParser, UNKNOWN_SERIES, capitalize_title, sanitize_filename,
};
use crate::services::tvmaze::ShowDirectory;
use crate::services::{volume, walk};
use crate::state::StateManager;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

/// Errors that stop an organize run before any file is touched
#[derive(Error, Debug)]
pub enum OrganizerError {
    #[error("Please select at least one folder")]
    NoFolders,

    #[error("Folder does not exist: {0}")]
    MissingFolder(Utf8PathBuf),
}

/// Everything an organize run needs to know up front
#[derive(Debug, Clone)]
pub struct OrganizeOptions {
    pub media_type: MediaType,
    pub folders: Vec<Utf8PathBuf>,
    pub dry_run: bool,
    pub cleanup_unwanted_files: bool,
    pub remove_empty_folders: bool,
}

impl OrganizeOptions {
    pub fn new(media_type: MediaType, folders: Vec<Utf8PathBuf>) -> Self {
        Self {
            media_type,
            folders,
            dry_run: false,
            cleanup_unwanted_files: true,
            remove_empty_folders: true,
        }
    }

    /// Build options from the `[Organizer]` config section
    pub fn from_settings(
        media_type: MediaType,
        folders: Vec<Utf8PathBuf>,
        settings: &OrganizerSettings,
        dry_run: bool,
    ) -> Self {
        Self {
            media_type,
            folders,
            dry_run,
            cleanup_unwanted_files: settings.cleanup_unwanted_files,
            remove_empty_folders: settings.remove_empty_folders,
        }
    }

    pub fn validate(&self) -> Result<(), OrganizerError> {
        if self.folders.is_empty() {
            return Err(OrganizerError::NoFolders);
        }
        if let Some(missing) = self.folders.iter().find(|folder| !folder.is_dir()) {
            return Err(OrganizerError::MissingFolder(missing.clone()));
        }
        Ok(())
    }
}

/// Renames and files movies or TV episodes across the selected folders.
///
/// A run walks every selected folder, renames each video to its canonical
/// name and moves it into the library layout:
///
/// - Movies: `<base>/<Title> (<Year>)/<Title> (<Year>).<ext>`
/// - TV: `<base>/<Series> (<Year>)/Season NN/<Series> SxxEyy.<ext>`
///
/// Clashes with an existing destination go through [`DuplicateResolver`].
/// Identical files are only nominated for deletion; [`Self::delete_files`]
/// removes them once confirmed. With `dry_run` set nothing on disk changes.
pub struct MediaOrganizer {
    options: OrganizeOptions,
    parser: ReleaseNameParser,
    probe: Arc<dyn MetadataProbe>,
    shows: Arc<dyn ShowDirectory>,
    duplicates: DuplicateResolver,
    state: StateManager,
}

impl MediaOrganizer {
    pub fn new(
        options: OrganizeOptions,
        probe: Arc<dyn MetadataProbe>,
        shows: Arc<dyn ShowDirectory>,
        state: StateManager,
    ) -> Self {
        let duplicates = DuplicateResolver::new(options.dry_run);
        Self {
            options,
            parser: ReleaseNameParser::new(),
            probe,
            shows,
            duplicates,
            state,
        }
    }

    pub fn options(&self) -> &OrganizeOptions {
        &self.options
    }

    /// Organize every video under the selected folders.
    ///
    /// Cancellation is checked between files. A cancelled run skips cleanup
    /// and still returns the summary of what was done.
    pub async fn run(&self, cancel: &watch::Receiver<bool>) -> Result<RunSummary> {
        self.options.validate()?;
        let media_type = self.options.media_type;
        tracing::info!("Starting {} organization across selected folders...", media_type);

        if media_type == MediaType::TvShows {
            self.state.set_operation("Repairing season folders");
            for folder in &self.options.folders {
                self.repair_season_folders(folder);
            }
        }

        let files = self.collect_video_files();
        tracing::info!("Found {} video files", files.len());
        self.state.start_run(Some(media_type), files.len());

        for (index, file) in files.iter().enumerate() {
            if *cancel.borrow() {
                tracing::warn!(
                    "Organization cancelled, {} files left untouched",
                    files.len() - index
                );
                self.state.mark_cancelled();
                break;
            }

            self.state.begin_file(file.to_string());
            let record = match self.process_file(file).await {
                Ok(record) => record,
                Err(e) => {
                    tracing::error!("Error processing file '{}': {:#}", file, e);
                    FileRecord::new(file.clone(), FileOutcome::Failed, format!("{:#}", e))
                }
            };
            self.state.record_file(record);
        }

        if self.state.read(|state| state.cancelled) {
            tracing::info!("Skipping cleanup after cancellation");
        } else {
            for folder in &self.options.folders {
                if self.options.cleanup_unwanted_files {
                    self.state.set_operation("Removing unwanted files");
                    self.clean_up_unwanted_files(folder);
                }
                if self.options.remove_empty_folders {
                    self.state.set_operation("Removing empty folders");
                    self.remove_empty_folders(folder);
                }
            }
        }

        let (summary, _) = self.state.finish_run();
        tracing::info!("{} organization completed: {}", media_type, summary);
        Ok(summary)
    }

    /// Video files under every selected folder, in walk order
    pub fn collect_video_files(&self) -> Vec<Utf8PathBuf> {
        self.options
            .folders
            .iter()
            .flat_map(|folder| walk::walk_files(folder))
            .filter(|path| path.file_name().is_some_and(naming::is_video_file))
            .collect()
    }

    async fn process_file(&self, path: &Utf8Path) -> Result<FileRecord> {
        if !path.is_file() {
            return Ok(FileRecord::new(path, FileOutcome::Skipped, "No longer a file"));
        }
        if naming::is_hidden(path) {
            tracing::debug!("Skipping hidden file '{}'", path);
            return Ok(FileRecord::new(path, FileOutcome::Skipped, "Hidden file"));
        }

        match self.options.media_type {
            MediaType::Movies => self.process_movie_file(path).await,
            MediaType::TvShows => self.process_tv_show_file(path).await,
        }
    }

    async fn process_movie_file(&self, path: &Utf8Path) -> Result<FileRecord> {
        let stem = path.file_stem().unwrap_or_default();

        let mut title = sanitize_filename(&capitalize_title(&self.parser.parse_movie_title(stem)));
        if title.is_empty() {
            title = sanitize_filename(&capitalize_title(&self.parser.collapse_separators(stem)));
        }
        if title.is_empty() {
            return Ok(FileRecord::new(
                path,
                FileOutcome::Skipped,
                "Could not derive a title",
            ));
        }

        let year = match self.parser.extract_year(stem) {
            Some(year) => Some(year),
            None => mediainfo::probe_release_year(self.probe.as_ref(), path).await,
        };

        let name = match year {
            Some(year) => format!("{} ({})", title, year),
            None => {
                tracing::debug!("No year found for '{}'", path);
                title
            }
        };

        let folder = self.movie_destination_folder(path, &name);
        let destination = folder.join(format!("{}{}", name, extension_suffix(path)));
        self.place_file(path, &destination).await
    }

    async fn process_tv_show_file(&self, path: &Utf8Path) -> Result<FileRecord> {
        let stem = path.file_stem().unwrap_or_default();
        let parsed = self.parser.parse_tv_show_filename(stem);

        let mut series_title = parsed.series_title.trim().to_string();
        if series_title.is_empty() {
            let series_dir = path
                .parent()
                .and_then(Utf8Path::parent)
                .and_then(Utf8Path::file_name)
                .unwrap_or_default();
            series_title = capitalize_title(series_dir);
            if !series_title.is_empty() {
                tracing::info!("Series title inferred from folder: '{}'", series_title);
            }
        }

        let season = match parsed.season {
            Some(season) => season,
            None => {
                let season_dir = path.parent().and_then(Utf8Path::file_name).unwrap_or_default();
                match self.parser.season_from_folder(season_dir) {
                    Some(season) => {
                        tracing::info!("Season number inferred from folder: {}", season);
                        season
                    }
                    None => {
                        tracing::info!("No season number found for '{}', defaulting to 1", path);
                        "1".to_string()
                    }
                }
            }
        };

        if series_title.is_empty() {
            series_title = match mediainfo::probe_series_name(self.probe.as_ref(), path).await {
                Some(name) => {
                    tracing::info!("Series title from MediaInfo: '{}'", name);
                    capitalize_title(&name)
                }
                None => {
                    tracing::info!("Series title unknown for '{}'", path);
                    UNKNOWN_SERIES.to_string()
                }
            };
        }

        let episode = parsed
            .episode
            .or_else(|| self.parser.episode_from_stem(stem))
            .unwrap_or_else(|| "1".to_string());

        let (season_number, episode_number) = match (season.parse::<u32>(), episode.parse::<u32>())
        {
            (Ok(season), Ok(episode)) => (season, episode),
            _ => {
                tracing::warn!(
                    "Invalid season or episode number in '{}', defaulting to S01E01",
                    path
                );
                (1, 1)
            }
        };

        let mut sanitized = sanitize_filename(&series_title);
        if sanitized.is_empty() {
            sanitized = UNKNOWN_SERIES.to_string();
        }

        let series_folder = match self.shows.premiere_year(&series_title).await {
            Some(year) => format!("{} ({})", sanitized, year),
            None => sanitized.clone(),
        };
        let season_folder = format!("Season {:02}", season_number);
        let file_name = format!(
            "{} S{:02}E{:02}{}",
            sanitized,
            season_number,
            episode_number,
            extension_suffix(path)
        );

        let folder = self.tv_destination_folder(path, &series_folder, &season_folder)?;
        self.place_file(path, &folder.join(file_name)).await
    }

    /// Folder a movie named `folder_name` belongs in.
    ///
    /// An existing `<base>/<folder_name>` on the source's volume wins; otherwise
    /// the folder is created next to the source file.
    pub fn movie_destination_folder(&self, source: &Utf8Path, folder_name: &str) -> Utf8PathBuf {
        for base in &self.options.folders {
            if volume::same_volume(source, base) {
                let candidate = base.join(folder_name);
                if candidate.is_dir() {
                    return candidate;
                }
            }
        }
        parent_dir(source).join(folder_name)
    }

    /// Season folder for an episode: under the first selected folder on the
    /// source's volume, else next to the source file.
    pub fn tv_destination_folder(
        &self,
        source: &Utf8Path,
        series_folder: &str,
        season_folder: &str,
    ) -> Result<Utf8PathBuf> {
        for base in &self.options.folders {
            if volume::same_volume(source, base) {
                let series_path = base.join(series_folder);
                if !self.options.dry_run {
                    fs::create_dir_all(&series_path).with_context(|| {
                        format!("Failed to create series folder '{}'", series_path)
                    })?;
                }
                return Ok(series_path.join(season_folder));
            }
        }
        Ok(parent_dir(source).join(series_folder).join(season_folder))
    }

    async fn place_file(&self, source: &Utf8Path, destination: &Utf8Path) -> Result<FileRecord> {
        if volume::paths_equal(source, destination) {
            return Ok(
                FileRecord::new(source, FileOutcome::Unchanged, "Already organized")
                    .with_destination(destination),
            );
        }

        if destination.exists() && !volume::same_file(source, destination) {
            let record = match self.duplicates.resolve(source, destination).await? {
                DuplicateResolution::RenamedCopy(copy_path) => FileRecord::new(
                    source,
                    FileOutcome::DuplicateRenamed,
                    format!("Different content from '{}'", destination),
                )
                .with_destination(copy_path),
                DuplicateResolution::DeletionCandidate(candidate) => FileRecord::new(
                    source,
                    FileOutcome::MarkedForDeletion,
                    format!("Identical to '{}'", destination),
                )
                .with_destination(candidate),
            };
            return Ok(record);
        }

        if self.options.dry_run {
            tracing::info!("[dry run] Would move '{}' to '{}'", source, destination);
        } else {
            volume::move_file_off_runtime(source, destination)
                .await
                .with_context(|| format!("Error moving file '{}'", source))?;
            tracing::info!("Moved '{}' to '{}'", source, destination);
        }

        Ok(
            FileRecord::new(source, FileOutcome::Moved, format!("Moved to '{}'", destination))
                .with_destination(destination),
        )
    }

    /// Move season folders that sit directly inside another season folder
    /// into a series folder named after them. Returns how many were moved.
    pub fn repair_season_folders(&self, root: &Utf8Path) -> usize {
        let candidates: Vec<Utf8PathBuf> = walk::walk_dirs(root)
            .into_iter()
            .filter(|dir| {
                let name = dir.file_name().unwrap_or_default();
                let parent_name = dir
                    .parent()
                    .and_then(Utf8Path::file_name)
                    .unwrap_or_default();
                self.parser.is_season_folder(name) && self.parser.is_season_folder(parent_name)
            })
            .collect();

        let mut repaired = 0;
        for dir in candidates {
            if !dir.is_dir() {
                continue;
            }
            let (Some(name), Some(parent)) = (dir.file_name(), dir.parent()) else {
                continue;
            };

            let mut series_title =
                sanitize_filename(&self.parser.extract_series_title_from_season_folder(name));
            if series_title.is_empty() {
                series_title = UNKNOWN_SERIES.to_string();
            }
            let series_path = parent.join(&series_title);
            let target = series_path.join(name);

            if self.options.dry_run {
                tracing::info!(
                    "[dry run] Would move season folder '{}' to '{}'",
                    dir,
                    series_path
                );
                continue;
            }

            let moved = fs::create_dir_all(&series_path).and_then(|_| fs::rename(&dir, &target));
            match moved {
                Ok(()) => {
                    tracing::info!("Moved season folder '{}' to '{}'", dir, series_path);
                    repaired += 1;
                }
                Err(e) => tracing::error!("Failed to move season folder '{}': {}", dir, e),
            }
        }
        repaired
    }

    /// Delete every file under `root` that is neither a video nor a subtitle.
    pub fn clean_up_unwanted_files(&self, root: &Utf8Path) -> usize {
        let mut removed = 0;
        for file in walk::walk_files(root) {
            let name = file.file_name().unwrap_or_default();
            if naming::is_video_file(name) || naming::is_subtitle_file(name) {
                continue;
            }

            if self.options.dry_run {
                tracing::info!("[dry run] Would delete unwanted file '{}'", file);
                continue;
            }
            match fs::remove_file(&file) {
                Ok(()) => {
                    tracing::info!("Deleted unwanted file '{}'", file);
                    removed += 1;
                }
                Err(e) => tracing::error!("Failed to delete '{}': {}", file, e),
            }
        }
        removed
    }

    /// Remove empty folders under `root`, deepest first. `root` itself is kept.
    pub fn remove_empty_folders(&self, root: &Utf8Path) -> usize {
        let mut removed = 0;
        for dir in walk::walk_dirs_deepest_first(root) {
            if !is_empty_dir(&dir) {
                continue;
            }

            if self.options.dry_run {
                tracing::info!("[dry run] Would remove empty folder '{}'", dir);
                continue;
            }
            match fs::remove_dir(&dir) {
                Ok(()) => {
                    tracing::info!("Removed empty folder '{}'", dir);
                    removed += 1;
                }
                Err(e) => tracing::error!("Failed to remove folder '{}': {}", dir, e),
            }
        }
        removed
    }

    /// Delete confirmed duplicate files. Returns how many were deleted.
    pub fn delete_files(&self, files: &[Utf8PathBuf]) -> usize {
        let mut deleted = 0;
        for file in files {
            if self.options.dry_run {
                tracing::info!("[dry run] Would delete duplicate file '{}'", file);
                continue;
            }
            match fs::remove_file(file) {
                Ok(()) => {
                    tracing::info!("Deleted duplicate file '{}'", file);
                    deleted += 1;
                }
                Err(e) => tracing::error!("Failed to delete file '{}': {}", file, e),
            }
        }
        deleted
    }
}

fn extension_suffix(path: &Utf8Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}

fn parent_dir(path: &Utf8Path) -> &Utf8Path {
    path.parent().unwrap_or(Utf8Path::new("."))
}

fn is_empty_dir(path: &Utf8Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}
