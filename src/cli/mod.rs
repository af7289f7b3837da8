//! Terminal front end: argument parsing, prompts and progress output.
//!
//! The binary in `main.rs` parses a [`Cli`], sets up logging and hands the
//! command to [`commands::run`].

pub mod commands;
pub mod progress;
pub mod prompt;

use crate::models::MediaType;
use crate::services::{OrganizerError, volume};
use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Rename, move and de-duplicate movie and TV libraries
#[derive(Parser, Debug)]
#[command(name = "media-organizer", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (default: config.ini next to the executable)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Directory for media_organizer.log
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    pub log_dir: Utf8PathBuf,

    /// Log at debug level
    #[arg(long, global = true)]
    pub debug: bool,

    /// Only log to the file; no console log or progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Sonarr API base URL, including /api/v3
    #[arg(
        long,
        global = true,
        value_name = "URL",
        env = "MEDIA_ORGANIZER_SONARR_URL"
    )]
    pub sonarr_url: Option<String>,

    /// Sonarr API key
    #[arg(
        long,
        global = true,
        value_name = "KEY",
        env = "MEDIA_ORGANIZER_SONARR_API_KEY",
        hide_env_values = true
    )]
    pub sonarr_api_key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rename and file movies or TV episodes
    Organize(OrganizeArgs),

    /// List episodes Sonarr knows about that are missing on disk, and request them
    MissingEpisodes(MissingEpisodesArgs),

    /// Write a commented config.ini template
    InitConfig {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Folder selection shared by every library command
#[derive(Args, Debug, Default)]
pub struct FolderArgs {
    /// Library folders, processed in the order given
    #[arg(value_name = "FOLDER")]
    pub folders: Vec<Utf8PathBuf>,

    /// Choose folders with the native folder picker
    #[arg(long)]
    pub pick: bool,
}

#[derive(Args, Debug)]
pub struct OrganizeArgs {
    /// Kind of media in the selected folders
    #[arg(short = 't', long, value_enum)]
    pub media_type: MediaType,

    #[command(flatten)]
    pub folders: FolderArgs,

    /// Log what would happen without touching any file
    #[arg(long)]
    pub dry_run: bool,

    /// Delete every identical duplicate without asking
    #[arg(short, long)]
    pub yes: bool,

    /// Write a YAML report of the run
    #[arg(long, value_name = "FILE")]
    pub report: Option<Utf8PathBuf>,
}

#[derive(Args, Debug)]
pub struct MissingEpisodesArgs {
    #[command(flatten)]
    pub folders: FolderArgs,

    /// Request every missing episode without asking
    #[arg(short, long)]
    pub yes: bool,
}

/// Validate and de-duplicate selected folders, keeping their order.
///
/// Each folder must exist. A folder selected twice is reported and ignored.
pub fn resolve_folders(folders: Vec<Utf8PathBuf>) -> Result<Vec<Utf8PathBuf>> {
    if folders.is_empty() {
        return Err(OrganizerError::NoFolders.into());
    }

    let mut resolved: Vec<Utf8PathBuf> = Vec::with_capacity(folders.len());
    for folder in folders {
        if !folder.is_dir() {
            return Err(OrganizerError::MissingFolder(folder).into());
        }

        let canonical = folder
            .canonicalize_utf8()
            .with_context(|| format!("Failed to resolve folder: {}", folder))?;

        if resolved.iter().any(|known| volume::paths_equal(known, &canonical)) {
            tracing::warn!("Folder '{}' is already selected, ignoring", folder);
            continue;
        }
        resolved.push(canonical);
    }

    Ok(resolved)
}
