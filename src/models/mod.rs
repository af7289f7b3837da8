//! Data models for the media organizer.
//!
//! This module contains the core data structures used throughout the application:
//! - [`AppState`]: Run progress, per-outcome tallies and deletion candidates
//! - [`AppConfig`]: Settings loaded from `config.ini` (Sonarr, TVmaze, MediaInfo, organizer switches)
//! - [`MediaType`], [`ParsedEpisode`], [`EpisodeKey`]: Vocabulary shared by the naming and organizer services
//! - [`FileRecord`], [`RunSummary`], [`RunReport`]: Per-file results and the optional YAML export
//!
//! # Architecture Note
//!
//! - **Serializable**: Config and report structs derive `Serialize`/`Deserialize`
//! - **Cloneable**: AppState is wrapped in `Arc<RwLock<>>` by [`StateManager`](crate::state::StateManager)
//! - State updates go through StateManager's `update()` method so subscribers see every change

pub mod app_state;
pub mod config;
pub mod media;
pub mod report;

pub use app_state::AppState;
pub use config::{AppConfig, MediaInfoSettings, OrganizerSettings, SonarrSettings, TvMazeSettings};
pub use media::{EpisodeKey, FileOutcome, FileRecord, MediaType, ParsedEpisode};
pub use report::{RunReport, RunSummary};
