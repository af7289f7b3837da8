//! Services module - Business logic for organizing a media library.
//!
//! Everything here is independent of the terminal front end in [`crate::cli`]; progress
//! flows out through [`crate::state::StateManager`] and remote lookups sit behind traits so
//! they can be mocked in tests.
//!
//! # Components
//!
//! - [`MediaOrganizer`]: The organize pass for movies or TV shows. Handles:
//!   - Renaming release-style names to `Title (Year)` / `Series SxxEyy`
//!   - Choosing destination folders on the source's own volume
//!   - Duplicate detection through [`DuplicateResolver`]
//!   - Season folder repair, unwanted file cleanup and empty folder removal
//!
//! - [`ReleaseNameParser`]: Regex-based parsing of scene/release names
//!
//! - [`MediaInfoProbe`]: Runs the `mediainfo` CLI to recover release years and series names
//!
//! - [`TvMazeClient`]: Looks up series premiere years, cached per title
//!
//! - [`SonarrClient`] and [`MissingEpisodeAnalyzer`]: Compare a TV library against Sonarr and
//!   submit monitor/search requests for what is missing
//!
//! # Usage Example
//!
//! ```ignore
//! use media_organizer::services::{MediaOrganizer, OrganizeOptions};
//!
//! let options = OrganizeOptions::new(MediaType::Movies, vec!["/media/movies".into()]);
//! let organizer = MediaOrganizer::new(options, probe, shows, state);
//!
//! let summary = organizer.run(&cancel_rx).await?;
//! organizer.delete_files(&summary.deletion_candidates);
//! ```

pub mod duplicates;
pub mod mediainfo;
pub mod missing;
pub mod naming;
pub mod organizer;
pub mod sonarr;
pub mod tvmaze;
pub mod volume;
pub mod walk;

pub use duplicates::{DuplicateResolution, DuplicateResolver};
pub use mediainfo::{GeneralTrack, MediaInfoError, MediaInfoProbe, MetadataProbe};
pub use missing::{MissingEpisode, MissingEpisodeAnalyzer, MissingEpisodes, SubmissionSummary};
pub use naming::ReleaseNameParser;
pub use organizer::{MediaOrganizer, OrganizeOptions, OrganizerError};
pub use sonarr::{LibraryManager, SonarrClient, SonarrEpisode, SonarrError, SonarrSeries};
pub use tvmaze::{DisabledShowDirectory, ShowDirectory, TvMazeClient};
