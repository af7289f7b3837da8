// media-organizer - Rename, move and de-duplicate movie and TV libraries
//
// This is the library crate containing the organizer, the remote API clients and
// the data structures. The binary crate (main.rs) provides the command line entry point.

pub mod cli;
pub mod config;
pub mod logging;
pub mod models;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use models::{AppConfig, AppState, MediaType, RunSummary};
pub use services::{MediaOrganizer, MissingEpisodeAnalyzer, OrganizeOptions};
pub use state::{StateChange, StateManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
