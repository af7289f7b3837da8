use serde::{Deserialize, Serialize};

pub const DEFAULT_SONARR_URL: &str = "http://localhost:8989/api/v3";
pub const DEFAULT_TVMAZE_URL: &str = "https://api.tvmaze.com";
pub const DEFAULT_MEDIAINFO_TIMEOUT_SECS: u64 = 30;

/// Application configuration from `config.ini`
///
/// Each INI section maps onto one settings struct. Section and key names are
/// lower-cased by [`crate::config::ConfigManager`] before deserializing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub sonarr: SonarrSettings,

    #[serde(default)]
    pub tvmaze: TvMazeSettings,

    #[serde(default)]
    pub mediainfo: MediaInfoSettings,

    #[serde(default)]
    pub organizer: OrganizerSettings,
}

impl AppConfig {
    /// Apply `--sonarr-url` / `--sonarr-api-key` over the file values. Blank overrides are ignored.
    pub fn apply_sonarr_overrides(&mut self, url: Option<&str>, api_key: Option<&str>) {
        if let Some(url) = url.map(str::trim).filter(|url| !url.is_empty()) {
            self.sonarr.sonarr_url = url.to_string();
        }
        if let Some(key) = api_key.map(str::trim).filter(|key| !key.is_empty()) {
            self.sonarr.sonarr_api_key = key.to_string();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SonarrSettings {
    /// Base URL including the `/api/v3` prefix
    #[serde(default = "default_sonarr_url")]
    pub sonarr_url: String,

    #[serde(default)]
    pub sonarr_api_key: String,
}

impl Default for SonarrSettings {
    fn default() -> Self {
        Self {
            sonarr_url: default_sonarr_url(),
            sonarr_api_key: String::new(),
        }
    }
}

impl SonarrSettings {
    pub fn has_api_key(&self) -> bool {
        !self.sonarr_api_key.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TvMazeSettings {
    #[serde(default = "default_tvmaze_url")]
    pub url: String,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for TvMazeSettings {
    fn default() -> Self {
        Self {
            url: default_tvmaze_url(),
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInfoSettings {
    /// Explicit executable; `mediainfo` on PATH is used when unset or empty
    #[serde(default)]
    pub path: Option<String>,

    #[serde(default = "default_mediainfo_timeout")]
    pub timeout_secs: u64,
}

impl Default for MediaInfoSettings {
    fn default() -> Self {
        Self {
            path: None,
            timeout_secs: DEFAULT_MEDIAINFO_TIMEOUT_SECS,
        }
    }
}

impl MediaInfoSettings {
    /// Configured executable path, ignoring blank values
    pub fn configured_path(&self) -> Option<&str> {
        self.path
            .as_deref()
            .map(str::trim)
            .filter(|path| !path.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizerSettings {
    #[serde(default = "default_true")]
    pub cleanup_unwanted_files: bool,

    #[serde(default = "default_true")]
    pub remove_empty_folders: bool,
}

impl Default for OrganizerSettings {
    fn default() -> Self {
        Self {
            cleanup_unwanted_files: true,
            remove_empty_folders: true,
        }
    }
}

fn default_sonarr_url() -> String {
    DEFAULT_SONARR_URL.to_string()
}

fn default_tvmaze_url() -> String {
    DEFAULT_TVMAZE_URL.to_string()
}

fn default_mediainfo_timeout() -> u64 {
    DEFAULT_MEDIAINFO_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.sonarr.sonarr_url, "http://localhost:8989/api/v3");
        assert!(config.sonarr.sonarr_api_key.is_empty());
        assert!(!config.sonarr.has_api_key());
        assert_eq!(config.tvmaze.url, "https://api.tvmaze.com");
        assert!(config.tvmaze.enabled);
        assert_eq!(config.mediainfo.timeout_secs, 30);
        assert!(config.organizer.cleanup_unwanted_files);
        assert!(config.organizer.remove_empty_folders);
    }

    #[test]
    fn test_configured_path_ignores_blank() {
        let mut settings = MediaInfoSettings::default();
        assert_eq!(settings.configured_path(), None);

        settings.path = Some("   ".to_string());
        assert_eq!(settings.configured_path(), None);

        settings.path = Some("/usr/bin/mediainfo".to_string());
        assert_eq!(settings.configured_path(), Some("/usr/bin/mediainfo"));
    }

    #[test]
    fn test_apply_sonarr_overrides() {
        let mut config = AppConfig::default();
        config.apply_sonarr_overrides(Some("http://nas:8989/api/v3"), Some(" abc123 "));

        assert_eq!(config.sonarr.sonarr_url, "http://nas:8989/api/v3");
        assert_eq!(config.sonarr.sonarr_api_key, "abc123");

        config.apply_sonarr_overrides(Some(""), None);
        assert_eq!(config.sonarr.sonarr_url, "http://nas:8989/api/v3");
    }
}
