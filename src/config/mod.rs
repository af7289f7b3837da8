use crate::models::AppConfig;
use anyhow::{Context, Result, anyhow, bail};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, File, FileFormat};
use std::fs;

/// Default configuration file name, looked up next to the executable
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Commented template written by `init-config`
pub const CONFIG_TEMPLATE: &str = r#"; media-organizer configuration
;
; Use forward slashes in paths, also on Windows.

[Sonarr]
; Base URL of the Sonarr v3 API, including /api/v3
sonarr_url = http://localhost:8989/api/v3
; Settings > General > Security > API Key
sonarr_api_key =

[TvMaze]
; Used to add the premiere year to series folder names
url = https://api.tvmaze.com
enabled = true

[MediaInfo]
; Full path to the mediainfo executable. When unset, PATH is searched.
; path = /usr/bin/mediainfo
timeout_secs = 30

[Organizer]
; Delete files that are neither videos nor subtitles after organizing
cleanup_unwanted_files = true
; Remove folders left empty after organizing
remove_empty_folders = true
"#;

/// Configuration manager for the INI configuration file.
///
/// The file holds four sections, `[Sonarr]`, `[TvMaze]`, `[MediaInfo]` and
/// `[Organizer]`. Every key is optional and falls back to its default.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager for an explicit configuration file.
    pub fn new<P: AsRef<Utf8Path>>(config_path: P) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
        }
    }

    /// ConfigManager for `config.ini` in the directory holding the executable.
    pub fn beside_executable() -> Result<Self> {
        let exe = std::env::current_exe().context("Failed to locate the running executable")?;
        let exe = Utf8PathBuf::from_path_buf(exe)
            .map_err(|path| anyhow!("Executable path is not valid UTF-8: {}", path.display()))?;
        let dir = exe
            .parent()
            .ok_or_else(|| anyhow!("Executable has no parent directory: {}", exe))?;

        Ok(Self::new(dir.join(CONFIG_FILE_NAME)))
    }

    /// Load the configuration file.
    ///
    /// # Returns
    /// The loaded AppConfig, or defaults if the file doesn't exist
    pub fn load(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            tracing::warn!(
                "Config file not found at {}, using defaults",
                self.config_path
            );
            return Ok(AppConfig::default());
        }

        let text = fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read config: {}", self.config_path))?;

        let settings = Config::builder()
            .add_source(File::from_str(&fold_ini_case(&text), FileFormat::Ini))
            .build()
            .with_context(|| format!("Failed to read config: {}", self.config_path))?;

        let config: AppConfig = settings
            .try_deserialize()
            .with_context(|| format!("Failed to parse config: {}", self.config_path))?;

        tracing::info!("Loaded config from {}", self.config_path);
        Ok(config)
    }

    /// Write the commented template to the configuration path.
    ///
    /// An existing file is only replaced when `overwrite` is set.
    pub fn write_template(&self, overwrite: bool) -> Result<()> {
        if self.config_path.exists() && !overwrite {
            bail!(
                "Config file already exists: {} (use --force to overwrite)",
                self.config_path
            );
        }

        if let Some(dir) = self.config_path.parent().filter(|dir| !dir.as_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir))?;
        }

        fs::write(&self.config_path, CONFIG_TEMPLATE)
            .with_context(|| format!("Failed to write config: {}", self.config_path))?;

        tracing::info!("Wrote config template to {}", self.config_path);
        Ok(())
    }

    /// Get the configuration file path.
    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }
}

/// Lower-case section names and keys, leaving values and comments alone.
///
/// Sections and keys match case-insensitively, so `[SONARR]` with
/// `Sonarr_Api_Key` reads the same as `[sonarr]` with `sonarr_api_key`.
fn fold_ini_case(text: &str) -> String {
    text.lines()
        .map(|line| {
            let trimmed = line.trim_start();
            if trimmed.starts_with(';') || trimmed.starts_with('#') {
                return line.to_string();
            }
            if trimmed.starts_with('[') {
                return match trimmed.find(']') {
                    Some(end) => format!("{}{}", trimmed[..=end].to_lowercase(), &trimmed[end + 1..]),
                    None => line.to_string(),
                };
            }
            match line.find(['=', ':']) {
                Some(pos) => format!("{}{}", line[..pos].to_lowercase(), &line[pos..]),
                None => line.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
