use crate::models::MediaInfoSettings;
use async_trait::async_trait;
use camino::Utf8Path;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

/// Date fields searched for a release year, in priority order
pub const YEAR_FIELDS: &[&str] = &[
    "Recorded_Date",
    "Encoded_Date",
    "Tagged_Date",
    "File_Modified_Date",
    "File_Created_Date",
];

/// Errors from running or reading MediaInfo
#[derive(Error, Debug)]
pub enum MediaInfoError {
    #[error("MediaInfo executable not found")]
    NotFound,

    #[error("Failed to run MediaInfo: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("MediaInfo timed out after {0:?}")]
    Timeout(Duration),

    #[error("MediaInfo exited with code {code}: {stderr}")]
    Failed { code: i32, stderr: String },

    #[error("Failed to parse MediaInfo output: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Tags read from the `General` track of a MediaInfo report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneralTrack {
    pub recorded_date: Option<String>,
    pub encoded_date: Option<String>,
    pub tagged_date: Option<String>,
    pub file_modified_date: Option<String>,
    pub file_created_date: Option<String>,
    pub album: Option<String>,
}

impl GeneralTrack {
    fn from_json(track: &Value) -> Self {
        let field = |name: &str| {
            track[name]
                .as_str()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        Self {
            recorded_date: field("Recorded_Date"),
            encoded_date: field("Encoded_Date"),
            tagged_date: field("Tagged_Date"),
            file_modified_date: field("File_Modified_Date"),
            file_created_date: field("File_Created_Date"),
            album: field("Album"),
        }
    }

    /// First four-digit run in the first date field (by [`YEAR_FIELDS`] order) that has one.
    pub fn release_year(&self) -> Option<String> {
        [
            &self.recorded_date,
            &self.encoded_date,
            &self.tagged_date,
            &self.file_modified_date,
            &self.file_created_date,
        ]
        .into_iter()
        .flatten()
        .find_map(|value| first_four_digits(value))
    }

    /// Series name stored in the `Album` tag
    pub fn series_name(&self) -> Option<String> {
        self.album.clone()
    }
}

fn first_four_digits(value: &str) -> Option<String> {
    let bytes = value.as_bytes();
    bytes
        .windows(4)
        .position(|window| window.iter().all(u8::is_ascii_digit))
        .map(|start| value[start..start + 4].to_string())
}

/// Extract the `General` track from `mediainfo --Output=JSON` output.
///
/// Returns `Ok(None)` when the report has no media section or no General track.
pub fn parse_general_track(json: &[u8]) -> Result<Option<GeneralTrack>, MediaInfoError> {
    let report: Value = serde_json::from_slice(json)?;

    let track = report["media"]["track"]
        .as_array()
        .and_then(|tracks| {
            tracks
                .iter()
                .find(|track| track["@type"].as_str() == Some("General"))
        })
        .map(GeneralTrack::from_json);

    Ok(track)
}

/// Source of embedded file metadata
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataProbe: Send + Sync {
    async fn general_track(&self, path: &Utf8Path) -> Result<Option<GeneralTrack>, MediaInfoError>;
}

/// Release year from embedded metadata; failures are logged and yield `None`.
pub async fn probe_release_year(probe: &dyn MetadataProbe, path: &Utf8Path) -> Option<String> {
    match probe.general_track(path).await {
        Ok(track) => track.and_then(|track| track.release_year()),
        Err(MediaInfoError::NotFound) => None,
        Err(e) => {
            tracing::warn!("Error extracting release year from '{}': {}", path, e);
            None
        }
    }
}

/// Series name from the `Album` tag; failures are logged and yield `None`.
pub async fn probe_series_name(probe: &dyn MetadataProbe, path: &Utf8Path) -> Option<String> {
    match probe.general_track(path).await {
        Ok(track) => track.and_then(|track| track.series_name()),
        Err(MediaInfoError::NotFound) => None,
        Err(e) => {
            tracing::warn!("Error extracting series name from '{}': {}", path, e);
            None
        }
    }
}

/// Runs the MediaInfo command-line tool
///
/// The executable is resolved once at construction: the configured path when it
/// exists, otherwise `mediainfo` on `PATH`. A missing executable is reported once
/// and every lookup then yields [`MediaInfoError::NotFound`].
pub struct MediaInfoProbe {
    executable: Option<PathBuf>,
    timeout: Duration,
    warned_missing: AtomicBool,
}

impl MediaInfoProbe {
    pub fn from_settings(settings: &MediaInfoSettings) -> Self {
        let executable = match settings.configured_path() {
            Some(configured) => {
                let candidate = PathBuf::from(configured);
                if candidate.is_file() {
                    Some(candidate)
                } else {
                    tracing::warn!(
                        "Configured MediaInfo path '{}' does not exist, searching PATH",
                        configured
                    );
                    which::which(configured)
                        .or_else(|_| which::which("mediainfo"))
                        .ok()
                }
            }
            None => which::which("mediainfo").ok(),
        };

        if let Some(path) = &executable {
            tracing::info!("Using MediaInfo at {}", path.display());
        }

        Self::with_executable(executable, Duration::from_secs(settings.timeout_secs))
    }

    pub fn with_executable(executable: Option<PathBuf>, timeout: Duration) -> Self {
        Self {
            executable,
            timeout,
            warned_missing: AtomicBool::new(false),
        }
    }

    pub fn is_available(&self) -> bool {
        self.executable.is_some()
    }

    async fn run_json(&self, path: &Utf8Path) -> Result<Vec<u8>, MediaInfoError> {
        let Some(executable) = &self.executable else {
            if !self.warned_missing.swap(true, Ordering::Relaxed) {
                tracing::warn!(
                    "MediaInfo not found; years and series names will only come from file names"
                );
            }
            return Err(MediaInfoError::NotFound);
        };

        tracing::debug!("Running MediaInfo on {}", path);

        let child = Command::new(executable)
            .arg("--Output=JSON")
            .arg(path.as_std_path())
            .kill_on_drop(true)
            .output();

        let output = timeout(self.timeout, child)
            .await
            .map_err(|_| MediaInfoError::Timeout(self.timeout))??;

        if !output.status.success() {
            return Err(MediaInfoError::Failed {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl MetadataProbe for MediaInfoProbe {
    async fn general_track(&self, path: &Utf8Path) -> Result<Option<GeneralTrack>, MediaInfoError> {
        let stdout = self.run_json(path).await?;
        parse_general_track(&stdout)
    }
}
