use crate::models::{EpisodeKey, SonarrSettings};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors talking to Sonarr
#[derive(Error, Debug)]
pub enum SonarrError {
    #[error("Sonarr API key not set")]
    MissingApiKey,

    #[error("Invalid Sonarr URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Sonarr request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sonarr returned status {status} for {endpoint}")]
    Status { status: u16, endpoint: String },
}

/// Series as listed by `GET /series`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SonarrSeries {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
}

/// Episode as listed by `GET /episode?seriesId=`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SonarrEpisode {
    pub id: i64,
    pub series_id: i64,
    pub season_number: u32,
    pub episode_number: u32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub has_file: bool,
    #[serde(default)]
    pub monitored: bool,
}

impl SonarrEpisode {
    pub fn key(&self) -> EpisodeKey {
        EpisodeKey::new(self.season_number, self.episode_number)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MonitorRequest<'a> {
    episode_ids: &'a [i64],
    monitored: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CommandRequest<'a> {
    name: &'static str,
    episode_ids: &'a [i64],
}

/// Remote library manager operations used by the missing-episode pass
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LibraryManager: Send + Sync {
    async fn list_series(&self) -> Result<Vec<SonarrSeries>, SonarrError>;

    async fn episodes(&self, series_id: i64) -> Result<Vec<SonarrEpisode>, SonarrError>;

    /// Mark episodes as monitored
    async fn monitor_episodes(&self, episode_ids: &[i64]) -> Result<(), SonarrError>;

    /// Queue an `EpisodeSearch` command for the episodes
    async fn search_episodes(&self, episode_ids: &[i64]) -> Result<(), SonarrError>;
}

/// Sonarr v3 REST client authenticated with the `X-Api-Key` header
#[derive(Clone)]
pub struct SonarrClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for SonarrClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SonarrClient")
            .field("base_url", &self.base_url)
            .field("has_api_key", &!self.api_key.is_empty())
            .finish()
    }
}

impl SonarrClient {
    /// Build a client for `sonarr_url`, which already includes the `/api/v3` prefix.
    pub fn new(sonarr_url: &str, api_key: &str) -> Result<Self, SonarrError> {
        let parsed = Url::parse(sonarr_url).map_err(|e| SonarrError::InvalidUrl {
            url: sonarr_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SonarrError::InvalidUrl {
                url: sonarr_url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        tracing::debug!("Creating Sonarr client with base URL: {}", sonarr_url);

        Ok(Self {
            client,
            base_url: sonarr_url.trim_end_matches('/').to_string(),
            api_key: api_key.trim().to_string(),
        })
    }

    pub fn from_settings(settings: &SonarrSettings) -> Result<Self, SonarrError> {
        Self::new(&settings.sonarr_url, &settings.sonarr_api_key)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder, SonarrError> {
        if self.api_key.is_empty() {
            return Err(SonarrError::MissingApiKey);
        }
        Ok(builder.header("X-Api-Key", &self.api_key))
    }

    async fn send(&self, builder: RequestBuilder, endpoint: &str) -> Result<reqwest::Response, SonarrError> {
        let response = self.authorized(builder)?.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SonarrError::Status {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl LibraryManager for SonarrClient {
    async fn list_series(&self) -> Result<Vec<SonarrSeries>, SonarrError> {
        let request = self.client.get(self.build_url("series"));
        let series: Vec<SonarrSeries> = self.send(request, "series").await?.json().await?;
        tracing::debug!("Sonarr lists {} series", series.len());
        Ok(series)
    }

    async fn episodes(&self, series_id: i64) -> Result<Vec<SonarrEpisode>, SonarrError> {
        let request = self
            .client
            .get(self.build_url("episode"))
            .query(&[("seriesId", series_id)]);
        let episodes: Vec<SonarrEpisode> = self.send(request, "episode").await?.json().await?;
        tracing::debug!("Sonarr lists {} episodes for series {}", episodes.len(), series_id);
        Ok(episodes)
    }

    async fn monitor_episodes(&self, episode_ids: &[i64]) -> Result<(), SonarrError> {
        let request = self
            .client
            .put(self.build_url("episode/monitor"))
            .json(&MonitorRequest {
                episode_ids,
                monitored: true,
            });
        self.send(request, "episode/monitor").await?;
        Ok(())
    }

    async fn search_episodes(&self, episode_ids: &[i64]) -> Result<(), SonarrError> {
        let request = self.client.post(self.build_url("command")).json(&CommandRequest {
            name: "EpisodeSearch",
            episode_ids,
        });
        self.send(request, "command").await?;
        Ok(())
    }
}
