use crate::models::TvMazeSettings;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Looks up when a series first aired
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShowDirectory: Send + Sync {
    /// Premiere year of the best match for `series_title`, if any.
    async fn premiere_year(&self, series_title: &str) -> Option<String>;
}

/// Directory used when TVmaze lookups are switched off in the config
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledShowDirectory;

#[async_trait]
impl ShowDirectory for DisabledShowDirectory {
    async fn premiere_year(&self, _series_title: &str) -> Option<String> {
        None
    }
}

#[derive(Debug, Deserialize)]
struct ShowSearchResult {
    #[serde(default)]
    premiered: Option<String>,
}

/// `2008-01-20` -> `2008`
pub fn year_from_premiere(premiered: &str) -> Option<String> {
    premiered
        .split('-')
        .next()
        .map(str::trim)
        .filter(|year| !year.is_empty())
        .map(str::to_string)
}

/// TVmaze `singlesearch` client with a per-run cache
///
/// Misses are cached too, so a series with many episodes costs one request.
pub struct TvMazeClient {
    client: Client,
    base_url: String,
    cache: Mutex<HashMap<String, Option<String>>>,
}

impl TvMazeClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        tracing::debug!("Creating TVmaze client with base URL: {}", base_url);

        Ok(Self {
            client,
            base_url,
            cache: Mutex::new(HashMap::new()),
        })
    }

    pub fn from_settings(settings: &TvMazeSettings) -> Result<Self, reqwest::Error> {
        Self::new(settings.url.clone())
    }

    async fn fetch_premiere_year(&self, series_title: &str) -> Result<Option<String>, reqwest::Error> {
        let url = format!("{}/singlesearch/shows", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("q", series_title)])
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            tracing::debug!(
                "TVmaze returned {} for '{}'",
                response.status(),
                series_title
            );
            return Ok(None);
        }

        let show: ShowSearchResult = response.json().await?;
        Ok(show.premiered.as_deref().and_then(year_from_premiere))
    }
}

#[async_trait]
impl ShowDirectory for TvMazeClient {
    async fn premiere_year(&self, series_title: &str) -> Option<String> {
        let key = series_title.to_lowercase();
        let cached = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        if let Some(year) = cached {
            return year;
        }

        let year = match self.fetch_premiere_year(series_title).await {
            Ok(year) => year,
            Err(e) => {
                tracing::warn!("Error fetching release year for '{}': {}", series_title, e);
                None
            }
        };

        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, year.clone());
        year
    }
}
