use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::error::ApiError;
use crate::github::USER_AGENT;

pub const DEFAULT_BASE_URL: &str = "https://noembed.com";
pub const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Shown in place of the video list when nothing could be fetched.
pub const FALLBACK_MESSAGE: &str = "Visit my YouTube channel to see my latest videos!";

#[derive(Deserialize)]
struct EmbedMetadata {
    title: String,
    #[serde(default)]
    thumbnail_url: String,
    #[serde(default)]
    author_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    pub author: String,
    pub url: String,
}

#[derive(Clone)]
pub struct EmbedClient {
    http: Arc<Client>,
    base_url: Arc<str>,
}

impl EmbedClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build embed HTTP client")?;

        Ok(Self {
            http: Arc::new(http),
            base_url: DEFAULT_BASE_URL.into(),
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').into();
        self
    }

    pub async fn fetch_video(&self, id: &str) -> Result<Video> {
        let url = format!("{}/embed", self.base_url);
        let watch = format!("{WATCH_URL}{id}");
        log::debug!("GET {url}?url={watch}");

        let resp = self
            .http
            .get(&url)
            .query(&[("url", watch.as_str())])
            .send()
            .await
            .with_context(|| format!("Network error fetching metadata for {id}"))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url,
                status: status.as_u16(),
            }
            .into());
        }

        let meta: EmbedMetadata = resp
            .json()
            .await
            .with_context(|| format!("Failed to parse metadata for {id}"))?;

        Ok(Video {
            id: id.to_string(),
            title: meta.title,
            thumbnail: meta.thumbnail_url,
            author: meta.author_name,
            url: watch,
        })
    }

    /// Metadata for each id in order, skipping any that fail.
    pub async fn fetch_videos(&self, ids: &[String]) -> Vec<Video> {
        let mut videos = Vec::with_capacity(ids.len());

        for id in ids {
            match self.fetch_video(id).await {
                Ok(video) => videos.push(video),
                Err(e) => log::warn!("Error fetching video {id}: {e:#}"),
            }
        }

        videos
    }
}
