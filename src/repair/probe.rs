//! Video platform probe
//!
//! `ResourceProbe` is the seam between the repair engine and the video
//! platform: a liveness check for a known identifier and a single-candidate
//! search. Multi-result search and view statistics serve the resource
//! endpoints and have conservative defaults, so a probe that only repairs
//! needs the first two. `YoutubeProbe` implements all of it against the
//! YouTube Data API v3.

use super::credentials::CredentialPool;
use crate::models::{VideoResource, YoutubeConfig};
use crate::parser::watch_url;
use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Liveness verdict for a video identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Liveness {
    Live,
    Dead,
    /// Platform answered but the status could not be interpreted
    Ambiguous,
}

/// Length filter understood by the platform search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoDuration {
    /// Under 4 minutes
    Short,
    /// 4 to 20 minutes
    Medium,
    /// Over 20 minutes
    Long,
}

impl VideoDuration {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoDuration::Short => "short",
            VideoDuration::Medium => "medium",
            VideoDuration::Long => "long",
        }
    }
}

/// Public counters of a video; `None` when the platform hides a counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct VideoStats {
    pub views: Option<u64>,
    pub likes: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("no video platform credentials configured")]
    NoCredentials,

    #[error("quota exceeded or access forbidden (HTTP {status})")]
    RateLimited { status: u16 },

    #[error("video platform returned HTTP {status}")]
    Http { status: u16 },

    #[error("video platform transport error: {0}")]
    Transport(String),

    #[error("invalid video platform response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ProbeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ProbeError::InvalidResponse(e.to_string())
        } else {
            ProbeError::Transport(e.to_string())
        }
    }
}

#[async_trait]
pub trait ResourceProbe: Send + Sync {
    /// Confirm that a video identifier resolves to an accessible video
    async fn check_liveness(&self, video_id: &str) -> Result<Liveness, ProbeError>;

    /// Return at most one candidate for a search phrase
    async fn search(&self, phrase: &str) -> Result<Option<VideoResource>, ProbeError>;

    /// Up to `max` candidates ranked by relevance
    async fn search_many(
        &self,
        phrase: &str,
        _duration: Option<VideoDuration>,
        max: u32,
    ) -> Result<Vec<VideoResource>, ProbeError> {
        let candidate = self.search(phrase).await?;
        Ok(candidate.into_iter().take(max as usize).collect())
    }

    /// View and like counts; `None` when the video is unknown to the platform
    async fn video_stats(&self, _video_id: &str) -> Result<Option<VideoStats>, ProbeError> {
        Ok(None)
    }
}

// =============================================================================
// YouTube Data API v3
// =============================================================================

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct StatisticsListResponse {
    #[serde(default)]
    items: Vec<StatisticsItem>,
}

#[derive(Debug, Deserialize)]
struct StatisticsItem {
    #[serde(default)]
    statistics: StatisticsCounts,
}

/// Counters arrive as decimal strings
#[derive(Debug, Default, Deserialize)]
struct StatisticsCounts {
    #[serde(rename = "viewCount", default)]
    view_count: Option<String>,
    #[serde(rename = "likeCount", default)]
    like_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    id: Option<SearchItemId>,
    #[serde(default)]
    snippet: Option<SearchSnippet>,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId", default)]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchSnippet {
    #[serde(default)]
    title: Option<String>,
}

pub struct YoutubeProbe {
    http: HttpClient,
    base_url: String,
    region_code: String,
    credentials: CredentialPool,
}

impl YoutubeProbe {
    pub fn new(config: &YoutubeConfig, credentials: CredentialPool) -> Result<Self, ProbeError> {
        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProbeError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            region_code: config.region_code.clone(),
            credentials,
        })
    }

    /// Build a probe whose key pool comes from the process environment
    pub fn from_config(config: &YoutubeConfig) -> Result<Self, ProbeError> {
        Self::new(config, CredentialPool::from_config(config))
    }

    fn api_key(&self) -> Result<&str, ProbeError> {
        self.credentials.select().ok_or(ProbeError::NoCredentials)
    }
}

#[async_trait]
impl ResourceProbe for YoutubeProbe {
    async fn check_liveness(&self, video_id: &str) -> Result<Liveness, ProbeError> {
        let key = self.api_key()?;
        let response = self
            .http
            .get(format!("{}/videos", self.base_url))
            .query(&[("id", video_id), ("key", key), ("part", "id")])
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let body: VideoListResponse = response.json().await?;
                Ok(if body.items.is_empty() {
                    Liveness::Dead
                } else {
                    Liveness::Live
                })
            }
            StatusCode::NOT_FOUND => Ok(Liveness::Dead),
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                Err(ProbeError::RateLimited {
                    status: response.status().as_u16(),
                })
            }
            status => {
                tracing::debug!(video_id, status = status.as_u16(), "unexpected liveness status");
                Ok(Liveness::Ambiguous)
            }
        }
    }

    async fn search(&self, phrase: &str) -> Result<Option<VideoResource>, ProbeError> {
        let body = self
            .search_list(&[("q", phrase), ("order", "rating"), ("maxResults", "1")])
            .await?;
        Ok(candidates(body).next())
    }

    async fn search_many(
        &self,
        phrase: &str,
        duration: Option<VideoDuration>,
        max: u32,
    ) -> Result<Vec<VideoResource>, ProbeError> {
        let max = max.to_string();
        let mut params = vec![("q", phrase), ("order", "relevance"), ("maxResults", max.as_str())];
        if let Some(duration) = duration {
            params.push(("videoDuration", duration.as_str()));
        }
        let body = self.search_list(&params).await?;
        Ok(candidates(body).collect())
    }

    async fn video_stats(&self, video_id: &str) -> Result<Option<VideoStats>, ProbeError> {
        let key = self.api_key()?;
        let response = self
            .http
            .get(format!("{}/videos", self.base_url))
            .query(&[("id", video_id), ("key", key), ("part", "statistics")])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        check_status(status)?;

        let body: StatisticsListResponse = response.json().await?;
        Ok(body.items.into_iter().next().map(|item| VideoStats {
            views: parse_count(item.statistics.view_count),
            likes: parse_count(item.statistics.like_count),
        }))
    }
}

impl YoutubeProbe {
    /// `search.list` restricted to safe, regional video results
    async fn search_list(&self, params: &[(&str, &str)]) -> Result<SearchListResponse, ProbeError> {
        let key = self.api_key()?;
        let response = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(params)
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("regionCode", self.region_code.as_str()),
                ("safeSearch", "strict"),
                ("key", key),
            ])
            .send()
            .await?;

        check_status(response.status())?;
        Ok(response.json().await?)
    }
}

fn check_status(status: StatusCode) -> Result<(), ProbeError> {
    if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ProbeError::RateLimited {
            status: status.as_u16(),
        });
    }
    if !status.is_success() {
        return Err(ProbeError::Http {
            status: status.as_u16(),
        });
    }
    Ok(())
}

/// Video results in response order; channels and playlists are skipped
fn candidates(body: SearchListResponse) -> impl Iterator<Item = VideoResource> {
    body.items.into_iter().filter_map(|item| {
        let video_id = item.id?.video_id.filter(|id| !id.is_empty())?;
        let title = item
            .snippet
            .and_then(|s| s.title)
            .unwrap_or_else(|| "No Title".to_string());
        Some(VideoResource::new(title, watch_url(&video_id)))
    })
}

fn parse_count(raw: Option<String>) -> Option<u64> {
    raw.and_then(|count| count.trim().parse().ok())
}
