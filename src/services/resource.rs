//! Resource utilities that talk to the video platform directly
//!
//! Used by the session service and by CLI commands that need no model.

use super::session::{require, SessionError};
use crate::models::{RepairSettings, StudyPlanDocument, VideoResource};
use crate::parser::extract_video_id;
use crate::repair::{
    duration_for_query, Liveness, RepairReport, ResourceProbe, ResourceRepairEngine,
};
use serde::Serialize;

/// Results returned by a multi-result search
pub const SEARCH_RESULTS: u32 = 10;

/// Result of a single-link check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkCheck {
    pub video_id: String,
    /// `None` when the platform could not be asked
    pub liveness: Option<Liveness>,
    pub live: bool,
}

/// Derive the video id from a link and ask the platform whether it is live
///
/// Probe errors are logged and reported as not live.
pub async fn check_link(probe: &dyn ResourceProbe, url: &str) -> Result<LinkCheck, SessionError> {
    let url = require("url", url)?;
    let video_id = extract_video_id(url)
        .ok_or_else(|| SessionError::InvalidInput(format!("not a video link: {}", url)))?;

    let liveness = match probe.check_liveness(video_id.as_str()).await {
        Ok(liveness) => Some(liveness),
        Err(e) => {
            tracing::warn!(video_id = %video_id, error = %e, "liveness check failed");
            None
        }
    };

    Ok(LinkCheck {
        video_id: video_id.as_str().to_string(),
        live: liveness == Some(Liveness::Live),
        liveness,
    })
}

/// Single best video for a phrase; probe errors yield `None`
pub async fn search_similar(
    probe: &dyn ResourceProbe,
    phrase: &str,
) -> Result<Option<VideoResource>, SessionError> {
    let phrase = require("search_message", phrase)?;
    match probe.search(phrase).await {
        Ok(candidate) => Ok(candidate),
        Err(e) => {
            tracing::warn!(error = %e, "search failed");
            Ok(None)
        }
    }
}

/// Relevance-ranked videos for a free-text query
///
/// Hours named in the query ("... 2 hours ...") become a length filter.
/// Probe errors yield an empty list.
pub async fn search_videos(
    probe: &dyn ResourceProbe,
    query: &str,
) -> Result<Vec<VideoResource>, SessionError> {
    let query = require("search_message", query)?;
    let duration = duration_for_query(query);
    match probe.search_many(query, duration, SEARCH_RESULTS).await {
        Ok(videos) => Ok(videos),
        Err(e) => {
            tracing::warn!(error = %e, "multi-result search failed");
            Ok(Vec::new())
        }
    }
}

/// View and like counts for one video
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    pub video_id: String,
    pub views: Option<u64>,
    pub likes: Option<u64>,
    /// The platform had no counters; `similar` stands in for the video
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similar: Option<VideoResource>,
}

/// Counters for a link or bare identifier, falling back to a similar video
///
/// When the platform does not know the video, a search on the identifier
/// supplies a stand-in and the counters stay empty.
pub async fn video_stats(
    probe: &dyn ResourceProbe,
    video: &str,
) -> Result<StatsReport, SessionError> {
    let video = require("video_id", video)?;
    let video_id = extract_video_id(video)
        .map(|id| id.as_str().to_string())
        .or_else(|| is_bare_video_id(video).then(|| video.to_string()))
        .ok_or_else(|| SessionError::InvalidInput(format!("not a video link or id: {}", video)))?;

    if let Some(stats) = probe.video_stats(&video_id).await? {
        return Ok(StatsReport {
            video_id,
            views: stats.views,
            likes: stats.likes,
            fallback: false,
            similar: None,
        });
    }

    tracing::debug!(video_id = %video_id, "no counters, searching for a similar video");
    let similar = match probe.search(&video_id).await {
        Ok(candidate) => candidate,
        Err(e) => {
            tracing::warn!(video_id = %video_id, error = %e, "fallback search failed");
            None
        }
    };

    Ok(StatsReport {
        video_id,
        views: None,
        likes: None,
        fallback: true,
        similar,
    })
}

fn is_bare_video_id(text: &str) -> bool {
    text.len() == 11
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Repair a plan outside any conversation
pub async fn repair_plan(
    probe: &dyn ResourceProbe,
    settings: &RepairSettings,
    request: &str,
    plan: StudyPlanDocument,
) -> (StudyPlanDocument, RepairReport) {
    ResourceRepairEngine::new(probe, settings)
        .repair_with_report(request, plan)
        .await
}
