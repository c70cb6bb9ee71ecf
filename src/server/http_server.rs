//! HTTP server
//!
//! Routes:
//! - `GET  /health`
//! - `POST /response` full pipeline for one message
//! - `POST /response/critique` critique of the latest draft
//! - `POST /response/improved` improvement of the latest draft and critique
//! - `POST /check-resource` liveness of a single video link
//! - `POST /search-similar` best video for a phrase
//! - `POST /search` relevance-ranked videos for a query
//! - `POST /video-stats` view and like counts, with a similar-video fallback
//! - `POST /info` background-level table for a subject
//! - `POST /plan-reasoning` week-by-week reasoning for the latest improved plan
//! - `POST /topic-explanations` why a topic matters in that plan
//! - `POST /generate-objectives` learning objectives for a topic

use super::error::ApiError;
use crate::models::{ServerConfig, VideoResource};
use crate::orchestrator::PipelineOutput;
use crate::services::{PlanReasoning, SessionService, StatsReport};
use crate::Result;
use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// Application State
// =============================================================================

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<SessionService>,
}

impl AppState {
    pub fn new(session: Arc<SessionService>) -> Self {
        Self { session }
    }
}

// =============================================================================
// Request / Response Bodies
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct MessageBody {
    #[serde(rename = "participantId", default)]
    pub participant_id: String,
    #[serde(default)]
    pub user_message: String,
}

#[derive(Debug, Deserialize)]
pub struct ParticipantBody {
    #[serde(rename = "participantId", default)]
    pub participant_id: String,
    #[serde(default)]
    pub user_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckResourceBody {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchBody {
    #[serde(default)]
    pub search_message: String,
}

#[derive(Debug, Deserialize)]
pub struct InfoBody {
    #[serde(default)]
    pub info_message: String,
}

#[derive(Debug, Deserialize)]
pub struct VideoBody {
    #[serde(default)]
    pub video_id: String,
}

#[derive(Debug, Deserialize)]
pub struct TopicBody {
    #[serde(rename = "participantId", default)]
    pub participant_id: String,
    #[serde(default)]
    pub user_message: String,
}

#[derive(Debug, Serialize)]
pub struct ReplyBody {
    pub response: Value,
}

#[derive(Debug, Serialize)]
pub struct CheckResourceReply {
    pub video_id: String,
    pub live: bool,
}

#[derive(Debug, Serialize)]
pub struct SearchReply {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VideoListReply {
    pub response: Vec<VideoResource>,
}

#[derive(Debug, Serialize)]
pub struct ExplanationReply {
    pub explanation: String,
}

#[derive(Debug, Serialize)]
pub struct ObjectivesReply {
    pub objectives: String,
}

#[derive(Debug, Serialize)]
pub struct ReasoningReply {
    pub response: String,
    pub weeks: Option<IndexMap<String, String>>,
}

impl From<PlanReasoning> for ReasoningReply {
    fn from(reasoning: PlanReasoning) -> Self {
        Self {
            response: reasoning.raw,
            weeks: reasoning.weeks,
        }
    }
}

fn output_value(output: &PipelineOutput) -> Value {
    match output {
        PipelineOutput::Plan(plan) => plan.to_json_value(),
        PipelineOutput::Text(text) => Value::String(text.clone()),
    }
}

// =============================================================================
// Server Startup
// =============================================================================

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/response", post(handle_response))
        .route("/response/critique", post(handle_critique))
        .route("/response/improved", post(handle_improved))
        .route("/check-resource", post(handle_check_resource))
        .route("/search-similar", post(handle_search_similar))
        .route("/search", post(handle_search))
        .route("/video-stats", post(handle_video_stats))
        .route("/info", post(handle_info))
        .route("/plan-reasoning", post(handle_plan_reasoning))
        .route("/topic-explanations", post(handle_topic_explanation))
        .route("/generate-objectives", post(handle_objectives))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until Ctrl-C
pub async fn start_server(config: &ServerConfig, session: Arc<SessionService>) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let app = build_router(AppState::new(session));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, "server listening");
    println!("✓ Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await
        .context("Server error")?;
    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

async fn health_check() -> &'static str {
    "OK"
}

async fn handle_response(
    State(state): State<AppState>,
    body: std::result::Result<Json<MessageBody>, JsonRejection>,
) -> std::result::Result<Json<ReplyBody>, ApiError> {
    let Json(body) = body?;
    let reply = state
        .session
        .handle_message(&body.participant_id, &body.user_message)
        .await?;

    Ok(Json(ReplyBody {
        response: output_value(reply.output()),
    }))
}

async fn handle_critique(
    State(state): State<AppState>,
    body: std::result::Result<Json<ParticipantBody>, JsonRejection>,
) -> std::result::Result<Json<ReplyBody>, ApiError> {
    let Json(body) = body?;
    let critique = state.session.critique_latest(&body.participant_id).await?;
    Ok(Json(ReplyBody {
        response: Value::String(critique),
    }))
}

async fn handle_improved(
    State(state): State<AppState>,
    body: std::result::Result<Json<ParticipantBody>, JsonRejection>,
) -> std::result::Result<Json<ReplyBody>, ApiError> {
    let Json(body) = body?;
    let output = state
        .session
        .improve_latest(&body.participant_id, body.user_message.as_deref())
        .await?;
    Ok(Json(ReplyBody {
        response: output_value(&output),
    }))
}

async fn handle_check_resource(
    State(state): State<AppState>,
    body: std::result::Result<Json<CheckResourceBody>, JsonRejection>,
) -> std::result::Result<Json<CheckResourceReply>, ApiError> {
    let Json(body) = body?;
    let check = state.session.check_link(&body.url).await?;
    Ok(Json(CheckResourceReply {
        video_id: check.video_id,
        live: check.live,
    }))
}

async fn handle_search_similar(
    State(state): State<AppState>,
    body: std::result::Result<Json<SearchBody>, JsonRejection>,
) -> std::result::Result<Json<SearchReply>, ApiError> {
    let Json(body) = body?;
    let candidate = state.session.search_similar(&body.search_message).await?;
    Ok(Json(match candidate {
        Some(video) => SearchReply {
            exists: true,
            title: Some(video.title),
            link: Some(video.link),
        },
        None => SearchReply {
            exists: false,
            title: None,
            link: None,
        },
    }))
}

async fn handle_search(
    State(state): State<AppState>,
    body: std::result::Result<Json<SearchBody>, JsonRejection>,
) -> std::result::Result<Json<VideoListReply>, ApiError> {
    let Json(body) = body?;
    let videos = state.session.search_videos(&body.search_message).await?;
    Ok(Json(VideoListReply { response: videos }))
}

async fn handle_video_stats(
    State(state): State<AppState>,
    body: std::result::Result<Json<VideoBody>, JsonRejection>,
) -> std::result::Result<Json<StatsReport>, ApiError> {
    let Json(body) = body?;
    Ok(Json(state.session.video_stats(&body.video_id).await?))
}

async fn handle_info(
    State(state): State<AppState>,
    body: std::result::Result<Json<InfoBody>, JsonRejection>,
) -> std::result::Result<Json<ReplyBody>, ApiError> {
    let Json(body) = body?;
    let table = state.session.background_info(&body.info_message).await?;
    Ok(Json(ReplyBody {
        response: Value::String(table),
    }))
}

async fn handle_plan_reasoning(
    State(state): State<AppState>,
    body: std::result::Result<Json<ParticipantBody>, JsonRejection>,
) -> std::result::Result<Json<ReasoningReply>, ApiError> {
    let Json(body) = body?;
    let reasoning = state.session.plan_reasoning(&body.participant_id).await?;
    Ok(Json(reasoning.into()))
}

async fn handle_topic_explanation(
    State(state): State<AppState>,
    body: std::result::Result<Json<TopicBody>, JsonRejection>,
) -> std::result::Result<Json<ExplanationReply>, ApiError> {
    let Json(body) = body?;
    let explanation = state
        .session
        .topic_explanation(&body.participant_id, &body.user_message)
        .await?;
    Ok(Json(ExplanationReply { explanation }))
}

async fn handle_objectives(
    State(state): State<AppState>,
    body: std::result::Result<Json<TopicBody>, JsonRejection>,
) -> std::result::Result<Json<ObjectivesReply>, ApiError> {
    let Json(body) = body?;
    let objectives = state
        .session
        .learning_objectives(&body.participant_id, &body.user_message)
        .await?;
    Ok(Json(ObjectivesReply { objectives }))
}
