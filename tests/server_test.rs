//! HTTP API tests
//!
//! The router is driven in-process with `oneshot`, backed by a scripted model,
//! a fake probe and the in-memory conversation store.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use studyplan::models::{AppConfig, VideoResource};
use studyplan::orchestrator::{ChatMessage, ModelClient, ModelError, SamplingParams};
use studyplan::repair::{Liveness, ProbeError, ResourceProbe};
use studyplan::server::{build_router, AppState};
use studyplan::services::SessionService;
use studyplan::state::MemoryConversationStore;
use tower::ServiceExt;

const PLAN: &str = r#"```json
{"studyPlan_Overview": {"Week 1": "Basics"},
 "studyPlan": {"Week 1": [{"day": "Day 1", "topic": "Closures", "Time": "1 hour",
   "resources": {"YouTube": [{"title": "Closures", "link": "https://youtu.be/livelivelv1"}]}}]}}
```"#;

struct ScriptedModel {
    replies: Mutex<Vec<String>>,
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _sampling: SamplingParams,
    ) -> Result<String, ModelError> {
        self.replies
            .lock()
            .unwrap()
            .pop()
            .ok_or(ModelError::EmptyCompletion)
    }
}

/// Ids starting with "live" are live; searches for "nothing" come back empty
struct FakeProbe;

#[async_trait]
impl ResourceProbe for FakeProbe {
    async fn check_liveness(&self, video_id: &str) -> Result<Liveness, ProbeError> {
        Ok(if video_id.starts_with("live") {
            Liveness::Live
        } else {
            Liveness::Dead
        })
    }

    async fn search(&self, phrase: &str) -> Result<Option<VideoResource>, ProbeError> {
        if phrase.contains("nothing") {
            return Ok(None);
        }
        Ok(Some(VideoResource::new(
            "Closures in Rust",
            "https://www.youtube.com/watch?v=livelivelv2",
        )))
    }
}

fn app(replies: &[&str]) -> axum::Router {
    let model = Arc::new(ScriptedModel {
        replies: Mutex::new(replies.iter().rev().map(|r| r.to_string()).collect()),
    });
    let session = SessionService::new(
        model,
        Arc::new(FakeProbe),
        Arc::new(MemoryConversationStore::new()),
        &AppConfig::default(),
    );
    build_router(AppState::new(Arc::new(session)))
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()));
    (status, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health() {
        let app = app(&[]);
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::String("OK".to_string()));
    }

    #[tokio::test]
    async fn test_response_requires_fields() {
        let app = app(&[]);
        let (status, body) = send(
            &app,
            post("/response", json!({"participantId": "p1", "user_message": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("user_message"));

        let (status, _) = send(&app, post("/response", json!({"user_message": "hi"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = app(&[]);
        let request = Request::builder()
            .method("POST")
            .uri("/response")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.get("error").is_some());
    }

    #[tokio::test]
    async fn test_response_returns_plan_object() {
        let app = app(&[PLAN, "1. Add a project", PLAN]);
        let (status, body) = send(
            &app,
            post(
                "/response",
                json!({
                    "participantId": "p1",
                    "user_message": "Create a study plan for a Novice on Rust with 1 hours available per day"
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let day = &body["response"]["studyPlan"]["Week 1"][0];
        assert_eq!(day["topic"], "Closures");
        assert_eq!(
            day["resources"]["YouTube"][0]["link"],
            "https://youtu.be/livelivelv1"
        );
    }

    #[tokio::test]
    async fn test_response_chat_text() {
        let app = app(&["A closure captures its environment."]);
        let (status, body) = send(
            &app,
            post(
                "/response",
                json!({"participantId": "p2", "user_message": "What is a closure?"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "A closure captures its environment.");
    }

    #[tokio::test]
    async fn test_critique_without_draft_is_not_found() {
        let app = app(&[]);
        let (status, body) = send(
            &app,
            post("/response/critique", json!({"participantId": "nobody"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("nobody"));
    }

    #[tokio::test]
    async fn test_model_failure_is_internal_error() {
        let app = app(&[]);
        let (status, body) = send(
            &app,
            post(
                "/response",
                json!({"participantId": "p3", "user_message": "Create a study plan for a Novice on Go"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.get("error").is_some());
    }

    #[tokio::test]
    async fn test_check_resource() {
        let app = app(&[]);
        let (status, body) = send(
            &app,
            post(
                "/check-resource",
                json!({"url": "https://www.youtube.com/watch?v=livelivelv1"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"video_id": "livelivelv1", "live": true}));

        let (_, body) = send(
            &app,
            post("/check-resource", json!({"url": "https://youtu.be/deaddeaddea"})),
        )
        .await;
        assert_eq!(body["live"], false);

        let (status, _) = send(
            &app,
            post("/check-resource", json!({"url": "https://example.com/video"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_search_similar() {
        let app = app(&[]);
        let (status, body) = send(
            &app,
            post("/search-similar", json!({"search_message": "closures in rust"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "exists": true,
                "title": "Closures in Rust",
                "link": "https://www.youtube.com/watch?v=livelivelv2"
            })
        );

        let (_, body) = send(
            &app,
            post("/search-similar", json!({"search_message": "nothing at all"})),
        )
        .await;
        assert_eq!(body, json!({"exists": false}));
    }

    #[tokio::test]
    async fn test_search_lists_videos() {
        let app = app(&[]);
        let (status, body) = send(
            &app,
            post("/search", json!({"search_message": "closures in 2 hours"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"response": [{
                "title": "Closures in Rust",
                "link": "https://www.youtube.com/watch?v=livelivelv2"
            }]})
        );

        let (_, body) = send(&app, post("/search", json!({"search_message": "nothing"}))).await;
        assert_eq!(body, json!({"response": []}));
    }

    #[tokio::test]
    async fn test_video_stats_falls_back_to_similar_video() {
        let app = app(&[]);
        let (status, body) = send(
            &app,
            post("/video-stats", json!({"video_id": "https://youtu.be/livelivelv1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["video_id"], "livelivelv1");
        assert_eq!(body["fallback"], true);
        assert_eq!(body["views"], Value::Null);
        assert_eq!(body["similar"]["title"], "Closures in Rust");

        let (status, _) = send(&app, post("/video-stats", json!({"video_id": ""}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_info() {
        let app = app(&["<table><tr><td>Novice</td></tr></table>"]);
        let (status, _) = send(&app, post("/info", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, post("/info", json!({"info_message": "Rust"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["response"].as_str().unwrap().starts_with("<table>"));
    }

    #[tokio::test]
    async fn test_guidance_routes() {
        let app = app(&[
            PLAN,
            "1. Add a project",
            PLAN,
            "```json\n{\"Week 1\": \"- Connection: builds on basics\"}\n```",
            "Closures let callbacks capture state.",
            "1. Explain closure capture",
        ]);
        send(
            &app,
            post(
                "/response",
                json!({
                    "participantId": "p4",
                    "user_message": "Create a study plan for a Novice on Rust with 1 hours available per day"
                }),
            ),
        )
        .await;

        let (status, body) = send(&app, post("/plan-reasoning", json!({"participantId": "p4"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["weeks"]["Week 1"], "- Connection: builds on basics");
        assert!(body["response"].as_str().unwrap().contains("```json"));

        let topic = json!({"participantId": "p4", "user_message": "Closures"});
        let (status, body) = send(&app, post("/topic-explanations", topic.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"explanation": "Closures let callbacks capture state."}));

        let (status, body) = send(&app, post("/generate-objectives", topic)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"objectives": "1. Explain closure capture"}));
    }

    #[tokio::test]
    async fn test_guidance_without_plan_is_not_found() {
        let app = app(&[]);
        let (status, _) = send(&app, post("/plan-reasoning", json!({"participantId": "ghost"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            post(
                "/generate-objectives",
                json!({"participantId": "ghost", "user_message": "Closures"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
