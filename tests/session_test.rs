//! Integration tests for the session service
//!
//! Tests verify:
//! - Plan requests persist stage-tagged Draft / Critique / Improved turns
//! - Continuations see stored history and reuse the stored plan request
//! - Stepwise critique / improve locate their inputs by stage marker
//! - Caller errors are distinguished from missing state
//! - Guidance calls read the latest improved plan and use their own sampling

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use studyplan::models::{AppConfig, Role, StageMarker, TurnContent, VideoResource};
use studyplan::orchestrator::{ChatMessage, ModelClient, ModelError, PipelineOutput, SamplingParams};
use studyplan::parser::MessageKind;
use studyplan::repair::{Liveness, ProbeError, ResourceProbe};
use studyplan::services::{SessionError, SessionService};
use studyplan::state::{ConversationStore, MemoryConversationStore};

const PLAN: &str = r#"```json
{"studyPlan_Overview": {"Week 1": "Basics"},
 "studyPlan": {"Week 1": [{"day": "Day 1", "topic": "Ownership", "Time": "1 hour",
   "resources": {"YouTube": [{"title": "Dead", "link": "https://youtu.be/deaddeaddea"}]}}]}}
```"#;

const REQUEST: &str = "Create a study plan for a Competence on Rust with 1 hours available per day";

struct ScriptedModel {
    replies: Mutex<Vec<String>>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
    samplings: Mutex<Vec<SamplingParams>>,
}

impl ScriptedModel {
    fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().rev().map(|r| r.to_string()).collect()),
            calls: Mutex::new(Vec::new()),
            samplings: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        sampling: SamplingParams,
    ) -> Result<String, ModelError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        self.samplings.lock().unwrap().push(sampling);
        self.replies
            .lock()
            .unwrap()
            .pop()
            .ok_or(ModelError::EmptyCompletion)
    }
}

/// Every id containing "dead" is dead; search always finds one fixed video
#[derive(Default)]
struct FakeProbe {
    searches: Mutex<Vec<String>>,
}

#[async_trait]
impl ResourceProbe for FakeProbe {
    async fn check_liveness(&self, video_id: &str) -> Result<Liveness, ProbeError> {
        Ok(if video_id.contains("dead") {
            Liveness::Dead
        } else {
            Liveness::Live
        })
    }

    async fn search(&self, phrase: &str) -> Result<Option<VideoResource>, ProbeError> {
        self.searches.lock().unwrap().push(phrase.to_string());
        Ok(Some(VideoResource::new(
            "Rust ownership explained",
            "https://www.youtube.com/watch?v=livelivelv1",
        )))
    }
}

struct Harness {
    model: Arc<ScriptedModel>,
    probe: Arc<FakeProbe>,
    store: Arc<MemoryConversationStore>,
    session: SessionService,
}

fn harness(replies: &[&str]) -> Harness {
    let model = Arc::new(ScriptedModel::new(replies));
    let probe = Arc::new(FakeProbe::default());
    let store = Arc::new(MemoryConversationStore::new());
    let session = SessionService::new(
        model.clone(),
        probe.clone(),
        store.clone(),
        &AppConfig::default(),
    );
    Harness {
        model,
        probe,
        store,
        session,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_plan_request_persists_stage_tagged_turns() {
        let h = harness(&[PLAN, "1. More practice", PLAN]);

        let reply = h.session.handle_message("p1", REQUEST).await.unwrap();
        assert_eq!(reply.kind, MessageKind::PlanRequest);

        let plan = reply.output().as_plan().unwrap();
        assert_eq!(
            plan.video_links("YouTube"),
            vec!["https://www.youtube.com/watch?v=livelivelv1"]
        );

        let turns = h.store.recent("p1", 10).await.unwrap();
        let tags: Vec<(Role, StageMarker)> = turns.iter().map(|t| (t.role, t.stage)).collect();
        assert_eq!(
            tags,
            vec![
                (Role::User, StageMarker::Draft),
                (Role::Assistant, StageMarker::Draft),
                (Role::Assistant, StageMarker::Critique),
                (Role::Assistant, StageMarker::Improved),
            ]
        );
        assert!(matches!(turns[3].content, TurnContent::Plan(_)));

        let searches = h.probe.searches.lock().unwrap();
        assert!(searches[0].starts_with("Ownership in Rust for a Competence in 1 hours"));
    }

    #[tokio::test]
    async fn test_continuation_uses_history_and_stored_request() {
        let h = harness(&[
            PLAN,
            "1. More practice",
            PLAN,
            PLAN,
            "Better now",
            PLAN,
        ]);
        h.session.handle_message("p1", REQUEST).await.unwrap();
        h.probe.searches.lock().unwrap().clear();

        let reply = h
            .session
            .handle_message("p1", "Can you change day 1 to include borrowing?")
            .await
            .unwrap();
        assert_eq!(reply.kind, MessageKind::Continuation);
        assert!(reply.output().as_plan().is_some());

        // Chat call carries the four stored turns between system prompt and message
        let calls = h.model.calls.lock().unwrap();
        assert_eq!(calls[3].len(), 6);

        // Repair parameters come from the original plan request, not the chat message
        let searches = h.probe.searches.lock().unwrap();
        assert!(searches[0].contains("for a Competence"));

        let turns = h.store.recent("p1", 10).await.unwrap();
        assert_eq!(turns.len(), 8);
        assert_eq!(turns[4].stage, StageMarker::Chat);
        assert_eq!(turns[5].stage, StageMarker::Draft);
    }

    #[tokio::test]
    async fn test_plain_chat_reply_is_stored_as_chat() {
        let h = harness(&["Ownership means one owner per value."]);

        let reply = h
            .session
            .handle_message("p2", "What is ownership?")
            .await
            .unwrap();
        assert_eq!(
            reply.output(),
            &PipelineOutput::Text("Ownership means one owner per value.".to_string())
        );

        let turns = h.store.recent("p2", 10).await.unwrap();
        assert_eq!(turns.len(), 2);
        assert!(turns.iter().all(|t| t.stage == StageMarker::Chat));
    }

    #[tokio::test]
    async fn test_stepwise_critique_then_improve() {
        // Draft is not refined because the critique call fails; stepwise calls pick it up
        let h = harness(&[PLAN]);
        assert!(h.session.handle_message("p3", REQUEST).await.is_err());
        assert!(h.store.recent("p3", 10).await.unwrap().is_empty());

        let h = harness(&["I need more detail", "1. Add a project", PLAN]);
        // Seed a draft directly
        h.store
            .append(
                "p3",
                vec![
                    studyplan::ConversationTurn::user(StageMarker::Draft, REQUEST),
                    studyplan::ConversationTurn::assistant(
                        StageMarker::Draft,
                        studyplan::parser::parse_structured_response(PLAN)
                            .into_plan()
                            .unwrap(),
                    ),
                ],
            )
            .await
            .unwrap();

        assert!(matches!(
            h.session.improve_latest("p3", None).await,
            Err(SessionError::NotFound(_))
        ));

        // Consume the first scripted reply with an unrelated chat turn
        h.session.handle_message("p3", "hello there").await.unwrap();

        let critique = h.session.critique_latest("p3").await.unwrap();
        assert_eq!(critique, "1. Add a project");

        let output = h.session.improve_latest("p3", None).await.unwrap();
        assert!(output.as_plan().is_some());

        let turns = h.store.recent("p3", 10).await.unwrap();
        let last = turns.last().unwrap();
        assert_eq!(last.stage, StageMarker::Improved);
    }

    #[tokio::test]
    async fn test_stepwise_without_draft_is_not_found() {
        let h = harness(&[]);
        assert!(matches!(
            h.session.critique_latest("nobody").await,
            Err(SessionError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_input_is_rejected() {
        let h = harness(&[]);
        assert!(matches!(
            h.session.handle_message("", REQUEST).await,
            Err(SessionError::InvalidInput(_))
        ));
        assert!(matches!(
            h.session.handle_message("p1", "   ").await,
            Err(SessionError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_plan_reasoning_uses_latest_improved_plan() {
        let h = harness(&[
            PLAN,
            "1. More practice",
            PLAN,
            r#"{"Week 1": "- Learning objective: Describe ownership"}"#,
        ]);
        h.session.handle_message("p1", REQUEST).await.unwrap();

        let reasoning = h.session.plan_reasoning("p1").await.unwrap();
        let weeks = reasoning.weeks.unwrap();
        assert_eq!(weeks["Week 1"], "- Learning objective: Describe ownership");

        let user = h.model.calls.lock().unwrap()[3][1].content.clone();
        assert!(user.contains("\"topic\": \"Ownership\""));
        assert!(user.contains(r#"{"Week 1":"Basics"}"#));
        // The improved plan was repaired before it was stored
        assert!(user.contains("livelivelv1"));
        assert_eq!(
            h.model.samplings.lock().unwrap()[3],
            SamplingParams::EXPLANATORY
        );

        // Guidance is not persisted
        assert_eq!(h.store.recent("p1", 100).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_plan_reasoning_without_improved_plan_is_not_found() {
        let h = harness(&["A closure captures its environment."]);
        h.session
            .handle_message("p1", "What is a closure?")
            .await
            .unwrap();
        assert!(matches!(
            h.session.plan_reasoning("p1").await,
            Err(SessionError::NotFound(_))
        ));
        assert_eq!(h.model.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_topic_explanation_without_plan_still_answers() {
        let h = harness(&["Ownership is the basis of memory safety."]);
        let explanation = h
            .session
            .topic_explanation("fresh", "Ownership")
            .await
            .unwrap();
        assert_eq!(explanation, "Ownership is the basis of memory safety.");

        let calls = h.model.calls.lock().unwrap();
        assert!(calls[0][0].content.contains("'Ownership'"));
        assert_eq!(calls[0][1].content, "No study plan available.");
    }

    #[tokio::test]
    async fn test_objectives_need_stored_history() {
        let h = harness(&[PLAN, "1. More practice", PLAN, "1. Describe ownership"]);
        assert!(matches!(
            h.session.learning_objectives("p1", "Ownership").await,
            Err(SessionError::NotFound(_))
        ));

        h.session.handle_message("p1", REQUEST).await.unwrap();
        let objectives = h
            .session
            .learning_objectives("p1", "Ownership")
            .await
            .unwrap();
        assert_eq!(objectives, "1. Describe ownership");

        assert!(matches!(
            h.session.learning_objectives("p1", " ").await,
            Err(SessionError::InvalidInput(_))
        ));

        let calls = h.model.calls.lock().unwrap();
        assert!(calls[3][0].content.contains("'Ownership'"));
        assert!(calls[3][1].content.starts_with(r#"{"Week 1":[{"day":"Day 1""#));
    }

    #[tokio::test]
    async fn test_background_info() {
        let h = harness(&["<table></table>"]);
        assert_eq!(
            h.session.background_info("Rust").await.unwrap(),
            "<table></table>"
        );
        assert_eq!(
            h.model.samplings.lock().unwrap()[0],
            SamplingParams::BACKGROUND
        );
        assert_eq!(h.model.calls.lock().unwrap()[0][1].content, "Rust");

        assert!(matches!(
            h.session.background_info("").await,
            Err(SessionError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_guidance_model_failure_surfaces() {
        let h = harness(&[]);
        assert!(matches!(
            h.session.background_info("Rust").await,
            Err(SessionError::Model(ModelError::EmptyCompletion))
        ));
    }
}
