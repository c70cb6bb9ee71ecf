//! Session service
//!
//! Glue shared by the CLI and the HTTP server: classifies an incoming message,
//! loads history, runs the refinement pipeline and persists the stage-tagged
//! turns it produced. Stepwise entry points recover their inputs from the
//! stored history by stage marker.
//!
//! Guidance calls (plan reasoning, topic explanations, learning objectives,
//! background levels) read the latest improved plan but store nothing.

use super::resource::{self, LinkCheck, StatsReport};
use crate::models::{
    AppConfig, ConversationTurn, RepairSettings, Role, StageMarker, StudyPlanDocument,
    TurnContent, VideoResource,
};
use crate::orchestrator::prompts;
use crate::orchestrator::{
    ChatMessage, ModelClient, ModelError, PipelineError, PipelineOutput, PipelineRequest,
    PipelineRun, PipelineStage, RefinementPipeline, SamplingParams,
};
use crate::parser::{classify_message, extract_json_block, MessageKind};
use crate::repair::{ProbeError, ResourceProbe};
use crate::state::{ConversationStore, StoreError};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Caller supplied an unusable request
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Probe(#[from] ProbeError),
}

/// Week-by-week reasoning behind a plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanReasoning {
    /// Reply as the model sent it
    pub raw: String,
    /// Week label -> explanation, when the reply decodes as a JSON object
    pub weeks: Option<IndexMap<String, String>>,
}

/// Result of handling one message
#[derive(Debug, Clone)]
pub struct SessionReply {
    pub kind: MessageKind,
    pub run: PipelineRun,
}

impl SessionReply {
    pub fn output(&self) -> &PipelineOutput {
        &self.run.output
    }
}

pub struct SessionService {
    model: Arc<dyn ModelClient>,
    probe: Arc<dyn ResourceProbe>,
    store: Arc<dyn ConversationStore>,
    repair: RepairSettings,
    recent_limit: usize,
}

impl SessionService {
    pub fn new(
        model: Arc<dyn ModelClient>,
        probe: Arc<dyn ResourceProbe>,
        store: Arc<dyn ConversationStore>,
        config: &AppConfig,
    ) -> Self {
        Self {
            model,
            probe,
            store,
            repair: config.repair.clone(),
            recent_limit: config.store.recent_limit,
        }
    }

    fn pipeline(&self) -> RefinementPipeline<'_> {
        RefinementPipeline::new(self.model.as_ref(), self.probe.as_ref(), &self.repair)
    }

    /// Run the full pipeline for a message and persist the result
    pub async fn handle_message(
        &self,
        participant: &str,
        message: &str,
    ) -> Result<SessionReply, SessionError> {
        let participant = require("participantId", participant)?;
        let message = require("user_message", message)?;

        let kind = classify_message(message);
        tracing::info!(participant, ?kind, "handling message");

        let request = match kind {
            MessageKind::PlanRequest => PipelineRequest::Plan {
                request: message.to_string(),
            },
            MessageKind::Continuation => {
                let history = self.store.recent(participant, self.recent_limit).await?;
                let plan_request = self.latest_plan_request(participant).await?;
                PipelineRequest::Chat {
                    message: message.to_string(),
                    history,
                    plan_request,
                }
            }
        };

        let run = self.pipeline().run(request).await?;
        self.store
            .append(participant, turns_for_run(kind, message, &run))
            .await?;

        Ok(SessionReply { kind, run })
    }

    /// Critique the participant's latest draft plan
    pub async fn critique_latest(&self, participant: &str) -> Result<String, SessionError> {
        let participant = require("participantId", participant)?;
        let history = self.full_history(participant).await?;

        let (_, draft) = latest_plan(&history, StageMarker::Draft).ok_or_else(|| {
            SessionError::NotFound(format!("no draft plan stored for {}", participant))
        })?;

        let critique = self.pipeline().critique(draft).await?;
        self.store
            .append(
                participant,
                vec![ConversationTurn::assistant(
                    StageMarker::Critique,
                    critique.clone(),
                )],
            )
            .await?;

        Ok(critique)
    }

    /// Improve the latest draft using the critique stored after it, then repair resources
    pub async fn improve_latest(
        &self,
        participant: &str,
        request: Option<&str>,
    ) -> Result<PipelineOutput, SessionError> {
        let participant = require("participantId", participant)?;
        let history = self.full_history(participant).await?;

        let (draft_idx, draft) = latest_plan(&history, StageMarker::Draft).ok_or_else(|| {
            SessionError::NotFound(format!("no draft plan stored for {}", participant))
        })?;
        let critique = history[draft_idx..]
            .iter()
            .rev()
            .find(|turn| turn.role == Role::Assistant && turn.stage == StageMarker::Critique)
            .map(|turn| turn.content.to_text())
            .ok_or_else(|| {
                SessionError::NotFound(format!(
                    "no critique stored for the latest draft of {}",
                    participant
                ))
            })?;

        let stored_request = latest_user_text(&history, StageMarker::Draft);
        let request = request
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .or(stored_request)
            .unwrap_or_default();

        let (output, _report) = self
            .pipeline()
            .improve(&request, None, draft, &critique)
            .await?;

        self.store
            .append(
                participant,
                vec![ConversationTurn::assistant(
                    StageMarker::Improved,
                    output_content(&output),
                )],
            )
            .await?;

        Ok(output)
    }

    /// Derive the video id from a link and ask the platform whether it is live
    pub async fn check_link(&self, url: &str) -> Result<LinkCheck, SessionError> {
        resource::check_link(self.probe.as_ref(), url).await
    }

    /// Single best video for a phrase
    pub async fn search_similar(
        &self,
        phrase: &str,
    ) -> Result<Option<VideoResource>, SessionError> {
        resource::search_similar(self.probe.as_ref(), phrase).await
    }

    /// Relevance-ranked videos for a free-text query
    pub async fn search_videos(&self, query: &str) -> Result<Vec<VideoResource>, SessionError> {
        resource::search_videos(self.probe.as_ref(), query).await
    }

    /// View and like counts for a video, or a similar video when there are none
    pub async fn video_stats(&self, video: &str) -> Result<StatsReport, SessionError> {
        resource::video_stats(self.probe.as_ref(), video).await
    }

    /// Explain the six background levels for the subject in `message`
    pub async fn background_info(&self, message: &str) -> Result<String, SessionError> {
        let message = require("info_message", message)?;
        let messages = [
            ChatMessage::system(prompts::background_levels_system_prompt()),
            ChatMessage::user(message),
        ];
        self.guidance("background_info", &messages, SamplingParams::BACKGROUND)
            .await
    }

    /// Explain each week of the latest improved plan
    pub async fn plan_reasoning(&self, participant: &str) -> Result<PlanReasoning, SessionError> {
        let participant = require("participantId", participant)?;
        let history = self.full_history(participant).await?;
        let (_, plan) = latest_plan(&history, StageMarker::Improved).ok_or_else(|| {
            SessionError::NotFound(format!("no improved plan stored for {}", participant))
        })?;

        let messages = [
            ChatMessage::system(prompts::plan_reasoning_system_prompt()),
            ChatMessage::user(prompts::plan_reasoning_user_prompt(plan)),
        ];
        let raw = self
            .guidance("plan_reasoning", &messages, SamplingParams::EXPLANATORY)
            .await?;
        let weeks = parse_week_reasoning(&raw);
        Ok(PlanReasoning { raw, weeks })
    }

    /// Why `topic` matters within the participant's latest improved plan
    ///
    /// Works without a plan; the model is told none is available.
    pub async fn topic_explanation(
        &self,
        participant: &str,
        topic: &str,
    ) -> Result<String, SessionError> {
        let participant = require("participantId", participant)?;
        let topic = require("user_message", topic)?;
        let history = self.full_history(participant).await?;
        let plan = latest_plan(&history, StageMarker::Improved).map(|(_, plan)| plan);

        let messages = [
            ChatMessage::system(prompts::topic_explanation_system_prompt(topic)),
            ChatMessage::user(prompts::plan_context(plan)),
        ];
        self.guidance("topic_explanation", &messages, SamplingParams::EXPLANATORY)
            .await
    }

    /// Numbered learning objectives for `topic`
    ///
    /// Requires some stored history for the participant; the plan itself may
    /// still be missing.
    pub async fn learning_objectives(
        &self,
        participant: &str,
        topic: &str,
    ) -> Result<String, SessionError> {
        let participant = require("participantId", participant)?;
        let topic = require("user_message", topic)?;
        let history = self.full_history(participant).await?;
        if history.is_empty() {
            return Err(SessionError::NotFound(format!(
                "no study plan stored for {}",
                participant
            )));
        }
        let plan = latest_plan(&history, StageMarker::Improved).map(|(_, plan)| plan);

        let messages = [
            ChatMessage::system(prompts::objectives_system_prompt(topic)),
            ChatMessage::user(prompts::plan_context(plan)),
        ];
        self.guidance("learning_objectives", &messages, SamplingParams::EXPLANATORY)
            .await
    }

    async fn guidance(
        &self,
        kind: &'static str,
        messages: &[ChatMessage],
        sampling: SamplingParams,
    ) -> Result<String, SessionError> {
        tracing::info!(kind, "requesting guidance");
        let reply = self.model.complete(messages, sampling).await.map_err(|e| {
            tracing::warn!(kind, error = %e, "guidance request failed");
            e
        })?;
        Ok(reply)
    }

    /// Newest `limit` turns for a participant
    pub async fn history(
        &self,
        participant: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ConversationTurn>, SessionError> {
        let participant = require("participantId", participant)?;
        let limit = limit.unwrap_or(self.recent_limit);
        Ok(self.store.recent(participant, limit).await?)
    }

    async fn full_history(&self, participant: &str) -> Result<Vec<ConversationTurn>, SessionError> {
        Ok(self.store.recent(participant, usize::MAX).await?)
    }

    async fn latest_plan_request(&self, participant: &str) -> Result<Option<String>, SessionError> {
        let history = self.full_history(participant).await?;
        Ok(latest_user_text(&history, StageMarker::Draft))
    }
}

pub(crate) fn require<'a>(field: &str, value: &'a str) -> Result<&'a str, SessionError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(SessionError::InvalidInput(format!("{} is required", field)));
    }
    Ok(value)
}

/// Latest assistant turn with `stage` whose content is a plan, with its index
fn latest_plan(
    history: &[ConversationTurn],
    stage: StageMarker,
) -> Option<(usize, &StudyPlanDocument)> {
    history.iter().enumerate().rev().find_map(|(idx, turn)| {
        if turn.role != Role::Assistant || turn.stage != stage {
            return None;
        }
        turn.content.as_plan().map(|plan| (idx, plan))
    })
}

/// Week explanations from a reply that is, or fences, a JSON object
fn parse_week_reasoning(raw: &str) -> Option<IndexMap<String, String>> {
    let body = extract_json_block(raw).unwrap_or_else(|| raw.trim().to_string());
    let weeks: IndexMap<String, Value> = serde_json::from_str(&body).ok()?;
    Some(
        weeks
            .into_iter()
            .map(|(week, text)| {
                let text = match text {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (week, text)
            })
            .collect(),
    )
}

fn latest_user_text(history: &[ConversationTurn], stage: StageMarker) -> Option<String> {
    history
        .iter()
        .rev()
        .find(|turn| turn.role == Role::User && turn.stage == stage)
        .map(|turn| turn.content.to_text())
}

fn output_content(output: &PipelineOutput) -> TurnContent {
    match output {
        PipelineOutput::Plan(plan) => TurnContent::Plan(plan.clone()),
        PipelineOutput::Text(text) => TurnContent::Text(text.clone()),
    }
}

/// Stage-tagged turns recording one pipeline run
fn turns_for_run(kind: MessageKind, message: &str, run: &PipelineRun) -> Vec<ConversationTurn> {
    let context = &run.context;
    let user_stage = match kind {
        MessageKind::PlanRequest => StageMarker::Draft,
        MessageKind::Continuation => StageMarker::Chat,
    };
    let mut turns = vec![ConversationTurn::user(user_stage, message)];

    let refined = run.trace.contains(&PipelineStage::Critiquing);
    if !refined {
        let stage = match kind {
            MessageKind::PlanRequest => StageMarker::Draft,
            MessageKind::Continuation => StageMarker::Chat,
        };
        turns.push(ConversationTurn::assistant(stage, output_content(&run.output)));
        return turns;
    }

    if let Some(draft) = &context.draft {
        turns.push(ConversationTurn::assistant(StageMarker::Draft, draft.clone()));
    }
    if let Some(critique) = &context.critique {
        turns.push(ConversationTurn::assistant(
            StageMarker::Critique,
            critique.clone(),
        ));
    }
    turns.push(ConversationTurn::assistant(
        StageMarker::Improved,
        output_content(&run.output),
    ));
    turns
}
