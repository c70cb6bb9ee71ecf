//! Draft, critique, improve
//!
//! `RefinementPipeline` turns a plan request (or a conversational follow-up)
//! into a final answer. Each invocation owns its `RefinementContext`; nothing
//! is shared with other invocations. Stages run strictly in sequence and a
//! failed model call ends the run without retries.
//!
//! ```text
//! Drafting ──► Critiquing ──► Improving ──► Done
//!    │              ▲
//!    └─(prose)──► Done
//! ChatReplying ─(plan + revision intent)─┘
//!    └─(otherwise)──► Done
//! ```

use super::model_client::{ChatMessage, ModelClient, ModelError, SamplingParams};
use super::prompts;
use crate::models::{ConversationTurn, RepairSettings, StudyPlanDocument};
use crate::parser::{expresses_revision_intent, parse_structured_response, ParsedResponse};
use crate::repair::{RepairReport, ResourceProbe, ResourceRepairEngine};
use serde::Serialize;
use std::fmt;
use tracing::Instrument;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Drafting,
    ChatReplying,
    Critiquing,
    Improving,
    Done,
    Failed,
}

impl PipelineStage {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineStage::Drafting => "drafting",
            PipelineStage::ChatReplying => "chat_replying",
            PipelineStage::Critiquing => "critiquing",
            PipelineStage::Improving => "improving",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{stage} stage failed: {source}")]
    StageFailed {
        stage: PipelineStage,
        #[source]
        source: ModelError,
    },

    #[error("{0} stage has no draft plan to work on")]
    MissingDraft(PipelineStage),

    #[error("{0} is a terminal stage")]
    Terminal(PipelineStage),
}

impl PipelineError {
    pub fn stage(&self) -> PipelineStage {
        match self {
            PipelineError::StageFailed { stage, .. } => *stage,
            PipelineError::MissingDraft(stage) | PipelineError::Terminal(stage) => *stage,
        }
    }
}

/// What the caller asked for
#[derive(Debug, Clone)]
pub enum PipelineRequest {
    /// Fresh plan request
    Plan { request: String },
    /// Follow-up message in an existing conversation
    Chat {
        message: String,
        history: Vec<ConversationTurn>,
        /// Request text used to parameterize resource repair
        plan_request: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PipelineOutput {
    Plan(StudyPlanDocument),
    Text(String),
}

impl PipelineOutput {
    pub fn as_plan(&self) -> Option<&StudyPlanDocument> {
        match self {
            PipelineOutput::Plan(plan) => Some(plan),
            PipelineOutput::Text(_) => None,
        }
    }
}

/// Per-invocation state, discarded when the run returns
#[derive(Debug, Clone, Default)]
pub struct RefinementContext {
    pub request: String,
    /// Original plan request; Improving sends it to the model and repair
    /// extracts search parameters from it
    pub repair_request: String,
    pub history: Vec<ConversationTurn>,
    /// Verbatim conversational reply, set on the chat branch
    pub chat_reply: Option<String>,
    pub draft: Option<StudyPlanDocument>,
    pub critique: Option<String>,
    pub improved: Option<StudyPlanDocument>,
    pub repair_report: Option<RepairReport>,
}

#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub run_id: Uuid,
    pub output: PipelineOutput,
    /// Stages in the order they were entered, ending in `Done`
    pub trace: Vec<PipelineStage>,
    pub context: RefinementContext,
}

enum Step {
    Advance(PipelineStage),
    Finish(PipelineOutput),
}

pub struct RefinementPipeline<'a> {
    model: &'a dyn ModelClient,
    repair: ResourceRepairEngine<'a>,
}

impl<'a> RefinementPipeline<'a> {
    pub fn new(
        model: &'a dyn ModelClient,
        probe: &'a dyn ResourceProbe,
        repair_settings: &'a RepairSettings,
    ) -> Self {
        Self {
            model,
            repair: ResourceRepairEngine::new(probe, repair_settings),
        }
    }

    pub async fn run(&self, request: PipelineRequest) -> Result<PipelineRun, PipelineError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("pipeline", %run_id);
        self.run_inner(run_id, request).instrument(span).await
    }

    async fn run_inner(
        &self,
        run_id: Uuid,
        request: PipelineRequest,
    ) -> Result<PipelineRun, PipelineError> {
        let (mut stage, mut context) = match request {
            PipelineRequest::Plan { request } => (
                PipelineStage::Drafting,
                RefinementContext {
                    repair_request: request.clone(),
                    request,
                    ..RefinementContext::default()
                },
            ),
            PipelineRequest::Chat {
                message,
                history,
                plan_request,
            } => (
                PipelineStage::ChatReplying,
                RefinementContext {
                    repair_request: plan_request.unwrap_or_else(|| message.clone()),
                    request: message,
                    history,
                    ..RefinementContext::default()
                },
            ),
        };

        let mut trace = Vec::new();
        let output = loop {
            trace.push(stage);
            tracing::debug!(stage = %stage, "entering stage");
            match self.step(stage, &mut context).await {
                Ok(Step::Advance(next)) => stage = next,
                Ok(Step::Finish(output)) => break output,
                Err(e) => {
                    tracing::error!(stage = %stage, error = %e, "pipeline failed");
                    return Err(e);
                }
            }
        };
        trace.push(PipelineStage::Done);

        tracing::info!(
            stages = trace.len(),
            structured = output.as_plan().is_some(),
            "pipeline finished"
        );

        Ok(PipelineRun {
            run_id,
            output,
            trace,
            context,
        })
    }

    async fn step(
        &self,
        stage: PipelineStage,
        context: &mut RefinementContext,
    ) -> Result<Step, PipelineError> {
        match stage {
            PipelineStage::Drafting => match self.draft(&context.request).await? {
                ParsedResponse::Structured(parsed) => {
                    context.draft = Some(parsed.plan);
                    Ok(Step::Advance(PipelineStage::Critiquing))
                }
                ParsedResponse::NotStructured(raw) => {
                    tracing::info!("draft is not structured, returning it as text");
                    Ok(Step::Finish(PipelineOutput::Text(raw)))
                }
            },
            PipelineStage::ChatReplying => {
                let reply = self.chat_reply(&context.request, &context.history).await?;
                let revise = expresses_revision_intent(&context.request);
                match parse_structured_response(&reply) {
                    ParsedResponse::Structured(parsed) if revise => {
                        tracing::info!("chat reply carries a revised plan, refining it");
                        context.chat_reply = Some(reply);
                        context.draft = Some(parsed.plan);
                        Ok(Step::Advance(PipelineStage::Critiquing))
                    }
                    _ => {
                        context.chat_reply = Some(reply.clone());
                        Ok(Step::Finish(PipelineOutput::Text(reply)))
                    }
                }
            }
            PipelineStage::Critiquing => {
                let draft = context
                    .draft
                    .as_ref()
                    .ok_or(PipelineError::MissingDraft(stage))?;
                context.critique = Some(self.critique(draft).await?);
                Ok(Step::Advance(PipelineStage::Improving))
            }
            PipelineStage::Improving => {
                let draft = context
                    .draft
                    .as_ref()
                    .ok_or(PipelineError::MissingDraft(stage))?;
                let critique = context.critique.as_deref().unwrap_or_default();
                // On the chat branch the message is the change, not the request
                let revision = (context.request != context.repair_request)
                    .then_some(context.request.as_str());
                let (output, report) = self
                    .improve(&context.repair_request, revision, draft, critique)
                    .await?;
                if let PipelineOutput::Plan(plan) = &output {
                    context.improved = Some(plan.clone());
                }
                context.repair_report = report;
                Ok(Step::Finish(output))
            }
            PipelineStage::Done | PipelineStage::Failed => Err(PipelineError::Terminal(stage)),
        }
    }

    /// Ask the model for a first plan and parse it
    pub async fn draft(&self, request: &str) -> Result<ParsedResponse, PipelineError> {
        let messages = [
            ChatMessage::system(prompts::draft_system_prompt()),
            ChatMessage::user(request),
        ];
        let raw = self
            .call(PipelineStage::Drafting, &messages, SamplingParams::GENERATIVE)
            .await?;
        Ok(parse_structured_response(&raw))
    }

    /// Prose feedback on a draft plan
    pub async fn critique(&self, draft: &StudyPlanDocument) -> Result<String, PipelineError> {
        let messages = [
            ChatMessage::system(prompts::critique_system_prompt()),
            ChatMessage::user(prompts::critique_user_prompt(draft)),
        ];
        self.call(
            PipelineStage::Critiquing,
            &messages,
            SamplingParams::DETERMINISTIC,
        )
        .await
    }

    /// Revise a draft with its critique, then repair the resources of the result
    ///
    /// `request` is the original plan request; it also supplies the search
    /// parameters for repair. `revision` is a follow-up asking for a change.
    /// Returns the raw text unchanged when the revision does not parse.
    pub async fn improve(
        &self,
        request: &str,
        revision: Option<&str>,
        draft: &StudyPlanDocument,
        critique: &str,
    ) -> Result<(PipelineOutput, Option<RepairReport>), PipelineError> {
        let messages = [
            ChatMessage::system(prompts::improve_system_prompt()),
            ChatMessage::user(prompts::improve_user_prompt(request, revision, draft, critique)),
        ];
        let raw = self
            .call(
                PipelineStage::Improving,
                &messages,
                SamplingParams::DETERMINISTIC,
            )
            .await?;

        match parse_structured_response(&raw) {
            ParsedResponse::Structured(parsed) => {
                let (plan, report) = self
                    .repair
                    .repair_with_report(request, parsed.plan)
                    .await;
                Ok((PipelineOutput::Plan(plan), Some(report)))
            }
            ParsedResponse::NotStructured(raw) => {
                tracing::info!("improved plan is not structured, skipping resource repair");
                Ok((PipelineOutput::Text(raw), None))
            }
        }
    }

    /// Reply to a follow-up using the prior conversation as context
    pub async fn chat_reply(
        &self,
        message: &str,
        history: &[ConversationTurn],
    ) -> Result<String, PipelineError> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(prompts::chat_system_prompt()));
        messages.extend(history.iter().map(ChatMessage::from));
        messages.push(ChatMessage::user(message));

        self.call(
            PipelineStage::ChatReplying,
            &messages,
            SamplingParams::GENERATIVE,
        )
        .await
    }

    async fn call(
        &self,
        stage: PipelineStage,
        messages: &[ChatMessage],
        sampling: SamplingParams,
    ) -> Result<String, PipelineError> {
        self.model
            .complete(messages, sampling)
            .await
            .map_err(|source| PipelineError::StageFailed { stage, source })
    }
}
