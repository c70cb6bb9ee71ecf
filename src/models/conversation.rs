//! Conversation turns persisted per participant
//!
//! Every turn is tagged with the pipeline stage that produced it, so stepwise
//! callers can find "the latest draft" or "the latest critique" by marker
//! instead of by position in the history.

use super::plan::StudyPlanDocument;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Pipeline stage a turn belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageMarker {
    /// Initial plan request and the drafted plan
    Draft,
    /// Prose feedback on a draft
    Critique,
    /// Revised, resource-repaired plan
    Improved,
    /// Conversational message or reply
    Chat,
}

impl StageMarker {
    pub fn name(&self) -> &'static str {
        match self {
            StageMarker::Draft => "Draft",
            StageMarker::Critique => "Critique",
            StageMarker::Improved => "Improved",
            StageMarker::Chat => "Chat",
        }
    }
}

/// Turn payload: a structured plan or plain text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TurnContent {
    Plan(StudyPlanDocument),
    Text(String),
}

impl TurnContent {
    pub fn as_plan(&self) -> Option<&StudyPlanDocument> {
        match self {
            TurnContent::Plan(plan) => Some(plan),
            TurnContent::Text(_) => None,
        }
    }

    /// Text form used when feeding the turn back to a model
    pub fn to_text(&self) -> String {
        match self {
            TurnContent::Plan(plan) => plan.render_json(),
            TurnContent::Text(text) => text.clone(),
        }
    }
}

impl From<String> for TurnContent {
    fn from(text: String) -> Self {
        TurnContent::Text(text)
    }
}

impl From<&str> for TurnContent {
    fn from(text: &str) -> Self {
        TurnContent::Text(text.to_string())
    }
}

impl From<StudyPlanDocument> for TurnContent {
    fn from(plan: StudyPlanDocument) -> Self {
        TurnContent::Plan(plan)
    }
}

/// A single stored turn, immutable once appended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub stage: StageMarker,
    pub content: TurnContent,
    #[serde(default = "Utc::now")]
    pub recorded_at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(role: Role, stage: StageMarker, content: impl Into<TurnContent>) -> Self {
        Self {
            role,
            stage,
            content: content.into(),
            recorded_at: Utc::now(),
        }
    }

    pub fn user(stage: StageMarker, content: impl Into<TurnContent>) -> Self {
        Self::new(Role::User, stage, content)
    }

    pub fn assistant(stage: StageMarker, content: impl Into<TurnContent>) -> Self {
        Self::new(Role::Assistant, stage, content)
    }
}
