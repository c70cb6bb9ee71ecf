// Studyplan - Study plan refinement pipeline
// Drafts, critiques and improves study plans, then repairs their video resources

pub mod cli;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod parser;
pub mod repair;
pub mod server;
pub mod services;
pub mod state;

pub use anyhow::{Context, Result};
pub use colored::Colorize;

// Re-export commonly used types
pub use models::{AppConfig, ConversationTurn, StageMarker, StudyPlanDocument, VideoResource};
pub use orchestrator::{PipelineOutput, RefinementPipeline};
pub use repair::{RepairReport, ResourceRepairEngine};
pub use services::SessionService;
