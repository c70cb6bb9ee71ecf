pub mod model_client;
pub mod pipeline;
pub mod prompts;

pub use model_client::{ChatMessage, ChatRole, ModelClient, ModelError, OpenAiClient, SamplingParams};
pub use pipeline::{
    PipelineError, PipelineOutput, PipelineRequest, PipelineRun, PipelineStage, RefinementContext,
    RefinementPipeline,
};
