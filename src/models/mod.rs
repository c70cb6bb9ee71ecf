pub mod config;
pub mod conversation;
pub mod plan;
pub mod request;

pub use config::{
    AppConfig, CredentialStrategyKind, LoggingConfig, ModelConfig, RepairSettings, ServerConfig,
    StoreConfig, YoutubeConfig,
};
pub use conversation::{ConversationTurn, Role, StageMarker, TurnContent};
pub use plan::{DayEntry, ResourceSlot, StudyPlanDocument, VideoResource, VIDEO_CATEGORY};
pub use request::{Proficiency, RequestParameters, StudyDuration};
