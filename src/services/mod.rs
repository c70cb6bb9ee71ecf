//! Service layer for studyplan
//!
//! Business logic shared between the HTTP server and CLI commands, so both
//! surfaces persist the same turns and report the same errors.

pub mod resource;
pub mod session;

pub use resource::{
    check_link, repair_plan, search_similar, search_videos, video_stats, LinkCheck, StatsReport,
    SEARCH_RESULTS,
};
pub use session::{PlanReasoning, SessionError, SessionReply, SessionService};
