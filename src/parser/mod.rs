pub mod intent;
pub mod request_params;
pub mod schema;
pub mod structured;
pub mod video_link;

pub use intent::{classify_message, expresses_revision_intent, MessageKind};
pub use request_params::extract_request_parameters;
pub use schema::{audit_plan, SchemaIssue};
pub use structured::{extract_json_block, parse_structured_response, ParsedResponse, StructuredPlan};
pub use video_link::{extract_video_id, watch_url, VideoId};
