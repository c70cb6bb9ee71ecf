//! HTTP surface over the session service

mod error;
mod http_server;

pub use error::ApiError;
pub use http_server::{build_router, start_server, AppState};
