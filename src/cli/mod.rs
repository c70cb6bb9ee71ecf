pub mod chat;
pub mod common;
pub mod guide;
pub mod history;
pub mod plan;
pub mod repair;
pub mod resource;
pub mod server;
pub mod stage;
