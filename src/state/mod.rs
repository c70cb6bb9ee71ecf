//! Conversation persistence
//!
//! Per-participant, append-only history of stage-tagged turns:
//! - `ConversationStore` trait shared by the CLI and the server
//! - YAML file backend for durable logs
//! - In-memory backend for tests and throwaway sessions

mod file_store;
mod store;

pub use file_store::FileConversationStore;
pub use store::{ConversationStore, MemoryConversationStore, StoreError};
