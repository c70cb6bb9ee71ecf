//! Conversation store
//!
//! Append-only, keyed by participant. `recent` returns the newest `limit`
//! turns, oldest first.

use crate::models::ConversationTurn;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("conversation store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize conversation: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error("failed to parse conversation log {path}: {source}")]
    Deserialize {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn append(
        &self,
        participant: &str,
        turns: Vec<ConversationTurn>,
    ) -> Result<(), StoreError>;

    async fn recent(
        &self,
        participant: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, StoreError>;
}

/// Tail of `turns` with at most `limit` entries, order preserved
pub(crate) fn tail(turns: &[ConversationTurn], limit: usize) -> Vec<ConversationTurn> {
    let start = turns.len().saturating_sub(limit);
    turns[start..].to_vec()
}

/// In-process store; history is lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryConversationStore {
    logs: RwLock<HashMap<String, Vec<ConversationTurn>>>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn append(
        &self,
        participant: &str,
        turns: Vec<ConversationTurn>,
    ) -> Result<(), StoreError> {
        let mut logs = self.logs.write().await;
        logs.entry(participant.to_string()).or_default().extend(turns);
        Ok(())
    }

    async fn recent(
        &self,
        participant: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, StoreError> {
        let logs = self.logs.read().await;
        Ok(logs
            .get(participant)
            .map(|turns| tail(turns, limit))
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StageMarker;

    #[tokio::test]
    async fn test_recent_window_is_chronological() {
        let store = MemoryConversationStore::new();
        for i in 0..5 {
            store
                .append("p1", vec![ConversationTurn::user(StageMarker::Chat, format!("m{}", i))])
                .await
                .unwrap();
        }

        let recent = store.recent("p1", 3).await.unwrap();
        let texts: Vec<String> = recent.iter().map(|t| t.content.to_text()).collect();
        assert_eq!(texts, vec!["m2", "m3", "m4"]);
        assert!(store.recent("p2", 3).await.unwrap().is_empty());
    }
}
