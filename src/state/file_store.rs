//! FileConversationStore - one YAML log per participant

use super::store::{tail, ConversationStore, StoreError};
use crate::models::ConversationTurn;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// On-disk layout of a participant's log
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConversationLog {
    participant_id: String,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    turns: Vec<ConversationTurn>,
}

pub struct FileConversationStore {
    dir: PathBuf,
    // Serializes read-modify-write per participant
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl FileConversationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Participant ids are hashed so arbitrary strings map to safe file names
    pub fn log_path(&self, participant: &str) -> PathBuf {
        let digest = Sha256::digest(participant.as_bytes());
        let name: String = digest.iter().take(16).map(|b| format!("{:02x}", b)).collect();
        self.dir.join(format!("{}.yaml", name))
    }

    async fn lock_for(&self, participant: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(participant.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn load(&self, participant: &str) -> Result<ConversationLog, StoreError> {
        let path = self.log_path(participant);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ConversationLog {
                    participant_id: participant.to_string(),
                    updated_at: None,
                    turns: Vec::new(),
                });
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        serde_yaml::from_str(&content).map_err(|source| StoreError::Deserialize { path, source })
    }

    async fn save(&self, log: &ConversationLog) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StoreError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let path = self.log_path(&log.participant_id);
        let content = serde_yaml::to_string(log).map_err(StoreError::Serialize)?;

        // Write then rename so a crash never leaves a truncated log
        let tmp = path.with_extension("yaml.tmp");
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|source| StoreError::Io {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|source| StoreError::Io { path, source })
    }
}

#[async_trait]
impl ConversationStore for FileConversationStore {
    async fn append(
        &self,
        participant: &str,
        turns: Vec<ConversationTurn>,
    ) -> Result<(), StoreError> {
        let lock = self.lock_for(participant).await;
        let _guard = lock.lock().await;

        let mut log = self.load(participant).await?;
        log.turns.extend(turns);
        log.updated_at = Some(Utc::now());
        self.save(&log).await?;

        tracing::debug!(participant, turns = log.turns.len(), "conversation log saved");
        Ok(())
    }

    async fn recent(
        &self,
        participant: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, StoreError> {
        let log = self.load(participant).await?;
        Ok(tail(&log.turns, limit))
    }
}
