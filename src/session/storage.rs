//! Session storage helpers
//!
//! Maps a session onto object keys and handles (de)serialization:
//!
//! ```text
//! <prefix>/session_<id>/session.json
//! <prefix>/session_<id>/messages/message_<n>.json
//! ```

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::llm::Message;
use crate::storage::ObjectStore;

use super::metadata::SessionMetadata;
use super::scope::SessionScope;

const METADATA_FILE: &str = "session.json";
const MESSAGES_DIR: &str = "messages";

/// Reads and writes one session's objects
#[derive(Clone)]
pub struct SessionStorage {
    store: Arc<dyn ObjectStore>,
    scope: SessionScope,
}

impl SessionStorage {
    pub fn new(store: Arc<dyn ObjectStore>, scope: SessionScope) -> Self {
        Self { store, scope }
    }

    /// Get the scope this storage addresses
    pub fn scope(&self) -> &SessionScope {
        &self.scope
    }

    /// Key prefix shared by every object of this session
    pub fn session_prefix(&self) -> String {
        format!("{}/session_{}/", self.scope.prefix, self.scope.session_id)
    }

    /// Get the metadata key
    pub fn metadata_key(&self) -> String {
        format!("{}{}", self.session_prefix(), METADATA_FILE)
    }

    /// Key prefix of the message objects
    pub fn messages_prefix(&self) -> String {
        format!("{}{}/", self.session_prefix(), MESSAGES_DIR)
    }

    /// Get the key of the message at `index`
    pub fn message_key(&self, index: usize) -> String {
        format!("{}message_{}.json", self.messages_prefix(), index)
    }

    /// Save session metadata
    pub async fn save_metadata(&self, metadata: &SessionMetadata) -> Result<()> {
        let body = serde_json::to_vec_pretty(metadata)?;
        self.store
            .put(&self.scope.bucket, &self.metadata_key(), body)
            .await
            .with_context(|| format!("Failed to save metadata for session {}", self.scope))
    }

    /// Load session metadata, or `None` for a session that was never written
    pub async fn load_metadata(&self) -> Result<Option<SessionMetadata>> {
        let body = self
            .store
            .get(&self.scope.bucket, &self.metadata_key())
            .await
            .with_context(|| format!("Failed to load metadata for session {}", self.scope))?;

        match body {
            Some(bytes) => {
                let metadata = serde_json::from_slice(&bytes).with_context(|| {
                    format!("Corrupt metadata for session {}", self.scope)
                })?;
                Ok(Some(metadata))
            }
            None => Ok(None),
        }
    }

    /// Write the message at `index`
    pub async fn write_message(&self, index: usize, message: &Message) -> Result<()> {
        let body = serde_json::to_vec(message)?;
        self.store
            .put(&self.scope.bucket, &self.message_key(index), body)
            .await
            .with_context(|| format!("Failed to write message {} of session {}", index, self.scope))
    }

    /// Remove the message at `index`
    pub async fn delete_message(&self, index: usize) -> Result<()> {
        self.store
            .delete(&self.scope.bucket, &self.message_key(index))
            .await
            .with_context(|| format!("Failed to delete message {} of session {}", index, self.scope))
    }

    /// Load all messages ordered by index
    pub async fn load_messages(&self) -> Result<Vec<(usize, Message)>> {
        let prefix = self.messages_prefix();
        let keys = self
            .store
            .list(&self.scope.bucket, &prefix)
            .await
            .with_context(|| format!("Failed to list messages of session {}", self.scope))?;

        let mut indexed: Vec<(usize, String)> = keys
            .into_iter()
            .filter_map(|key| {
                let index = key.strip_prefix(prefix.as_str()).and_then(message_index)?;
                Some((index, key))
            })
            .collect();
        // Keys sort lexicographically; order by numeric index instead
        indexed.sort_by_key(|(index, _)| *index);

        let mut messages = Vec::with_capacity(indexed.len());
        for (index, key) in indexed {
            let Some(bytes) = self.store.get(&self.scope.bucket, &key).await? else {
                continue;
            };
            let message: Message = serde_json::from_slice(&bytes)
                .with_context(|| format!("Corrupt message object {}", key))?;
            messages.push((index, message));
        }

        Ok(messages)
    }

    /// Delete every object of this session
    pub async fn delete_session(&self) -> Result<()> {
        let keys = self
            .store
            .list(&self.scope.bucket, &self.session_prefix())
            .await?;
        for key in keys {
            self.store.delete(&self.scope.bucket, &key).await?;
        }
        Ok(())
    }
}

/// Parse `message_<n>.json`
fn message_index(name: &str) -> Option<usize> {
    name.strip_prefix("message_")?
        .strip_suffix(".json")?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryObjectStore;

    fn create_test_storage() -> SessionStorage {
        let store = Arc::new(InMemoryObjectStore::new());
        SessionStorage::new(store, SessionScope::with_default_prefix("bucket", "test_session"))
    }

    #[test]
    fn test_key_layout() {
        let storage = create_test_storage();
        assert_eq!(
            storage.metadata_key(),
            "agent_sessions/session_test_session/session.json"
        );
        assert_eq!(
            storage.message_key(3),
            "agent_sessions/session_test_session/messages/message_3.json"
        );
    }

    #[test]
    fn test_message_index() {
        assert_eq!(message_index("message_12.json"), Some(12));
        assert_eq!(message_index("message_x.json"), None);
        assert_eq!(message_index("other.json"), None);
    }

    #[tokio::test]
    async fn test_save_load_metadata() {
        let storage = create_test_storage();
        assert!(storage.load_metadata().await.unwrap().is_none());

        let mut meta = SessionMetadata::new("test_session");
        meta.provider = "anthropic".to_string();
        storage.save_metadata(&meta).await.unwrap();

        let loaded = storage.load_metadata().await.unwrap().unwrap();
        assert_eq!(loaded, meta);
    }

    #[tokio::test]
    async fn test_messages_load_in_numeric_order() {
        let storage = create_test_storage();

        for i in 0..12 {
            storage
                .write_message(i, &Message::user(format!("m{}", i)))
                .await
                .unwrap();
        }

        let messages = storage.load_messages().await.unwrap();
        assert_eq!(messages.len(), 12);
        let indexes: Vec<usize> = messages.iter().map(|(i, _)| *i).collect();
        assert_eq!(indexes, (0..12).collect::<Vec<_>>());
        assert_eq!(messages[10].1.text().as_deref(), Some("m10"));
    }

    #[tokio::test]
    async fn test_delete_session() {
        let storage = create_test_storage();
        storage
            .save_metadata(&SessionMetadata::new("test_session"))
            .await
            .unwrap();
        storage.write_message(0, &Message::user("hi")).await.unwrap();

        storage.delete_session().await.unwrap();
        assert!(storage.load_metadata().await.unwrap().is_none());
        assert!(storage.load_messages().await.unwrap().is_empty());
    }
}
