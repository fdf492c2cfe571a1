//! Session manager
//!
//! `SessionManager` owns one session's metadata and appends turns to object
//! storage. It is the persistence half of a `ChatAgent`.

use anyhow::Result;
use std::sync::Arc;

use crate::llm::Message;
use crate::storage::ObjectStore;

use super::metadata::SessionMetadata;
use super::scope::SessionScope;
use super::storage::SessionStorage;

/// Persists a single conversation
pub struct SessionManager {
    storage: SessionStorage,
    metadata: SessionMetadata,
    next_index: usize,
}

impl SessionManager {
    /// Open a session, creating its metadata if it does not exist yet.
    ///
    /// Returns the manager and the stored history.
    pub async fn open(
        store: Arc<dyn ObjectStore>,
        scope: SessionScope,
    ) -> Result<(Self, Vec<Message>)> {
        let storage = SessionStorage::new(store, scope);

        let metadata = match storage.load_metadata().await? {
            Some(metadata) => metadata,
            None => {
                tracing::info!("[Session] Creating session {}", storage.scope());
                let metadata = SessionMetadata::new(&storage.scope().session_id);
                storage.save_metadata(&metadata).await?;
                metadata
            }
        };

        let stored = storage.load_messages().await?;
        // A write can land without the metadata update that follows it
        let next_index = stored
            .last()
            .map(|(index, _)| index + 1)
            .unwrap_or(0)
            .max(metadata.message_count);
        let messages: Vec<Message> = stored.into_iter().map(|(_, m)| m).collect();

        tracing::debug!(
            "[Session] Opened {} with {} messages",
            storage.scope(),
            messages.len()
        );

        Ok((
            Self {
                storage,
                metadata,
                next_index,
            },
            messages,
        ))
    }

    /// Get the session ID
    pub fn session_id(&self) -> &str {
        &self.metadata.session_id
    }

    /// Get the metadata
    pub fn metadata(&self) -> &SessionMetadata {
        &self.metadata
    }

    /// Record which model/provider served the latest turn
    pub fn set_model(&mut self, model: impl Into<String>, provider: impl Into<String>) {
        self.metadata.model = model.into();
        self.metadata.provider = provider.into();
    }

    /// Append messages and persist the updated metadata
    ///
    /// All or nothing: on failure the messages already written are removed
    /// and the manager is left as it was.
    pub async fn append_messages(&mut self, messages: &[Message]) -> Result<()> {
        let start = self.next_index;
        for (offset, message) in messages.iter().enumerate() {
            if let Err(e) = self.storage.write_message(start + offset, message).await {
                self.roll_back(start, offset).await;
                return Err(e);
            }
        }

        let mut metadata = self.metadata.clone();
        metadata.message_count = start + messages.len();
        metadata.touch();
        if let Err(e) = self.storage.save_metadata(&metadata).await {
            self.roll_back(start, messages.len()).await;
            return Err(e);
        }

        self.next_index = metadata.message_count;
        self.metadata = metadata;
        Ok(())
    }

    async fn roll_back(&self, start: usize, written: usize) {
        for index in start..start + written {
            if let Err(e) = self.storage.delete_message(index).await {
                tracing::warn!(
                    "[Session] Failed to roll back message {} of {}: {:#}",
                    index,
                    self.storage.scope(),
                    e
                );
            }
        }
    }

    /// Delete the session from storage
    ///
    /// Warning: This permanently deletes the session data.
    pub async fn delete(self) -> Result<()> {
        self.storage.delete_session().await
    }
}
