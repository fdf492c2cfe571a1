//! Session metadata types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for a persisted conversation
///
/// Stored as `session.json` next to the message objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// Session ID
    pub session_id: String,

    /// Number of messages written so far; also the next message index
    #[serde(default)]
    pub message_count: usize,

    /// Model used for the most recent turn
    #[serde(default)]
    pub model: String,

    /// Provider (e.g., "anthropic")
    #[serde(default)]
    pub provider: String,

    /// When the session was created
    pub created_at: DateTime<Utc>,

    /// When the session was last updated
    pub updated_at: DateTime<Utc>,
}

impl SessionMetadata {
    /// Create metadata for a new, empty session
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            message_count: 0,
            model: String::new(),
            provider: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the updated_at timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_metadata() {
        let meta = SessionMetadata::new("s1");
        assert_eq!(meta.session_id, "s1");
        assert_eq!(meta.message_count, 0);
        assert!(meta.model.is_empty());
        assert_eq!(meta.created_at, meta.updated_at);
    }

    #[test]
    fn test_touch_advances_updated_at() {
        let mut meta = SessionMetadata::new("s1");
        let created = meta.created_at;
        std::thread::sleep(std::time::Duration::from_millis(5));
        meta.touch();
        assert!(meta.updated_at > created);
        assert_eq!(meta.created_at, created);
    }

    #[test]
    fn test_tolerates_missing_optional_fields() {
        let json = r#"{"session_id":"s1","created_at":"2026-01-01T00:00:00Z","updated_at":"2026-01-01T00:00:00Z"}"#;
        let meta: SessionMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.message_count, 0);
        assert!(meta.model.is_empty());
    }
}
