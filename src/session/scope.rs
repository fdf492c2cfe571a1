//! Session addressing

use std::fmt;

use crate::config::DEFAULT_SESSION_PREFIX;

/// Where a session's objects live: `(bucket, prefix, session_id)`.
///
/// Also the agent cache key, so a session id reused under another bucket
/// never picks up an agent bound to the old one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionScope {
    pub bucket: String,
    pub prefix: String,
    pub session_id: String,
}

impl SessionScope {
    pub fn new(
        bucket: impl Into<String>,
        prefix: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: prefix.into().trim_matches('/').to_string(),
            session_id: session_id.into(),
        }
    }

    /// Scope under the default `agent_sessions` prefix
    pub fn with_default_prefix(bucket: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self::new(bucket, DEFAULT_SESSION_PREFIX, session_id)
    }
}

impl fmt::Display for SessionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.bucket, self.prefix, self.session_id)
    }
}

/// Derive the session id used when the caller does not supply one
pub fn default_session_id(user_id: &str) -> String {
    format!("user_{}_session", user_id)
}
