//! Agent traits

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::session::SessionScope;

use super::result::AgentResult;

/// A conversational agent bound to one session.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Run one turn with the given user message.
    async fn invoke(&self, message: &str) -> Result<AgentResult>;

    /// The session this agent persists to.
    fn session_id(&self) -> &str;
}

/// Builds agents for the cache.
#[async_trait]
pub trait AgentFactory: Send + Sync {
    /// Construct an agent whose history lives under `scope`.
    async fn create(&self, scope: &SessionScope) -> Result<Arc<dyn Agent>>;
}
