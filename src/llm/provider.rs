//! LLM Provider trait
//!
//! Abstracts the model interface so the agent and the stateless resolver
//! can be driven by any backend (or by a stub in tests).

use anyhow::Result;
use std::sync::Arc;

use super::types::{Message, MessageResponse, SystemPrompt};

/// Trait for LLM providers used by `ChatAgent`.
///
/// All providers work with the same message types (which follow Anthropic's
/// format). Providers that use a different wire format handle translation
/// internally.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a full conversation with an optional system prompt.
    ///
    /// This is the primary method used by the agent.
    async fn send_with_system(
        &self,
        messages: Vec<Message>,
        system: Option<SystemPrompt>,
        session_id: Option<&str>,
    ) -> Result<MessageResponse>;

    /// Send a simple message and get a text response.
    ///
    /// Used by the stateless `sendMessage` resolver.
    async fn send_message(
        &self,
        user_message: &str,
        conversation_history: &[Message],
        system_prompt: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<String> {
        let mut messages = conversation_history.to_vec();
        messages.push(Message::user(user_message));

        let system = system_prompt.map(SystemPrompt::text);
        let response = self.send_with_system(messages, system, session_id).await?;
        Ok(response.text())
    }

    /// Get the current model name.
    fn model(&self) -> String;

    /// Get the provider name (e.g., "anthropic").
    fn provider_name(&self) -> &str;

    /// Create a variant of this provider with a different model and max tokens.
    ///
    /// The variant shares the same credentials and endpoint.
    fn create_variant(&self, model: &str, max_tokens: u32) -> Arc<dyn LlmProvider>;
}
