//! Session-backed chat agent
//!
//! `ChatAgent` keeps the conversation in memory, sends the full history to the
//! LLM on every turn and appends each completed turn to object storage.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::core::HandlerError;
use crate::llm::{LlmProvider, Message, SystemPrompt};
use crate::session::{SessionManager, SessionScope};
use crate::storage::ObjectStore;

use super::result::AgentResult;
use super::traits::{Agent, AgentFactory};

struct Conversation {
    session: SessionManager,
    history: Vec<Message>,
}

/// Agent that persists its conversation through a `SessionManager`
pub struct ChatAgent {
    session_id: String,
    llm: Arc<dyn LlmProvider>,
    system_prompt: String,
    model_timeout: Option<Duration>,
    // Turns on one agent run one at a time
    conversation: Mutex<Conversation>,
}

impl ChatAgent {
    /// Open (or create) the session under `scope` and build an agent on it
    pub async fn create(
        llm: Arc<dyn LlmProvider>,
        store: Arc<dyn ObjectStore>,
        scope: SessionScope,
        system_prompt: impl Into<String>,
    ) -> Result<Self> {
        let session_id = scope.session_id.clone();
        let (session, history) = SessionManager::open(store, scope)
            .await
            .context("Failed to open session")?;

        Ok(Self {
            session_id,
            llm,
            system_prompt: system_prompt.into(),
            model_timeout: None,
            conversation: Mutex::new(Conversation { session, history }),
        })
    }

    /// Bound each model call. Persisting the turn is never cut short.
    pub fn with_model_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.model_timeout = timeout;
        self
    }

    /// Number of messages in the in-memory history
    pub async fn history_len(&self) -> usize {
        self.conversation.lock().await.history.len()
    }
}

#[async_trait]
impl Agent for ChatAgent {
    async fn invoke(&self, message: &str) -> Result<AgentResult> {
        let mut conversation = self.conversation.lock().await;

        let user_message = Message::user(message);
        let mut messages = conversation.history.clone();
        messages.push(user_message.clone());

        tracing::info!(
            "[Agent] Turn for session {} ({} messages)",
            self.session_id,
            messages.len()
        );

        let call = self.llm.send_with_system(
            messages,
            Some(SystemPrompt::text(&self.system_prompt)),
            Some(&self.session_id),
        );
        let response = match self.model_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| HandlerError::Timeout(limit))?,
            None => call.await,
        }
        .context("Model call failed")?;

        let stop_reason = response.stop_reason.clone();
        let usage = response.usage.clone();
        let reply = response.into_message();
        let turn = [user_message, reply.clone()];

        // In-memory history never runs ahead of storage
        conversation
            .session
            .set_model(self.llm.model(), self.llm.provider_name());
        conversation
            .session
            .append_messages(&turn)
            .await
            .context("Failed to persist conversation turn")?;
        conversation.history.extend(turn);

        Ok(AgentResult {
            message: reply,
            stop_reason,
            usage: Some(usage),
        })
    }

    fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// Builds `ChatAgent`s sharing one provider and one object store
pub struct ChatAgentFactory {
    llm: Arc<dyn LlmProvider>,
    store: Arc<dyn ObjectStore>,
    system_prompt: String,
    model_timeout: Option<Duration>,
}

impl ChatAgentFactory {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        store: Arc<dyn ObjectStore>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            llm,
            store,
            system_prompt: system_prompt.into(),
            model_timeout: None,
        }
    }

    /// Model call timeout given to every agent built
    pub fn with_model_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.model_timeout = timeout;
        self
    }
}

#[async_trait]
impl AgentFactory for ChatAgentFactory {
    async fn create(&self, scope: &SessionScope) -> Result<Arc<dyn Agent>> {
        tracing::info!("[Agent] Creating agent for {}", scope);
        let agent = ChatAgent::create(
            self.llm.clone(),
            self.store.clone(),
            scope.clone(),
            self.system_prompt.clone(),
        )
        .await?
        .with_model_timeout(self.model_timeout);
        Ok(Arc::new(agent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ContentBlock, MessageResponse, StopReason, Usage};
    use crate::storage::InMemoryObjectStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replies with the number of messages it was sent
    struct CountingLlm {
        calls: AtomicUsize,
        fail: bool,
        delay: Option<Duration>,
    }

    impl CountingLlm {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
                delay: None,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl LlmProvider for CountingLlm {
        async fn send_with_system(
            &self,
            messages: Vec<Message>,
            system: Option<SystemPrompt>,
            _session_id: Option<&str>,
        ) -> Result<MessageResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                anyhow::bail!("service unavailable");
            }
            assert!(matches!(system, Some(SystemPrompt::Text(ref s)) if s == "Be helpful."));
            Ok(MessageResponse {
                id: "msg_test".into(),
                response_type: "message".into(),
                role: "assistant".into(),
                content: vec![ContentBlock::text(format!("seen {}", messages.len()))],
                model: "stub".into(),
                stop_reason: Some(StopReason::EndTurn),
                stop_sequence: None,
                usage: Usage::default(),
            })
        }

        fn model(&self) -> String {
            "stub".into()
        }

        fn provider_name(&self) -> &str {
            "stub"
        }

        fn create_variant(&self, _model: &str, _max_tokens: u32) -> Arc<dyn LlmProvider> {
            Arc::new(CountingLlm::new())
        }
    }

    fn scope() -> SessionScope {
        SessionScope::with_default_prefix("bucket", "chat_test")
    }

    #[tokio::test]
    async fn test_turns_accumulate_history() {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemoryObjectStore::new());
        let agent = ChatAgent::create(Arc::new(CountingLlm::new()), store, scope(), "Be helpful.")
            .await
            .unwrap();

        let first = agent.invoke("Hello").await.unwrap();
        assert_eq!(first.content().as_deref(), Some("seen 1"));

        let second = agent.invoke("Again").await.unwrap();
        assert_eq!(second.content().as_deref(), Some("seen 3"));
        assert_eq!(agent.history_len().await, 4);
        assert_eq!(agent.session_id(), "chat_test");
    }

    #[tokio::test]
    async fn test_history_survives_new_agent() {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemoryObjectStore::new());
        let llm: Arc<dyn LlmProvider> = Arc::new(CountingLlm::new());

        let agent = ChatAgent::create(llm.clone(), store.clone(), scope(), "Be helpful.")
            .await
            .unwrap();
        agent.invoke("Hello").await.unwrap();
        drop(agent);

        let agent = ChatAgent::create(llm, store, scope(), "Be helpful.")
            .await
            .unwrap();
        assert_eq!(agent.history_len().await, 2);
        let result = agent.invoke("Still there?").await.unwrap();
        assert_eq!(result.content().as_deref(), Some("seen 3"));
    }

    #[tokio::test]
    async fn test_failed_turn_is_not_recorded() {
        let store = Arc::new(InMemoryObjectStore::new());
        let llm = Arc::new(CountingLlm::failing());
        let agent = ChatAgent::create(llm.clone(), store.clone(), scope(), "Be helpful.")
            .await
            .unwrap();

        let err = agent.invoke("Hello").await.unwrap_err();
        assert!(format!("{:#}", err).contains("service unavailable"));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
        assert_eq!(agent.history_len().await, 0);
        // Only the metadata object was written
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_factory_builds_bound_agents() {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemoryObjectStore::new());
        let factory = ChatAgentFactory::new(Arc::new(CountingLlm::new()), store, "Be helpful.");

        let agent = factory.create(&scope()).await.unwrap();
        assert_eq!(agent.session_id(), "chat_test");
        assert!(agent.invoke("Hi").await.is_ok());
    }

    #[tokio::test]
    async fn test_model_timeout_records_nothing() {
        let store = Arc::new(InMemoryObjectStore::new());
        let agent = ChatAgent::create(
            Arc::new(CountingLlm::slow(Duration::from_millis(200))),
            store.clone(),
            scope(),
            "Be helpful.",
        )
        .await
        .unwrap()
        .with_model_timeout(Some(Duration::from_millis(20)));

        let err = agent.invoke("Hello").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HandlerError>(),
            Some(HandlerError::Timeout(_))
        ));
        assert_eq!(agent.history_len().await, 0);
        assert_eq!(store.len().await, 1);
    }
}
