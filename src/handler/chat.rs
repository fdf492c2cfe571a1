//! Chat request handler
//!
//! Validates the event, resolves the session, fetches the agent from the
//! cache, runs one turn and shapes the reply. Every failure is converted into
//! a well-formed response; nothing escapes to the platform.

use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;

use crate::agent::{AgentResult, ChatAgentFactory};
use crate::cache::AgentCache;
use crate::config::{HandlerConfig, BUCKET_ENV};
use crate::core::{ErrorKind, HandlerError, HandlerResult};
use crate::llm::{AnthropicProvider, LlmProvider};
use crate::session::SessionScope;
use crate::storage::{self, ObjectStore};

use super::context::InvocationContext;
use super::event::{AppSyncEvent, ChatRequest, ResolverField};
use super::response::{utc_timestamp, ChatResponse, HandlerResponse};
use super::send_message::send_message;

/// Entry point for resolver events
pub struct ChatHandler {
    config: Arc<HandlerConfig>,
    cache: Arc<AgentCache>,
    llm: Option<Arc<dyn LlmProvider>>,
}

impl ChatHandler {
    /// Create a handler around an existing cache
    pub fn new(config: HandlerConfig, cache: Arc<AgentCache>) -> Self {
        Self {
            config: Arc::new(config),
            cache,
            llm: None,
        }
    }

    /// Wire a handler from a provider and an object store
    ///
    /// Agents are `ChatAgent`s sharing `llm` and `store`, with model calls
    /// bounded by `agent_timeout`. The same provider serves the `sendMessage`
    /// resolver.
    pub fn from_parts(
        config: HandlerConfig,
        llm: Arc<dyn LlmProvider>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        let factory = ChatAgentFactory::new(llm.clone(), store, config.system_prompt.clone())
            .with_model_timeout(config.agent_timeout);
        let cache = Arc::new(AgentCache::new(Arc::new(factory), config.cache.clone()));
        Self::new(config, cache).with_llm(llm)
    }

    /// Wire the Anthropic provider and the configured object store
    pub fn from_config(config: HandlerConfig) -> Result<Self> {
        let llm = Arc::new(AnthropicProvider::from_config(&config.provider)?);
        let store = storage::from_config(&config.storage)?;
        Ok(Self::from_parts(config, llm, store))
    }

    /// Set the provider used by the `sendMessage` resolver
    pub fn with_llm(mut self, llm: Arc<dyn LlmProvider>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Handle one event
    pub async fn handle(&self, event: Value, ctx: &InvocationContext) -> HandlerResponse {
        let span = tracing::info_span!("invocation", request_id = %ctx.request_id);

        async move {
            tracing::debug!("Received event: {}", event);

            let event = match AppSyncEvent::parse(event) {
                Ok(event) => event,
                Err(e) => return self.failure(e),
            };

            match event.field() {
                ResolverField::SendMessage => {
                    HandlerResponse::Message(send_message(self.llm.as_ref(), &event).await)
                }
                ResolverField::Chat => match self.chat(&event).await {
                    Ok(response) => HandlerResponse::Chat(response),
                    Err(e) => self.failure(e),
                },
            }
        }
        .instrument(span)
        .await
    }

    async fn chat(&self, event: &AppSyncEvent) -> HandlerResult<ChatResponse> {
        let request = ChatRequest::from_event(event)?;

        let bucket = self
            .config
            .bucket_name
            .as_deref()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| {
                HandlerError::configuration(format!("{} environment variable not set", BUCKET_ENV))
            })?;

        let scope = SessionScope::new(bucket, &self.config.session_prefix, &request.session_id);
        let agent = self
            .cache
            .get_or_create(&scope)
            .await
            .map_err(HandlerError::AgentInit)?;

        let result = agent
            .invoke(&request.message)
            .await
            .map_err(HandlerError::from_agent)?;

        tracing::info!("Agent replied for session {}", request.session_id);

        Ok(ChatResponse {
            session_id: request.session_id,
            message: request.message,
            response: response_text(&result),
            timestamp: utc_timestamp(),
        })
    }

    fn failure(&self, err: HandlerError) -> HandlerResponse {
        match err.kind() {
            ErrorKind::Validation if err.status_code() < 500 => {
                tracing::warn!("Rejected request: {}", err)
            }
            kind => tracing::error!(
                ?kind,
                retryable = err.is_retryable(),
                "Error processing request: {}",
                err
            ),
        }
        err.into()
    }
}

/// Text content of the result, or the whole result rendered when it has none
fn response_text(result: &AgentResult) -> String {
    result.content().unwrap_or_else(|| result.to_string())
}
