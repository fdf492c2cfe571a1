//! Anthropic API client
//!
//! A direct HTTP client for the Anthropic Messages API.
//!
//! ```ignore
//! let llm = AnthropicProvider::new("sk-ant-...")
//!     .with_model("claude-haiku-4-5")
//!     .with_max_tokens(4096);
//! ```

use anyhow::{Context, Result};
use reqwest::Client;
use std::sync::Arc;

use super::provider::LlmProvider;
use super::types::{ApiErrorResponse, Message, MessageRequest, MessageResponse, SystemPrompt};
use crate::config::ProviderConfig;

const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-haiku-4-5";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Anthropic LLM provider
#[derive(Clone)]
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    api_url: String,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider with a specific API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Create a provider from handler configuration
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        tracing::info!("Creating Anthropic provider from configuration");

        let api_key = config
            .api_key
            .clone()
            .context("ANTHROPIC_API_KEY environment variable not set")?;

        let mut provider = Self::new(api_key)
            .with_model(&config.model)
            .with_max_tokens(config.max_tokens);
        if let Some(url) = &config.api_url {
            provider = provider.with_api_url(url);
        }

        tracing::info!("Using model: {}", provider.model);
        tracing::info!("Max tokens: {}", provider.max_tokens);

        Ok(provider)
    }

    /// Set the model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the max tokens for responses
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Override the Messages API URL (proxies, gateways)
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    fn build_request(&self, messages: Vec<Message>, system: Option<SystemPrompt>) -> MessageRequest {
        MessageRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages,
            system,
        }
    }

    /// Send a non-streaming request to the Messages API
    async fn send_request(
        &self,
        request: &MessageRequest,
        session_id: Option<&str>,
    ) -> Result<MessageResponse> {
        let request_json =
            serde_json::to_string(request).context("Failed to serialize Anthropic request")?;
        tracing::debug!("[Anthropic] Request JSON: {}", request_json);

        let mut request_builder = self
            .client
            .post(&self.api_url)
            .header("content-type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION);

        if let Some(sid) = session_id {
            request_builder = request_builder.header("X-Agent-Session-Id", sid);
        }

        let response = request_builder
            .body(request_json)
            .send()
            .await
            .context("Failed to send request to Anthropic API")?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .context("Failed to read Anthropic response body")?;

        tracing::debug!("[Anthropic] Response status: {}", status);
        tracing::debug!("[Anthropic] Response body: {}", response_text);

        if !status.is_success() {
            tracing::error!("[Anthropic] API error: {} - {}", status, response_text);
            anyhow::bail!(
                "Anthropic API error ({}): {}",
                status,
                describe_error(&response_text)
            );
        }

        serde_json::from_str(&response_text).context("Failed to parse Anthropic API response")
    }
}

/// Prefer the structured error message when the body carries one
fn describe_error(body: &str) -> String {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(parsed) => format!("{}: {}", parsed.error.error_type, parsed.error.message),
        Err(_) => body.to_string(),
    }
}

#[async_trait::async_trait]
impl LlmProvider for AnthropicProvider {
    async fn send_with_system(
        &self,
        messages: Vec<Message>,
        system: Option<SystemPrompt>,
        session_id: Option<&str>,
    ) -> Result<MessageResponse> {
        tracing::info!("[Anthropic] Sending message");
        tracing::debug!("[Anthropic] Messages count: {}", messages.len());

        let request = self.build_request(messages, system);
        let response = self.send_request(&request, session_id).await?;

        tracing::info!(
            "[Anthropic] Received response: {} output tokens",
            response.usage.output_tokens
        );
        Ok(response)
    }

    fn model(&self) -> String {
        self.model.clone()
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }

    fn create_variant(&self, model: &str, max_tokens: u32) -> Arc<dyn LlmProvider> {
        Arc::new(self.clone().with_model(model).with_max_tokens(max_tokens))
    }
}
