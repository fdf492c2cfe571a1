//! Stateless `sendMessage` resolver
//!
//! One model call with no history. Failures come back as a chat message from
//! `"System"` rather than a status envelope.

use anyhow::{anyhow, Result};
use std::sync::Arc;

use crate::llm::LlmProvider;

use super::event::AppSyncEvent;
use super::response::MessageReply;

/// Token limit for single-turn replies
pub const SEND_MESSAGE_MAX_TOKENS: u32 = 1024;

/// Resolve a `sendMessage` event
pub async fn send_message(llm: Option<&Arc<dyn LlmProvider>>, event: &AppSyncEvent) -> MessageReply {
    let session_id = event.argument_text("sessionId").ok().flatten();

    match reply_text(llm, event, session_id.as_deref()).await {
        Ok(text) => MessageReply::assistant(text, session_id),
        Err(e) => {
            tracing::error!("Error calling model: {:#}", e);
            MessageReply::system(format!("Error: {:#}", e), session_id)
        }
    }
}

async fn reply_text(
    llm: Option<&Arc<dyn LlmProvider>>,
    event: &AppSyncEvent,
    session_id: Option<&str>,
) -> Result<String> {
    let content = event
        .argument_str("content")?
        .ok_or_else(|| anyhow!("Missing required field: content"))?;
    let llm = llm.ok_or_else(|| anyhow!("No model provider configured"))?;

    if let Ok(Some(sender)) = event.argument_str("sender") {
        tracing::debug!("sendMessage from {}", sender);
    }

    let single_turn = llm.create_variant(&llm.model(), SEND_MESSAGE_MAX_TOKENS);
    single_turn.send_message(content, &[], None, session_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ContentBlock, Message, MessageResponse, StopReason, SystemPrompt, Usage};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records the max_tokens of the variant that served the call
    struct RecordingLlm {
        max_tokens: u32,
        served_by: Arc<Mutex<Vec<u32>>>,
        fail: bool,
    }

    #[async_trait]
    impl LlmProvider for RecordingLlm {
        async fn send_with_system(
            &self,
            messages: Vec<Message>,
            system: Option<SystemPrompt>,
            _session_id: Option<&str>,
        ) -> Result<MessageResponse> {
            self.served_by.lock().unwrap().push(self.max_tokens);
            if self.fail {
                anyhow::bail!("throttled");
            }
            assert!(system.is_none());
            assert_eq!(messages.len(), 1);
            Ok(MessageResponse {
                id: "msg".into(),
                response_type: "message".into(),
                role: "assistant".into(),
                content: vec![ContentBlock::text("Bonjour")],
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

        fn create_variant(&self, _model: &str, max_tokens: u32) -> Arc<dyn LlmProvider> {
            Arc::new(RecordingLlm {
                max_tokens,
                served_by: self.served_by.clone(),
                fail: self.fail,
            })
        }
    }

    fn llm(fail: bool) -> (Arc<dyn LlmProvider>, Arc<Mutex<Vec<u32>>>) {
        let served_by = Arc::new(Mutex::new(Vec::new()));
        let llm: Arc<dyn LlmProvider> = Arc::new(RecordingLlm {
            max_tokens: 4096,
            served_by: served_by.clone(),
            fail,
        });
        (llm, served_by)
    }

    fn event(arguments: serde_json::Value) -> AppSyncEvent {
        AppSyncEvent::parse(json!({"arguments": arguments, "info": {"fieldName": "sendMessage"}}))
            .unwrap()
    }

    #[tokio::test]
    async fn test_reply_uses_single_turn_variant() {
        let (llm, served_by) = llm(false);
        let reply = send_message(
            Some(&llm),
            &event(json!({"content": "Hello", "sender": "me", "sessionId": "s1"})),
        )
        .await;

        assert_eq!(reply.content, "Bonjour");
        assert_eq!(reply.sender, "AI Assistant");
        assert_eq!(reply.session_id.as_deref(), Some("s1"));
        assert_eq!(*served_by.lock().unwrap(), vec![SEND_MESSAGE_MAX_TOKENS]);
    }

    #[tokio::test]
    async fn test_errors_become_system_messages() {
        let (llm, _) = llm(true);
        let reply = send_message(Some(&llm), &event(json!({"content": "Hello"}))).await;
        assert_eq!(reply.sender, "System");
        assert!(reply.content.starts_with("Error: "));
        assert!(reply.content.contains("throttled"));
        assert_eq!(reply.session_id, None);

        let reply = send_message(Some(&llm), &event(json!({"sessionId": "s1"}))).await;
        assert_eq!(reply.content, "Error: Missing required field: content");

        let reply = send_message(None, &event(json!({"content": "Hello"}))).await;
        assert_eq!(reply.content, "Error: No model provider configured");
    }
}
