//! Result of one agent turn

use serde::Serialize;
use std::fmt;

use crate::llm::{Message, StopReason, Usage};

/// What an agent returns from `invoke`
#[derive(Debug, Clone, Serialize)]
pub struct AgentResult {
    /// The assistant message produced by the turn
    pub message: Message,

    /// Why the model stopped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<StopReason>,

    /// Token usage for the turn
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl AgentResult {
    /// A result carrying a plain text reply
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            message: Message::assistant(text),
            stop_reason: Some(StopReason::EndTurn),
            usage: None,
        }
    }

    /// Textual content of the reply, or `None` if it carries no text
    pub fn content(&self) -> Option<String> {
        self.message.text()
    }
}

/// Renders the whole result as JSON
impl fmt::Display for AgentResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
