pub mod anthropic;
pub mod provider;
pub mod types;

pub use anthropic::AnthropicProvider;
pub use provider::LlmProvider;
pub use types::{
    ContentBlock, Message, MessageContent, MessageRequest, MessageResponse, StopReason,
    SystemPrompt, Usage,
};
