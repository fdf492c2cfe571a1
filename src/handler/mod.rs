//! Resolver event handling
//!
//! `ChatHandler::handle` is the single entry point. It parses the GraphQL
//! resolver envelope and routes on `info.fieldName`:
//! - `chat` (default): session-backed turn through the agent cache
//! - `sendMessage`: stateless single-turn reply

pub mod chat;
pub mod context;
pub mod event;
pub mod response;
pub mod send_message;

pub use chat::ChatHandler;
pub use context::InvocationContext;
pub use event::{AppSyncEvent, ChatRequest, Identity, ResolverField, ResolverInfo, ANONYMOUS_USER};
pub use response::{utc_timestamp, ChatResponse, ErrorResponse, HandlerResponse, MessageReply};
pub use send_message::{send_message, SEND_MESSAGE_MAX_TOKENS};
