//! Session-aware chat handler
//!
//! Receives GraphQL resolver events carrying a chat message, runs one turn
//! against a cached per-session agent and returns a JSON reply. Conversation
//! history is persisted in an object store so it survives cold starts.

pub mod core;
pub mod config;
pub mod logging;

// Collaborators
pub mod llm;
pub mod storage;
pub mod session;
pub mod agent;
pub mod cache;

// Entry point
pub mod handler;

pub use crate::config::HandlerConfig;
pub use crate::core::{HandlerError, HandlerResult};
pub use crate::handler::{ChatHandler, HandlerResponse, InvocationContext};
