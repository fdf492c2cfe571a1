//! Session persistence for agents
//!
//! This module maps a conversation onto object storage. Each session is
//! addressed by a `SessionScope` (bucket, prefix, session id) and owned by
//! a `SessionManager` that loads history and appends new turns.

pub mod manager;
pub mod metadata;
pub mod scope;
pub mod storage;

pub use manager::SessionManager;
pub use metadata::SessionMetadata;
pub use scope::{default_session_id, SessionScope};
pub use storage::SessionStorage;
