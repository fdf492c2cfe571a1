//! Process-lifetime agent cache

pub mod agent_cache;

pub use agent_cache::AgentCache;
pub use crate::config::CacheConfig;
