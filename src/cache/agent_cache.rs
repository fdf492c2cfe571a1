//! Agent cache
//!
//! Maps a `SessionScope` to a live agent so invocations that share an
//! execution context reuse the agent (and its loaded history) instead of
//! rebuilding it from storage.
//!
//! - Keys include the bucket: the same session id under two buckets yields two agents.
//! - Construction is single-flight per key: concurrent first requests build one agent.
//! - Entries idle longer than the TTL are dropped; when full, the least
//!   recently used entry is evicted.
//! - An entry still being built, or whose agent is held by a caller, is never
//!   dropped. While every entry is busy the cache may exceed `max_entries`.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tokio::time::Instant;

use crate::agent::{Agent, AgentFactory};
use crate::config::CacheConfig;
use crate::session::SessionScope;

struct CacheEntry {
    cell: Arc<OnceCell<Arc<dyn Agent>>>,
    last_used: Instant,
}

impl CacheEntry {
    /// Built, and referenced by nothing but the cache
    fn is_idle(&self) -> bool {
        self.cell
            .get()
            .map_or(false, |agent| Arc::strong_count(agent) == 1)
    }
}

/// Bounded, concurrency-safe get-or-create cache of agents
pub struct AgentCache {
    factory: Arc<dyn AgentFactory>,
    config: CacheConfig,
    entries: Mutex<HashMap<SessionScope, CacheEntry>>,
}

impl AgentCache {
    /// Create a cache that builds agents with `factory`
    pub fn new(factory: Arc<dyn AgentFactory>, config: CacheConfig) -> Self {
        Self {
            factory,
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the agent for `scope`, building it on first use
    pub async fn get_or_create(&self, scope: &SessionScope) -> Result<Arc<dyn Agent>> {
        let cell = {
            let mut entries = self.entries.lock().await;
            let now = Instant::now();
            self.purge_expired(&mut entries, now);

            match entries.get_mut(scope) {
                Some(entry) => {
                    tracing::debug!("[Cache] Hit for {}", scope);
                    entry.last_used = now;
                    entry.cell.clone()
                }
                None => {
                    if self.config.max_entries > 0 {
                        while entries.len() >= self.config.max_entries {
                            if !Self::evict_lru(&mut entries) {
                                tracing::debug!("[Cache] All {} entries busy", entries.len());
                                break;
                            }
                        }
                    }
                    tracing::debug!("[Cache] Miss for {}", scope);
                    let cell = Arc::new(OnceCell::new());
                    entries.insert(
                        scope.clone(),
                        CacheEntry {
                            cell: cell.clone(),
                            last_used: now,
                        },
                    );
                    cell
                }
            }
        };

        // Built outside the map lock; waiters on the same key share this build
        let result = cell
            .get_or_try_init(|| async {
                tracing::info!("[Cache] Creating agent for {}", scope);
                self.factory.create(scope).await
            })
            .await;

        match result {
            Ok(agent) => Ok(agent.clone()),
            Err(e) => {
                tracing::warn!("[Cache] Agent construction failed for {}: {:#}", scope, e);
                let mut entries = self.entries.lock().await;
                let failed = entries
                    .get(scope)
                    .map_or(false, |entry| {
                        Arc::ptr_eq(&entry.cell, &cell) && !entry.cell.initialized()
                    });
                if failed {
                    entries.remove(scope);
                }
                Err(e)
            }
        }
    }

    /// Drop the agent for `scope`, if cached
    pub async fn invalidate(&self, scope: &SessionScope) -> bool {
        self.entries.lock().await.remove(scope).is_some()
    }

    /// Drop every cached agent
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    /// Get the number of cached entries
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    fn purge_expired(&self, entries: &mut HashMap<SessionScope, CacheEntry>, now: Instant) {
        let Some(ttl) = self.config.ttl else { return };
        entries.retain(|scope, entry| {
            let live = !entry.is_idle() || now.duration_since(entry.last_used) < ttl;
            if !live {
                tracing::info!("[Cache] Expired agent for {}", scope);
            }
            live
        });
    }

    /// Evict the least recently used idle entry. Returns false if none is idle.
    fn evict_lru(entries: &mut HashMap<SessionScope, CacheEntry>) -> bool {
        let oldest = entries
            .iter()
            .filter(|(_, entry)| entry.is_idle())
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(scope, _)| scope.clone());

        match oldest {
            Some(scope) => {
                tracing::info!("[Cache] Evicting least recently used agent for {}", scope);
                entries.remove(&scope);
                true
            }
            None => false,
        }
    }
}
