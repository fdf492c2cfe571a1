//! Object storage backends for session persistence
//!
//! - `ObjectStore` - the storage trait the session layer is written against
//! - `FsObjectStore` - local directory per bucket
//! - `HttpObjectStore` - S3-compatible REST endpoint
//! - `InMemoryObjectStore` - process memory, for tests and smoke runs

pub mod fs;
pub mod http;
pub mod memory;
pub mod object_store;

pub use fs::FsObjectStore;
pub use http::HttpObjectStore;
pub use memory::InMemoryObjectStore;
pub use object_store::ObjectStore;

use anyhow::Result;
use std::sync::Arc;

use crate::config::StorageConfig;

/// Build the configured object store
pub fn from_config(config: &StorageConfig) -> Result<Arc<dyn ObjectStore>> {
    let store: Arc<dyn ObjectStore> = match config {
        StorageConfig::Fs { root } => Arc::new(FsObjectStore::new(root)),
        StorageConfig::Http { endpoint, token } => {
            let store = HttpObjectStore::new(endpoint)?;
            match token {
                Some(token) => Arc::new(store.with_token(token)),
                None => Arc::new(store),
            }
        }
        StorageConfig::Memory => Arc::new(InMemoryObjectStore::new()),
    };
    tracing::info!("Using {} object store", store.name());
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        assert_eq!(from_config(&StorageConfig::Memory).unwrap().name(), "memory");
        assert_eq!(from_config(&StorageConfig::default()).unwrap().name(), "fs");

        let http = StorageConfig::Http {
            endpoint: "http://localhost:9000".into(),
            token: Some("t".into()),
        };
        assert_eq!(from_config(&http).unwrap().name(), "http");
    }
}
