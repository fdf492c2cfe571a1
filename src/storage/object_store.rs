//! Object store trait

use anyhow::Result;
use async_trait::async_trait;

/// Flat key/value object storage addressed by `(bucket, key)`.
///
/// Keys use `/` as a separator; `list` returns every key in the bucket that
/// starts with the given prefix, sorted lexicographically.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object, or `None` if it does not exist.
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>>;

    /// Create or overwrite an object.
    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()>;

    /// Delete an object. Deleting a missing object is not an error.
    async fn delete(&self, bucket: &str, key: &str) -> Result<()>;

    /// List keys under a prefix.
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>>;

    /// The name of this store implementation.
    fn name(&self) -> &str;
}
