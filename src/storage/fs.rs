//! Filesystem object store
//!
//! Buckets are directories under a root; keys are relative paths inside them.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::object_store::ObjectStore;

/// Object store rooted at a local directory
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Create a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf> {
        if bucket.contains('/') {
            bail!("Invalid bucket name: {:?}", bucket);
        }
        check_segment(bucket).with_context(|| format!("Invalid bucket name: {:?}", bucket))?;
        Ok(self.root.join(bucket))
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        let mut path = self.bucket_dir(bucket)?;
        if key.is_empty() {
            bail!("Object key must not be empty");
        }
        for segment in key.split('/') {
            check_segment(segment).with_context(|| format!("Invalid object key: {:?}", key))?;
            path.push(segment);
        }
        Ok(path)
    }
}

/// Reject segments that would escape the bucket directory
fn check_segment(segment: &str) -> Result<()> {
    if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
        bail!("illegal path segment {:?}", segment);
    }
    Ok(())
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        // Write-then-rename so readers never observe a partial object
        let tmp = path.with_extension("partial");
        tokio::fs::write(&tmp, &body)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("Failed to move object into {}", path.display()))?;
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete {}", path.display())),
        }
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let bucket_dir = self.bucket_dir(bucket)?;
        let mut keys = Vec::new();
        let mut pending = vec![(bucket_dir, String::new())];

        while let Some((dir, key_prefix)) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to list {}", dir.display()))
                }
            };

            while let Some(entry) = entries.next_entry().await? {
                let name = match entry.file_name().into_string() {
                    Ok(name) => name,
                    Err(_) => continue,
                };
                let key = format!("{}{}", key_prefix, name);

                if entry.file_type().await?.is_dir() {
                    // Only descend where the prefix can still match
                    let dir_key = format!("{}/", key);
                    if dir_key.starts_with(prefix) || prefix.starts_with(&dir_key) {
                        pending.push((entry.path(), dir_key));
                    }
                } else if key.starts_with(prefix) && !key.ends_with(".partial") {
                    keys.push(key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn name(&self) -> &str {
        "fs"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (FsObjectStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(temp_dir.path());
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_put_get() {
        let (store, _temp) = create_test_store();

        store
            .put("bucket", "agent_sessions/session_a/session.json", b"{}".to_vec())
            .await
            .unwrap();

        let body = store
            .get("bucket", "agent_sessions/session_a/session.json")
            .await
            .unwrap();
        assert_eq!(body, Some(b"{}".to_vec()));
        assert!(store.get("bucket", "missing").await.unwrap().is_none());
        assert!(store.get("other", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_nested() {
        let (store, _temp) = create_test_store();

        for key in ["p/s1/m/1.json", "p/s1/m/0.json", "p/s1/meta.json", "p/s2/meta.json"] {
            store.put("b", key, vec![]).await.unwrap();
        }

        let keys = store.list("b", "p/s1/").await.unwrap();
        assert_eq!(keys, vec!["p/s1/m/0.json", "p/s1/m/1.json", "p/s1/meta.json"]);

        assert_eq!(store.list("b", "").await.unwrap().len(), 4);
        assert!(store.list("nobucket", "").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let (store, _temp) = create_test_store();

        store.put("b", "k/v", b"x".to_vec()).await.unwrap();
        store.delete("b", "k/v").await.unwrap();
        store.delete("b", "k/v").await.unwrap();
        assert!(store.get("b", "k/v").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let (store, _temp) = create_test_store();

        assert!(store.put("b", "../escape", vec![]).await.is_err());
        assert!(store.put("b", "/abs", vec![]).await.is_err());
        assert!(store.put("b", "a//b", vec![]).await.is_err());
        assert!(store.put("..", "k", vec![]).await.is_err());
        assert!(store.put("a/b", "k", vec![]).await.is_err());
    }
}
