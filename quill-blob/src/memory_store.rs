use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use crate::{BlobResult, BlobStore, PutResult};

#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Keeps blobs in process memory. Used by tests and by local runs that
/// have no object store configured.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<BTreeMap<String, StoredBlob>>,
}

impl MemoryBlobStore {
    pub const PUBLIC_BASE: &'static str = "memory://blobs/";

    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently stored, in lexical order.
    pub async fn keys(&self) -> Vec<String> {
        self.blobs.read().await.keys().cloned().collect()
    }

    pub async fn blob(&self, key: &str) -> Option<StoredBlob> {
        self.blobs.read().await.get(key).cloned()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, content_type: Option<&str>, data: Bytes) -> BlobResult<PutResult> {
        let size_bytes = data.len() as u64;
        self.blobs.write().await.insert(
            key.to_string(),
            StoredBlob {
                content_type: content_type.map(str::to_string),
                data,
            },
        );
        Ok(PutResult {
            etag: None,
            size_bytes,
        })
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        self.blobs.write().await.remove(key);
        Ok(())
    }

    fn public_base(&self) -> String {
        Self::PUBLIC_BASE.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_delete() {
        let store = MemoryBlobStore::new();
        store
            .put("posts/1-a.png", Some("image/png"), Bytes::from_static(b"png"))
            .await
            .unwrap();
        assert_eq!(store.keys().await, vec!["posts/1-a.png".to_string()]);

        store.delete("posts/1-a.png").await.unwrap();
        assert!(store.keys().await.is_empty());
        store.delete("posts/1-a.png").await.unwrap();
    }

    #[test]
    fn references_round_trip_to_keys() {
        let store = MemoryBlobStore::new();
        let url = store.public_url("posts/1-a.png");
        assert_eq!(url, "memory://blobs/posts/1-a.png");
        assert_eq!(store.key_from_reference(&url).as_deref(), Some("posts/1-a.png"));
        assert_eq!(store.key_from_reference("posts/2-b.png").as_deref(), Some("posts/2-b.png"));
        assert_eq!(store.key_from_reference("https://elsewhere.example/x.png"), None);
        assert_eq!(store.key_from_reference("  "), None);
    }
}
