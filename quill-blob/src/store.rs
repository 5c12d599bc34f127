use async_trait::async_trait;
use bytes::Bytes;

use crate::BlobResult;

/// Core blob storage operations - implemented by every storage backend
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a blob under `key`
    async fn put(&self, key: &str, content_type: Option<&str>, data: Bytes) -> BlobResult<PutResult>;

    /// Delete a blob. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> BlobResult<()>;

    /// Base URL under which stored keys are publicly reachable, with a
    /// trailing `/`.
    fn public_base(&self) -> String;

    /// Public reference for a stored key.
    fn public_url(&self, key: &str) -> String {
        format!("{}{}", self.public_base(), key.trim_start_matches('/'))
    }

    /// Recover the storage key from a reference produced by [`public_url`].
    /// A bare key (no scheme) is accepted as-is; a URL under some other base
    /// yields `None`.
    ///
    /// [`public_url`]: BlobStore::public_url
    fn key_from_reference(&self, reference: &str) -> Option<String> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }

        let base = self.public_base();
        if let Some(key) = reference.strip_prefix(base.as_str()) {
            let key = key.split(['?', '#']).next().unwrap_or_default();
            return (!key.is_empty()).then(|| key.to_string());
        }

        if reference.contains("://") {
            None
        } else {
            Some(reference.trim_start_matches('/').to_string())
        }
    }
}

/// Result of a successful put operation
#[derive(Debug, Clone)]
pub struct PutResult {
    pub etag: Option<String>,
    pub size_bytes: u64,
}
