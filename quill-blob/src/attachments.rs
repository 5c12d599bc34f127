//! # Attachments
//!
//! The `AttachmentManager` owns the upload rules for post images and the
//! policy around removing them: uploads are validated, keyed by upload time
//! and name, and reported back as public references; removals never fail
//! from the caller's point of view.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, error, info, warn};

use crate::{BlobConfig, BlobError, BlobKeyStrategy, BlobResult, BlobStore, TimestampKeyStrategy};

pub const REJECTED_TYPE_MESSAGE: &str = "Only image files are allowed!";

#[derive(Clone)]
pub struct AttachmentManager {
    store: Arc<dyn BlobStore>,
    config: BlobConfig,
    keys: Arc<dyn BlobKeyStrategy>,
}

impl AttachmentManager {
    pub fn new(store: Arc<dyn BlobStore>, config: BlobConfig) -> Self {
        Self {
            store,
            config,
            keys: Arc::new(TimestampKeyStrategy),
        }
    }

    pub fn with_key_strategy(mut self, keys: Arc<dyn BlobKeyStrategy>) -> Self {
        self.keys = keys;
        self
    }

    pub fn config(&self) -> &BlobConfig {
        &self.config
    }

    /// Checks type and size without touching the store.
    pub fn validate(&self, size: u64, filename: &str, content_type: &str) -> BlobResult<()> {
        let ext = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or_default();

        if !self.config.allows_extension(ext) || !self.config.allows_content_type(content_type) {
            return Err(BlobError::invalid(REJECTED_TYPE_MESSAGE));
        }

        if size == 0 {
            return Err(BlobError::invalid("Image file is empty"));
        }

        if size > self.config.max_blob_bytes {
            return Err(BlobError::invalid(format!(
                "Image exceeds the maximum size of {} bytes",
                self.config.max_blob_bytes
            )));
        }

        Ok(())
    }

    /// Validates and uploads an image, returning its public reference.
    #[tracing::instrument(skip(self, data), fields(size = data.len()))]
    pub async fn store(&self, data: Bytes, filename: &str, content_type: &str) -> BlobResult<String> {
        self.validate(data.len() as u64, filename, content_type)?;

        let key = self.keys.object_key(&self.config.key_prefix, filename);

        match self.store.put(&key, Some(content_type), data).await {
            Ok(put) => {
                info!(%key, size = put.size_bytes, etag = ?put.etag, "stored attachment");
                Ok(self.store.public_url(&key))
            }
            Err(err @ BlobError::AccessDenied { .. }) => {
                error!(%key, error = %err, "attachment upload denied; check bucket permissions and policy");
                Err(err)
            }
            Err(err) => {
                error!(%key, error = %err, "attachment upload failed");
                Err(err)
            }
        }
    }

    /// Best-effort removal. Absent or empty references are a no-op;
    /// failures are logged and swallowed.
    pub async fn remove(&self, reference: Option<&str>) {
        let Some(reference) = reference.map(str::trim).filter(|r| !r.is_empty()) else {
            return;
        };

        let Some(key) = self.store.key_from_reference(reference) else {
            warn!(%reference, "attachment reference is not managed by this store; skipping delete");
            return;
        };

        match self.store.delete(&key).await {
            Ok(()) => debug!(%key, "removed attachment"),
            Err(BlobError::AccessDenied { message }) => {
                error!(%key, %message, "attachment delete denied; check bucket permissions and policy");
            }
            Err(err) => warn!(%key, error = %err, "attachment delete failed"),
        }
    }
}
