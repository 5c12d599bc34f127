//! Blog posts and tags API: tag registry, post repository with filtered
//! listings, and image attachments kept in object storage.

pub mod app;
pub mod config;
pub mod services;
pub mod utils;

use std::sync::Arc;

use anyhow::Result;
use quill_axum::AxumApp;
use quill_blob::AttachmentManager;
use quill_core::{DocumentStore, PaginateConfig, QuillApp};
use serde_json::Value;

use crate::config::Settings;
use crate::services::adapters::MemoryStore;
use crate::services::{BlogParams, BlogState, TAGS};

/// Mounts `/api/tags`, `/api/posts` and `/health` over the given stores.
/// Pagination limits come from the app config (`paginate.*`).
pub fn build(
    app: QuillApp<Value, BlogParams>,
    store: Arc<dyn DocumentStore>,
    attachments: AttachmentManager,
) -> Result<AxumApp<Value, BlogParams>> {
    let paginate = PaginateConfig::from_snapshot(&app.config_snapshot());
    let max_upload = attachments.config().max_blob_bytes;

    let state = Arc::new(BlogState {
        store,
        attachments,
        paginate,
    });
    let svcs = services::configure(state);

    let ax = app::blog_app(app, max_upload)
        .use_service("/api/tags", svcs.tags)
        .use_service("/api/posts", svcs.posts)
        .service("/health", || async { "ok" });

    Ok(ax)
}

/// In-memory store with unique tag names.
pub fn memory_store() -> Arc<dyn DocumentStore> {
    Arc::new(MemoryStore::new().with_unique(TAGS, "name"))
}

/// Document store selected by the settings: MongoDB when a URI is configured
/// (and the `mongo` feature is on), the in-memory store otherwise.
pub async fn document_store(settings: &Settings) -> Result<Arc<dyn DocumentStore>> {
    match &settings.mongo {
        #[cfg(feature = "mongo")]
        Some(mongo) => {
            let store = services::adapters::MongoStore::connect(&mongo.uri, &mongo.database).await?;
            store.ensure_indexes().await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "mongo"))]
        Some(_) => {
            tracing::warn!("MONGODB_URI is set but this build lacks the `mongo` feature; using the in-memory store");
            Ok(memory_store())
        }
        None => {
            tracing::info!("using the in-memory document store");
            Ok(memory_store())
        }
    }
}
