use std::sync::Arc;

use anyhow::Result;
use quill_blob::AttachmentManager;
use quill_core::{DocumentStore, Filter, FindQuery, Page, PageRequest, PaginateConfig, Pagination, Sort};
use serde_json::Value;

pub type BlogParams = quill_axum::params::RestParams;

pub const TAGS: &str = "tags";
pub const POSTS: &str = "posts";

/// Shared collaborators handed to every service.
pub struct BlogState {
    pub store: Arc<dyn DocumentStore>,
    pub attachments: AttachmentManager,
    pub paginate: PaginateConfig,
}

impl BlogState {
    pub fn page_request(&self, params: &BlogParams) -> PageRequest {
        PageRequest::from_query(&params.query, &self.paginate)
    }

    /// One window of `collection` plus the descriptor for the full match set.
    pub async fn find_page(
        &self,
        collection: &str,
        filter: Filter,
        sort: Sort,
        req: &PageRequest,
    ) -> Result<Page<Value>> {
        let total = self.store.count(collection, &filter).await?;
        let query = FindQuery::new(filter).sort(sort).page(req);
        let data = self.store.find(collection, &query).await?;
        Ok(Page::new(data, Pagination::new(req, total)))
    }
}
