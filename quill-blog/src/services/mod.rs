use std::sync::Arc;

use quill_core::QuillService;
use serde_json::Value;

pub mod adapters;
pub mod posts;
pub mod tags;
pub mod types;

pub use types::{BlogParams, BlogState, POSTS, TAGS};

pub struct BlogServices {
    pub tags: Arc<dyn QuillService<Value, BlogParams>>,
    pub posts: Arc<dyn QuillService<Value, BlogParams>>,
}

pub fn configure(state: Arc<BlogState>) -> BlogServices {
    BlogServices {
        tags: Arc::new(tags::TagsService::new(Arc::clone(&state))),
        posts: Arc::new(posts::PostsService::new(state)),
    }
}
