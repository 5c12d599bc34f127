use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use quill_core::{bail_quill, Page, QuillService, ServiceCapabilities};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use crate::services::tags::tags_shared;
use crate::services::{BlogParams, BlogState, POSTS, TAGS};
use crate::utils::{new_id, now_ts};

use super::post_params::{self, PostParams};
use super::posts_schema::{FileUpload, PostPayload};
use super::posts_shared;

pub struct PostsService {
    state: Arc<BlogState>,
}

impl PostsService {
    pub fn new(state: Arc<BlogState>) -> Self {
        Self { state }
    }

    async fn load(&self, id: &str) -> Result<Value> {
        match self.state.store.get(POSTS, id).await? {
            Some(post) => Ok(post),
            None => bail_quill!(not_found, "Post not found"),
        }
    }

    async fn expand_one(&self, post: Value) -> Result<Value> {
        let mut out = tags_shared::expand(self.state.store.as_ref(), vec![post]).await?;
        Ok(out.pop().unwrap_or(Value::Null))
    }

    async fn expand_page(&self, page: Page<Value>) -> Result<Page<Value>> {
        let data = tags_shared::expand(self.state.store.as_ref(), page.data).await?;
        Ok(Page {
            data,
            pagination: page.pagination,
        })
    }

    async fn resolve_tags(&self, payload: &PostPayload) -> Result<Option<Vec<String>>> {
        match payload.tag_names() {
            Some(names) => Ok(Some(tags_shared::resolve_names(self.state.store.as_ref(), &names).await?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, image), fields(filename = image.filename()))]
    async fn upload(&self, image: &FileUpload) -> Result<String> {
        let data = image.bytes()?;
        self.state
            .attachments
            .store(data, image.filename(), image.content_type())
            .await
            .map_err(posts_shared::upload_error)
    }

    async fn search(&self, params: BlogParams) -> Result<Page<Value>> {
        let Some(q) = params.query_text("q") else {
            bail_quill!(validation, "Search query is required");
        };
        let req = self.state.page_request(&params);
        let page = self
            .state
            .find_page(POSTS, post_params::search_filter(q), post_params::newest_first(), &req)
            .await?;
        self.expand_page(page).await
    }

    async fn by_tag(&self, tag_id: &str, params: BlogParams) -> Result<Page<Value>> {
        if self.state.store.get(TAGS, tag_id).await?.is_none() {
            bail_quill!(not_found, "Tag not found");
        }
        let req = self.state.page_request(&params);
        let page = self
            .state
            .find_page(POSTS, post_params::by_tag_filter(tag_id), post_params::newest_first(), &req)
            .await?;
        self.expand_page(page).await
    }
}

#[async_trait]
impl QuillService<Value, BlogParams> for PostsService {
    fn capabilities(&self) -> ServiceCapabilities {
        posts_shared::crud_capabilities()
    }

    fn entity_name(&self) -> &'static str {
        "Post"
    }

    async fn find(&self, params: BlogParams) -> Result<Page<Value>> {
        let list = PostParams::from(&params);
        let sort = list.sort()?;
        let req = self.state.page_request(&params);
        let page = self.state.find_page(POSTS, list.filter(), sort, &req).await?;
        self.expand_page(page).await
    }

    async fn get(&self, id: &str, _params: BlogParams) -> Result<Value> {
        let post = self.load(id).await?;
        self.expand_one(post).await
    }

    async fn create(&self, data: Value, _params: BlogParams) -> Result<Value> {
        let payload = PostPayload::from_body(data)?;
        let fields = payload.to_create()?;
        let tags = self.resolve_tags(&payload).await?.unwrap_or_default();

        let image = match &payload.image {
            Some(upload) => Some(self.upload(upload).await?),
            None => None,
        };

        let ts = now_ts();
        let mut post = json!({
            "id": new_id("post"),
            "title": fields.title,
            "desc": fields.desc,
            "tags": tags,
            "createdAt": ts,
            "updatedAt": ts,
        });
        if let (Some(url), Some(obj)) = (&image, post.as_object_mut()) {
            obj.insert("image".to_string(), json!(url));
        }

        let post = match self.state.store.insert(POSTS, post).await {
            Ok(post) => post,
            Err(err) => {
                self.state.attachments.remove(image.as_deref()).await;
                return Err(err);
            }
        };

        info!(id = post["id"].as_str().unwrap_or_default(), "created post");
        self.expand_one(post).await
    }

    async fn update(&self, id: &str, data: Value, _params: BlogParams) -> Result<Value> {
        let mut post = self.load(id).await?;
        let payload = PostPayload::from_body(data)?;
        let patch = payload.to_patch()?;
        let tags = self.resolve_tags(&payload).await?;

        let previous_image = post.get("image").and_then(|v| v.as_str()).map(str::to_string);
        let image = match &payload.image {
            Some(upload) => Some(self.upload(upload).await?),
            None => None,
        };

        if let Some(obj) = post.as_object_mut() {
            if let Some(title) = patch.title {
                obj.insert("title".to_string(), json!(title));
            }
            if let Some(desc) = patch.desc {
                obj.insert("desc".to_string(), json!(desc));
            }
            if let Some(tags) = tags {
                obj.insert("tags".to_string(), json!(tags));
            }
            if let Some(url) = &image {
                obj.insert("image".to_string(), json!(url));
            }
            obj.insert("updatedAt".to_string(), json!(now_ts()));
        }

        let saved = match self.state.store.replace(POSTS, id, post).await {
            Ok(Some(saved)) => saved,
            Ok(None) => {
                self.state.attachments.remove(image.as_deref()).await;
                bail_quill!(not_found, "Post not found");
            }
            Err(err) => {
                self.state.attachments.remove(image.as_deref()).await;
                return Err(err);
            }
        };

        if image.is_some() && previous_image != image {
            self.state.attachments.remove(previous_image.as_deref()).await;
        }

        self.expand_one(saved).await
    }

    async fn remove(&self, id: &str, _params: BlogParams) -> Result<Value> {
        let post = self.load(id).await?;

        let image = post.get("image").and_then(|v| v.as_str());
        self.state.attachments.remove(image).await;

        match self.state.store.delete(POSTS, id).await? {
            Some(post) => {
                info!(%id, "deleted post");
                Ok(post)
            }
            None => {
                warn!(%id, "post vanished before delete");
                bail_quill!(not_found, "Post not found")
            }
        }
    }

    async fn custom(&self, method: &str, id: Option<&str>, params: BlogParams) -> Result<Page<Value>> {
        match (method, id) {
            (posts_shared::SEARCH, _) => self.search(params).await,
            (posts_shared::BY_TAG, Some(tag_id)) => self.by_tag(tag_id, params).await,
            _ => Err(anyhow::anyhow!("Method not implemented: {method}")),
        }
    }
}
