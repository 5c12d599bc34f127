use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use quill_core::errors::{ErrorKind, QuillError};
use quill_core::{bail_quill, Filter, Page, QuillService, ServiceCapabilities, Sort};
use serde_json::{json, Value};
use tracing::info;

use crate::services::{BlogParams, BlogState, TAGS};
use crate::utils::{new_id, now_ts};

use super::tags_schema::TagInput;
use super::tags_shared;

pub struct TagsService {
    state: Arc<BlogState>,
}

impl TagsService {
    pub fn new(state: Arc<BlogState>) -> Self {
        Self { state }
    }

    async fn load(&self, id: &str) -> Result<Value> {
        match self.state.store.get(TAGS, id).await? {
            Some(tag) => Ok(tag),
            None => bail_quill!(not_found, "Tag not found"),
        }
    }

    /// Id of the tag currently holding `name`, if any.
    async fn holder_of(&self, name: &str) -> Result<Option<String>> {
        let query = quill_core::FindQuery::new(Filter::equals("name", name));
        let found = self.state.store.find(TAGS, &query).await?;
        Ok(found
            .first()
            .and_then(|t| t.get("id"))
            .and_then(|v| v.as_str())
            .map(str::to_string))
    }
}

/// The store may still reject a name that raced past the lookup.
fn conflict_as(err: anyhow::Error, message: &str) -> anyhow::Error {
    match QuillError::from_anyhow(&err).map(|e| e.kind) {
        Some(ErrorKind::Conflict) => QuillError::conflict(message).with_source(err).into_anyhow(),
        _ => err,
    }
}

#[async_trait]
impl QuillService<Value, BlogParams> for TagsService {
    fn capabilities(&self) -> ServiceCapabilities {
        tags_shared::crud_capabilities()
    }

    fn entity_name(&self) -> &'static str {
        "Tag"
    }

    async fn find(&self, params: BlogParams) -> Result<Page<Value>> {
        let req = self.state.page_request(&params);
        let sort = Sort::parse(params.query_value("sort"), tags_shared::SORTABLE, Sort::asc("createdAt"))?;
        self.state.find_page(TAGS, Filter::All, sort, &req).await
    }

    async fn get(&self, id: &str, _params: BlogParams) -> Result<Value> {
        self.load(id).await
    }

    async fn create(&self, data: Value, _params: BlogParams) -> Result<Value> {
        let input = TagInput::from_body(&data)?;

        if self.holder_of(&input.name).await?.is_some() {
            bail_quill!(conflict, "Tag already exists");
        }

        let ts = now_ts();
        let tag = json!({
            "id": new_id("tag"),
            "name": input.name,
            "createdAt": ts,
            "updatedAt": ts,
        });

        let tag = self
            .state
            .store
            .insert(TAGS, tag)
            .await
            .map_err(|e| conflict_as(e, "Tag already exists"))?;
        info!(id = tag["id"].as_str().unwrap_or_default(), "created tag");
        Ok(tag)
    }

    async fn update(&self, id: &str, data: Value, _params: BlogParams) -> Result<Value> {
        let mut tag = self.load(id).await?;
        let input = TagInput::from_body(&data)?;

        if let Some(holder) = self.holder_of(&input.name).await? {
            if holder != id {
                bail_quill!(conflict, "Tag name already exists");
            }
        }

        if let Some(obj) = tag.as_object_mut() {
            obj.insert("name".to_string(), json!(input.name));
            obj.insert("updatedAt".to_string(), json!(now_ts()));
        }

        let replaced = self
            .state
            .store
            .replace(TAGS, id, tag)
            .await
            .map_err(|e| conflict_as(e, "Tag name already exists"))?;
        match replaced {
            Some(tag) => Ok(tag),
            None => bail_quill!(not_found, "Tag not found"),
        }
    }

    async fn remove(&self, id: &str, _params: BlogParams) -> Result<Value> {
        match self.state.store.delete(TAGS, id).await? {
            Some(tag) => {
                info!(%id, "deleted tag");
                Ok(tag)
            }
            None => bail_quill!(not_found, "Tag not found"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::adapters::MemoryStore;
    use quill_blob::{AttachmentManager, BlobConfig, MemoryBlobStore};
    use quill_core::PaginateConfig;
    use std::collections::HashMap;

    fn service() -> TagsService {
        let state = BlogState {
            store: Arc::new(MemoryStore::new().with_unique(TAGS, "name")),
            attachments: AttachmentManager::new(Arc::new(MemoryBlobStore::new()), BlobConfig::default()),
            paginate: PaginateConfig::default(),
        };
        TagsService::new(Arc::new(state))
    }

    fn params(pairs: &[(&str, &str)]) -> BlogParams {
        BlogParams {
            query: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
            ..Default::default()
        }
    }

    fn kind(err: &anyhow::Error) -> ErrorKind {
        QuillError::from_anyhow(err).unwrap().kind
    }

    #[tokio::test]
    async fn create_normalises_and_rejects_case_duplicates() {
        let svc = service();
        let tag = svc.create(json!({"name": " Technology "}), params(&[])).await.unwrap();
        assert_eq!(tag["name"], "technology");
        assert!(tag["id"].as_str().unwrap().starts_with("tag:"));

        let err = svc.create(json!({"name": "TECHNOLOGY"}), params(&[])).await.unwrap_err();
        assert_eq!(kind(&err), ErrorKind::Conflict);
        assert_eq!(QuillError::from_anyhow(&err).unwrap().message, "Tag already exists");
    }

    #[tokio::test]
    async fn update_checks_existence_then_uniqueness() {
        let svc = service();
        let a = svc.create(json!({"name": "a"}), params(&[])).await.unwrap();
        svc.create(json!({"name": "b"}), params(&[])).await.unwrap();
        let a_id = a["id"].as_str().unwrap();

        let err = svc.update("tag:missing", json!({"name": "b"}), params(&[])).await.unwrap_err();
        assert_eq!(kind(&err), ErrorKind::NotFound);

        let err = svc.update(a_id, json!({"name": "B"}), params(&[])).await.unwrap_err();
        assert_eq!(kind(&err), ErrorKind::Conflict);
        assert_eq!(QuillError::from_anyhow(&err).unwrap().message, "Tag name already exists");

        // keeping your own name is fine
        let same = svc.update(a_id, json!({"name": "A"}), params(&[])).await.unwrap();
        assert_eq!(same["name"], "a");
        assert_eq!(same["createdAt"], a["createdAt"]);

        let err = svc.update(a_id, json!({}), params(&[])).await.unwrap_err();
        assert_eq!(kind(&err), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn find_pages_in_creation_order_by_default() {
        let svc = service();
        for name in ["c", "a", "b"] {
            svc.create(json!({"name": name}), params(&[])).await.unwrap();
        }

        let page = svc.find(params(&[("limit", "2")])).await.unwrap();
        let names: Vec<&str> = page.data.iter().filter_map(|t| t["name"].as_str()).collect();
        assert_eq!(names, vec!["c", "a"]);
        let p = page.pagination.unwrap();
        assert_eq!((p.total, p.pages), (3, 2));

        let page = svc.find(params(&[("sort", "-name")])).await.unwrap();
        assert_eq!(page.data[0]["name"], "c");
        assert_eq!(page.data[2]["name"], "a");

        let err = svc.find(params(&[("sort", "secret")])).await.unwrap_err();
        assert_eq!(kind(&err), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn get_and_remove_missing_are_not_found() {
        let svc = service();
        assert_eq!(kind(&svc.get("nope", params(&[])).await.unwrap_err()), ErrorKind::NotFound);
        assert_eq!(kind(&svc.remove("nope", params(&[])).await.unwrap_err()), ErrorKind::NotFound);

        let tag = svc.create(json!({"name": "x"}), params(&[])).await.unwrap();
        let id = tag["id"].as_str().unwrap();
        svc.remove(id, params(&[])).await.unwrap();
        assert_eq!(kind(&svc.get(id, params(&[])).await.unwrap_err()), ErrorKind::NotFound);
    }
}
