use std::collections::HashMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use quill_core::errors::QuillError;
use quill_core::query::{Filter, FindQuery};
use quill_core::DocumentStore;
use serde_json::Value;
use tokio::sync::RwLock;

/// In-process document store. Collections keep insertion order, so ties
/// under a sort stay in the order documents were created.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
    unique: Vec<(String, String)>,
}

fn id_of(doc: &Value) -> Option<&str> {
    doc.get("id").and_then(|v| v.as_str())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes that would give two documents in `collection` the same
    /// `field` value.
    pub fn with_unique(mut self, collection: &str, field: &str) -> Self {
        self.unique.push((collection.to_string(), field.to_string()));
        self
    }

    fn check_unique(&self, collection: &str, docs: &[Value], doc: &Value) -> Result<()> {
        let id = id_of(doc);
        for (coll, field) in &self.unique {
            if coll != collection {
                continue;
            }
            let Some(value) = doc.get(field) else {
                continue;
            };
            let clash = docs
                .iter()
                .any(|other| id_of(other) != id && other.get(field) == Some(value));
            if clash {
                return Err(QuillError::conflict(format!("Duplicate value for unique field '{field}'")).into_anyhow());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, doc: Value) -> Result<Value> {
        let id = id_of(&doc)
            .ok_or_else(|| anyhow!("document inserted into '{collection}' has no string id"))?
            .to_string();

        let mut map = self.collections.write().await;
        let docs = map.entry(collection.to_string()).or_default();

        if docs.iter().any(|d| id_of(d) == Some(id.as_str())) {
            return Err(QuillError::conflict(format!("Document '{id}' already exists")).into_anyhow());
        }
        self.check_unique(collection, docs, &doc)?;

        docs.push(doc.clone());
        Ok(doc)
    }

    async fn find(&self, collection: &str, query: &FindQuery) -> Result<Vec<Value>> {
        let map = self.collections.read().await;
        let Some(docs) = map.get(collection) else {
            return Ok(vec![]);
        };

        let mut matched: Vec<Value> = docs
            .iter()
            .filter(|d| query.filter.matches(d))
            .cloned()
            .collect();

        if let Some(sort) = &query.sort {
            matched.sort_by(|a, b| sort.compare(a, b));
        }

        let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
        let take = query
            .limit
            .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        Ok(matched.into_iter().skip(skip).take(take).collect())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let map = self.collections.read().await;
        Ok(map
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).count() as u64)
            .unwrap_or(0))
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let map = self.collections.read().await;
        Ok(map
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| id_of(d) == Some(id)))
            .cloned())
    }

    async fn replace(&self, collection: &str, id: &str, doc: Value) -> Result<Option<Value>> {
        let mut map = self.collections.write().await;
        let Some(docs) = map.get_mut(collection) else {
            return Ok(None);
        };
        let Some(pos) = docs.iter().position(|d| id_of(d) == Some(id)) else {
            return Ok(None);
        };

        self.check_unique(collection, docs, &doc)?;
        docs[pos] = doc.clone();
        Ok(Some(doc))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let mut map = self.collections.write().await;
        let Some(docs) = map.get_mut(collection) else {
            return Ok(None);
        };
        Ok(docs
            .iter()
            .position(|d| id_of(d) == Some(id))
            .map(|pos| docs.remove(pos)))
    }
}
