use std::collections::HashMap;

use anyhow::Result;
use quill_core::{DocumentStore, Filter, FindQuery, ServiceCapabilities};
use serde_json::{json, Value};

use crate::services::TAGS;

pub const SORTABLE: &[&str] = &["name", "createdAt", "updatedAt"];

pub fn crud_capabilities() -> ServiceCapabilities {
    ServiceCapabilities::standard_crud()
}

pub fn normalize_name(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Ids of the existing tags named by `names`, in the order given. Names
/// without a matching tag are dropped.
pub async fn resolve_names(store: &dyn DocumentStore, names: &[String]) -> Result<Vec<String>> {
    if names.is_empty() {
        return Ok(vec![]);
    }

    let filter = Filter::any_of("name", names.iter().map(|n| json!(n)).collect());
    let found = store.find(TAGS, &FindQuery::new(filter)).await?;

    let by_name: HashMap<&str, &str> = found
        .iter()
        .filter_map(|t| Some((t.get("name")?.as_str()?, t.get("id")?.as_str()?)))
        .collect();

    Ok(names
        .iter()
        .filter_map(|n| by_name.get(n.as_str()).map(|id| id.to_string()))
        .collect())
}

/// Replaces each post's tag id list with `[{id, name}]`. Ids that no longer
/// resolve are left out.
pub async fn expand(store: &dyn DocumentStore, posts: Vec<Value>) -> Result<Vec<Value>> {
    let mut ids: Vec<Value> = vec![];
    for post in &posts {
        for id in post.get("tags").and_then(|t| t.as_array()).into_iter().flatten() {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
    }

    let names: HashMap<String, Value> = if ids.is_empty() {
        HashMap::new()
    } else {
        store
            .find(TAGS, &FindQuery::new(Filter::any_of("id", ids)))
            .await?
            .into_iter()
            .filter_map(|t| {
                let id = t.get("id")?.as_str()?.to_string();
                Some((id, t.get("name")?.clone()))
            })
            .collect()
    };

    Ok(posts
        .into_iter()
        .map(|mut post| {
            let expanded: Vec<Value> = post
                .get("tags")
                .and_then(|t| t.as_array())
                .into_iter()
                .flatten()
                .filter_map(|id| {
                    let name = names.get(id.as_str()?)?;
                    Some(json!({"id": id, "name": name}))
                })
                .collect();
            if let Some(obj) = post.as_object_mut() {
                obj.insert("tags".to_string(), Value::Array(expanded));
            }
            post
        })
        .collect())
}
