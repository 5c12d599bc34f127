//! # Document stores
//!
//! Services persist JSON documents through the `DocumentStore` trait. Each
//! document carries its identifier in a top-level `"id"` string field;
//! collections are addressed by name.
//!
//! Implementations decide how to evaluate a [`FindQuery`]: an in-memory
//! store can use [`Filter::matches`](crate::query::Filter::matches) and
//! [`Sort::compare`](crate::query::Sort::compare), a database-backed store
//! translates the predicate tree into its own query language.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::query::{Filter, FindQuery};

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a new document. Fails with a conflict when a uniqueness
    /// constraint the store enforces is violated.
    async fn insert(&self, collection: &str, doc: Value) -> Result<Value>;

    /// Documents matching `query.filter`, sorted and windowed.
    async fn find(&self, collection: &str, query: &FindQuery) -> Result<Vec<Value>>;

    /// Number of documents matching `filter`, ignoring any window.
    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>>;

    /// Replaces the document stored under `id`; `None` when absent.
    async fn replace(&self, collection: &str, id: &str, doc: Value) -> Result<Option<Value>>;

    /// Deletes and returns the document stored under `id`; `None` when absent.
    async fn delete(&self, collection: &str, id: &str) -> Result<Option<Value>>;
}
