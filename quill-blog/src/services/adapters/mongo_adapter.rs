use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, to_bson, Bson, Document};
use mongodb::error::{Error as MongoError, ErrorKind as MongoErrorKind, WriteFailure};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};
use quill_core::errors::QuillError;
use quill_core::query::{Filter, FindQuery, Sort, SortOrder};
use quill_core::DocumentStore;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::services::TAGS;

const DUPLICATE_KEY: i32 = 11000;

/// MongoDB-backed document store. Documents keep their `id` in `_id`.
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .context("failed to connect to MongoDB")?;
        let db = client.database(database);
        info!(%database, "connected to MongoDB");
        Ok(Self { db })
    }

    /// Unique index on tag names; lowercase normalisation happens before writes.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "name": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection(TAGS)
            .create_index(index)
            .await
            .context("failed to create unique index on tags.name")?;
        Ok(())
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection::<Document>(name)
    }
}

fn field_name(field: &str) -> &str {
    if field == "id" {
        "_id"
    } else {
        field
    }
}

/// Translates a predicate tree into a MongoDB query document.
pub fn filter_to_document(filter: &Filter) -> Result<Document> {
    Ok(match filter {
        Filter::All => doc! {},
        Filter::And(clauses) => {
            let parts = clauses
                .iter()
                .map(|c| filter_to_document(c).map(Bson::Document))
                .collect::<Result<Vec<_>>>()?;
            doc! { "$and": parts }
        }
        Filter::Or(clauses) if clauses.is_empty() => {
            let none: Vec<Bson> = vec![];
            doc! { "_id": { "$in": none } }
        }
        Filter::Or(clauses) => {
            let parts = clauses
                .iter()
                .map(|c| filter_to_document(c).map(Bson::Document))
                .collect::<Result<Vec<_>>>()?;
            doc! { "$or": parts }
        }
        Filter::Contains { field, needle } => {
            doc! { field_name(field): { "$regex": regex::escape(needle), "$options": "i" } }
        }
        Filter::Eq { field, value } => {
            doc! { field_name(field): to_bson(value)? }
        }
        Filter::In { field, values } => {
            let values = values.iter().map(to_bson).collect::<Result<Vec<_>, _>>()?;
            doc! { field_name(field): { "$in": values } }
        }
    })
}

fn sort_to_document(sort: &Sort) -> Document {
    let dir = match sort.order {
        SortOrder::Asc => 1,
        SortOrder::Desc => -1,
    };
    doc! { field_name(&sort.field): dir }
}

fn to_stored(doc: Value) -> Result<Document> {
    let Value::Object(mut obj) = doc else {
        return Err(anyhow!("documents must be JSON objects"));
    };
    if let Some(id) = obj.remove("id") {
        obj.insert("_id".to_string(), id);
    }
    Ok(mongodb::bson::to_document(&Value::Object(obj))?)
}

fn from_stored(doc: Document) -> Value {
    let mut out = Map::new();
    for (key, value) in doc {
        let key = if key == "_id" { "id".to_string() } else { key };
        out.insert(key, value.into_relaxed_extjson());
    }
    Value::Object(out)
}

fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        MongoErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        MongoErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

fn map_write_error(err: MongoError) -> anyhow::Error {
    if is_duplicate_key(&err) {
        QuillError::conflict("Duplicate key").with_source(err.into()).into_anyhow()
    } else {
        anyhow::Error::new(err)
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn insert(&self, collection: &str, doc: Value) -> Result<Value> {
        let stored = to_stored(doc.clone())?;
        self.collection(collection)
            .insert_one(stored)
            .await
            .map_err(map_write_error)?;
        Ok(doc)
    }

    async fn find(&self, collection: &str, query: &FindQuery) -> Result<Vec<Value>> {
        let filter = filter_to_document(&query.filter)?;
        debug!(%collection, ?filter, "mongo find");

        let mut action = self.collection(collection).find(filter).skip(query.skip);
        if let Some(sort) = &query.sort {
            action = action.sort(sort_to_document(sort));
        }
        if let Some(limit) = query.limit {
            action = action.limit(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let docs: Vec<Document> = action.await?.try_collect().await?;
        Ok(docs.into_iter().map(from_stored).collect())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let filter = filter_to_document(filter)?;
        Ok(self.collection(collection).count_documents(filter).await?)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let found = self.collection(collection).find_one(doc! { "_id": id }).await?;
        Ok(found.map(from_stored))
    }

    async fn replace(&self, collection: &str, id: &str, doc: Value) -> Result<Option<Value>> {
        let stored = to_stored(doc)?;
        let replaced = self
            .collection(collection)
            .find_one_and_replace(doc! { "_id": id }, stored)
            .return_document(ReturnDocument::After)
            .await
            .map_err(map_write_error)?;
        Ok(replaced.map(from_stored))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let removed = self
            .collection(collection)
            .find_one_and_delete(doc! { "_id": id })
            .await?;
        Ok(removed.map(from_stored))
    }
}
