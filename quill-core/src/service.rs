use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::pagination::Page;

/// Standard service methods: find, get, create, update, remove.
///
/// Collection-level extras are declared via `Custom("name")`
/// (mounted as `GET /name`) and `CustomById("name")`
/// (mounted as `GET /name/{id}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ServiceMethodKind {
    Find,
    Get,
    Create,
    Update,
    Remove,
    Custom(&'static str),
    CustomById(&'static str),
}

/// Capabilities describe which methods a service wants to expose
/// to the outside world.
///
/// Transports (like quill-axum) use this to mount only allowed routes.
#[derive(Debug, Clone)]
pub struct ServiceCapabilities {
    pub allowed_methods: Vec<ServiceMethodKind>,
}

impl ServiceCapabilities {
    /// find, get, create, update, remove
    pub fn standard_crud() -> Self {
        use ServiceMethodKind::*;
        Self {
            allowed_methods: vec![Find, Get, Create, Update, Remove],
        }
    }

    pub fn from_methods(methods: Vec<ServiceMethodKind>) -> Self {
        Self {
            allowed_methods: methods,
        }
    }

    pub fn allows(&self, method: &ServiceMethodKind) -> bool {
        self.allowed_methods.contains(method)
    }
}

/// Core Quill service trait:
///
/// - `find`   → list/query many (paginated)
/// - `get`    → fetch one by id
/// - `create` → create one
/// - `update` → change one by id (services decide full vs partial)
/// - `remove` → delete one by id
/// - `custom` → named collection queries
///
/// All methods have default implementations that return
/// "Method not implemented", so a service overrides only
/// what it actually supports.
#[async_trait]
pub trait QuillService<R, P = ()>: Send + Sync
where
    R: Send + 'static,
    P: Send + 'static,
{
    /// Describe which methods this service wants to expose.
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::standard_crud()
    }

    /// Human-readable entity name used in messages ("Post", "Tag").
    fn entity_name(&self) -> &'static str {
        "Record"
    }

    async fn find(&self, _params: P) -> Result<Page<R>> {
        Err(anyhow!("Method not implemented: find"))
    }

    async fn get(&self, _id: &str, _params: P) -> Result<R> {
        Err(anyhow!("Method not implemented: get"))
    }

    async fn create(&self, _data: R, _params: P) -> Result<R> {
        Err(anyhow!("Method not implemented: create"))
    }

    async fn update(&self, _id: &str, _data: R, _params: P) -> Result<R> {
        Err(anyhow!("Method not implemented: update"))
    }

    async fn remove(&self, _id: &str, _params: P) -> Result<R> {
        Err(anyhow!("Method not implemented: remove"))
    }

    async fn custom(&self, method: &str, _id: Option<&str>, _params: P) -> Result<Page<R>> {
        Err(anyhow!("Method not implemented: {method}"))
    }
}
