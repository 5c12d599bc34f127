//! quill-core: framework-agnostic core for the Quill blog service.

pub mod app;
pub mod config;
pub mod errors;
pub mod pagination;
pub mod query;
pub mod registry;
pub mod service;
pub mod store;

pub use app::QuillApp;
pub use config::{QuillConfig, QuillConfigSnapshot};
pub use errors::{ErrorKind, QuillError, QuillResult};
pub use pagination::{Page, PageRequest, PaginateConfig, Pagination};
pub use query::{Filter, FindQuery, Sort, SortOrder};
pub use registry::QuillServiceRegistry;
pub use service::{QuillService, ServiceCapabilities, ServiceMethodKind};
pub use store::DocumentStore;
