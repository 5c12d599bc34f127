//! quill-blob: object storage for Quill post attachments.
//!
//! - [`BlobStore`]: put/delete by key, public URL rendering
//! - [`S3Store`]: AWS S3 (or S3-compatible) implementation
//! - [`MemoryBlobStore`]: in-process store for tests and local runs
//! - [`AttachmentManager`]: upload rules, deterministic keys, best-effort removal

pub mod attachments;
pub mod config;
pub mod error;
pub mod key;
pub mod memory_store;
pub mod s3_store;
pub mod store;

pub use attachments::AttachmentManager;
pub use config::BlobConfig;
pub use error::{BlobError, BlobResult};
pub use key::{sanitize_filename, BlobKeyStrategy, TimestampKeyStrategy};
pub use memory_store::MemoryBlobStore;
pub use s3_store::{S3Config, S3Store};
pub use store::{BlobStore, PutResult};
