use quill_blob::BlobError;
use quill_core::{QuillError, ServiceCapabilities, ServiceMethodKind};

pub const SEARCH: &str = "search";
pub const BY_TAG: &str = "by-tag";

pub const UPLOAD_FAILED: &str = "Failed to upload image";

pub fn crud_capabilities() -> ServiceCapabilities {
    ServiceCapabilities::from_methods(vec![
        ServiceMethodKind::Find,
        ServiceMethodKind::Create,
        ServiceMethodKind::Get,
        ServiceMethodKind::Update,
        ServiceMethodKind::Remove,
        ServiceMethodKind::Custom(SEARCH),
        ServiceMethodKind::CustomById(BY_TAG),
    ])
}

/// Rejected files are the caller's fault; anything the store refused is not.
pub fn upload_error(err: BlobError) -> anyhow::Error {
    match err {
        BlobError::Invalid { message } => QuillError::validation(message).into_anyhow(),
        err @ BlobError::AccessDenied { .. } => QuillError::access_denied(UPLOAD_FAILED)
            .with_source(err.into())
            .into_anyhow(),
        err => QuillError::upload(UPLOAD_FAILED).with_source(err.into()).into_anyhow(),
    }
}
