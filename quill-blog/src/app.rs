use quill_axum::middlewares::MultipartConfig;
use quill_axum::{axum, AxumApp};
use quill_core::QuillApp;
use serde_json::Value;

use crate::services::BlogParams;

/// Room for the text fields and multipart framing around an image.
const FORM_OVERHEAD: usize = 1024 * 1024;

/// Axum app accepting JSON or multipart bodies carrying an image of up to
/// `max_upload` bytes.
pub fn blog_app(app: QuillApp<Value, BlogParams>, max_upload: u64) -> AxumApp<Value, BlogParams> {
    let form_limit = form_limit(max_upload);
    let multipart = MultipartConfig::new()
        .max_total_size(form_limit)
        .file_field("image");

    axum(app)
        .with_multipart(multipart)
        .with_body_limit(json_limit(form_limit))
}

fn form_limit(max_upload: u64) -> usize {
    usize::try_from(max_upload)
        .unwrap_or(usize::MAX)
        .saturating_add(FORM_OVERHEAD)
}

/// Any form under `form_limit` must still fit once its file is base64
/// encoded, which inflates it by a third rounded up to whole quads.
fn json_limit(form_limit: usize) -> usize {
    form_limit
        .div_ceil(3)
        .saturating_mul(4)
        .saturating_add(FORM_OVERHEAD)
}
