use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::Engine;
use quill_core::errors::QuillError;
use serde_json::{json, Map, Value};
use tower::{Layer, Service};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Configuration for multipart to JSON conversion
#[derive(Debug, Clone)]
pub struct MultipartConfig {
    /// Maximum request body size read into memory
    pub max_total_size: usize,
    /// Maximum size of a single file field (None = unlimited)
    pub max_file_size: Option<usize>,
    /// How to encode file data in JSON
    pub file_encoding: FileEncoding,
    /// Field names to treat as files (empty = auto-detect)
    pub file_fields: HashSet<String>,
}

/// How to encode file data in the JSON output
#[derive(Clone, Debug, PartialEq)]
pub enum FileEncoding {
    /// Base64 encode file contents under `data` (default)
    Base64,
    /// Keep file info only
    Metadata,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            max_total_size: 16 * 1024 * 1024, // 16MB
            max_file_size: None,
            file_encoding: FileEncoding::Base64,
            file_fields: HashSet::new(),
        }
    }
}

impl MultipartConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_total_size(mut self, size: usize) -> Self {
        self.max_total_size = size;
        self
    }

    pub fn max_file_size(mut self, size: usize) -> Self {
        self.max_file_size = Some(size);
        self
    }

    pub fn file_encoding(mut self, encoding: FileEncoding) -> Self {
        self.file_encoding = encoding;
        self
    }

    pub fn file_field(mut self, field_name: &str) -> Self {
        self.file_fields.insert(field_name.to_string());
        self
    }

    fn is_file_field(&self, name: &str, filename: Option<&str>, content_type: Option<&str>) -> bool {
        if !self.file_fields.is_empty() {
            self.file_fields.contains(name)
        } else {
            filename.is_some() || content_type.is_some_and(|ct| !ct.starts_with("text/"))
        }
    }
}

/// Middleware that converts multipart/form-data requests to JSON
///
/// Text fields become strings (repeated names collect into an array), file
/// fields become `{filename, content_type, size, data}` objects. Method,
/// URI, extensions and the remaining headers are kept; other content types
/// pass through untouched.
#[derive(Clone, Default)]
pub struct MultipartToJson {
    config: MultipartConfig,
}

impl MultipartToJson {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MultipartConfig) -> Self {
        Self { config }
    }
}

impl<S> Layer<S> for MultipartToJson {
    type Service = MultipartToJsonService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MultipartToJsonService {
            inner,
            config: self.config.clone(),
        }
    }
}

#[derive(Clone)]
pub struct MultipartToJsonService<S> {
    inner: S,
    config: MultipartConfig,
}

impl<S> Service<Request> for MultipartToJsonService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let mut inner = self.inner.clone();
        let config = self.config.clone();

        Box::pin(async move {
            let is_multipart = req
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|ct| ct.starts_with("multipart/form-data"));

            if !is_multipart {
                return inner.call(req).await;
            }

            match convert_multipart_to_json(req, &config).await {
                Ok(json_req) => inner.call(json_req).await,
                Err(e) => {
                    tracing::debug!(error = %e, "rejecting malformed multipart body");
                    let body = QuillError::validation(format!("Failed to parse multipart data: {e}")).to_json();
                    Ok((StatusCode::BAD_REQUEST, Json(body)).into_response())
                }
            }
        })
    }
}

fn insert_field(map: &mut Map<String, Value>, name: String, value: Value) {
    match map.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            map.insert(name, value);
        }
    }
}

async fn convert_multipart_to_json(req: Request, config: &MultipartConfig) -> Result<Request, BoxError> {
    let (mut parts, body) = req.into_parts();

    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let boundary = multer::parse_boundary(content_type)?;

    let body_bytes = axum::body::to_bytes(body, config.max_total_size)
        .await
        .map_err(|e| format!("Failed to read request body: {e}"))?;

    let mut multipart = multer::Multipart::new(
        futures::stream::once(async { Ok::<bytes::Bytes, multer::Error>(body_bytes) }),
        boundary,
    );
    let mut json_map = Map::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("unknown").to_string();
        let content_type = field.content_type().map(|ct| ct.to_string());
        let filename = field.file_name().map(|f| f.to_string());

        if !config.is_file_field(&name, filename.as_deref(), content_type.as_deref()) {
            let value = field.text().await?;
            insert_field(&mut json_map, name, Value::String(value));
            continue;
        }

        let data = field.bytes().await?;

        // browsers submit an empty part for an untouched file input
        if data.is_empty() && filename.as_deref().map_or(true, str::is_empty) {
            continue;
        }

        if let Some(max_size) = config.max_file_size {
            if data.len() > max_size {
                return Err(format!("File '{name}' exceeds maximum size of {max_size} bytes").into());
            }
        }

        tracing::debug!(field = %name, size = data.len(), "converted multipart file field");

        let mut file = json!({
            "filename": filename,
            "content_type": content_type.unwrap_or_else(|| "application/octet-stream".to_string()),
            "size": data.len(),
        });
        if config.file_encoding == FileEncoding::Base64 {
            file["data"] = Value::String(base64::engine::general_purpose::STANDARD.encode(&data));
        }

        insert_field(&mut json_map, name, file);
    }

    let json_bytes = serde_json::to_vec(&Value::Object(json_map))?;

    parts
        .headers
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    parts
        .headers
        .insert(header::CONTENT_LENGTH, HeaderValue::from(json_bytes.len()));

    Ok(Request::from_parts(parts, Body::from(json_bytes)))
}
