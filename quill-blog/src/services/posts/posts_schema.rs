use base64::Engine;
use bytes::Bytes;
use quill_core::QuillError;
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::services::tags::tags_shared::normalize_name;
use crate::utils::validator::{non_empty, validate};

use super::post_params::split_csv;

pub const FIELDS_REQUIRED: &str = "Title and description are required";

/// `tags` as submitted: a comma-separated string (form posts) or a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TagList {
    Csv(String),
    List(Vec<String>),
}

impl TagList {
    /// Normalised, de-duplicated names. A blank string counts as not supplied.
    pub fn names(&self) -> Option<Vec<String>> {
        let raw: Vec<String> = match self {
            TagList::Csv(s) if s.trim().is_empty() => return None,
            TagList::Csv(s) => split_csv(s),
            TagList::List(items) => items.iter().flat_map(|s| split_csv(s)).collect(),
        };

        let mut out: Vec<String> = Vec::with_capacity(raw.len());
        for name in raw.iter().map(|n| normalize_name(n)) {
            if !out.contains(&name) {
                out.push(name);
            }
        }
        Some(out)
    }
}

/// File field produced by the multipart layer.
#[derive(Debug, Clone, Deserialize)]
pub struct FileUpload {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    pub data: Option<String>,
}

impl FileUpload {
    pub fn filename(&self) -> &str {
        self.filename.as_deref().unwrap_or_default()
    }

    pub fn content_type(&self) -> &str {
        self.content_type.as_deref().unwrap_or("application/octet-stream")
    }

    pub fn bytes(&self) -> Result<Bytes, QuillError> {
        let data = self
            .data
            .as_deref()
            .ok_or_else(|| QuillError::validation("Image data is missing"))?;
        base64::engine::general_purpose::STANDARD
            .decode(data)
            .map(Bytes::from)
            .map_err(|e| {
                QuillError::validation("Image data is not valid base64")
                    .with_errors(json!({"image": [e.to_string()]}))
            })
    }
}

/// Body of a create or update request.
#[derive(Debug, Default, Deserialize)]
pub struct PostPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub tags: Option<TagList>,
    #[serde(default)]
    pub image: Option<FileUpload>,
}

#[derive(Debug, Validate)]
pub struct CreatePost {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 5000, message = "Description must be between 1 and 5000 characters"))]
    pub desc: String,
}

#[derive(Debug, Default, Validate)]
pub struct PatchPost {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 5000, message = "Description must be between 1 and 5000 characters"))]
    pub desc: Option<String>,
}

impl PostPayload {
    pub fn from_body(data: Value) -> Result<Self, QuillError> {
        serde_json::from_value(data).map_err(|e| {
            QuillError::validation("Invalid post payload").with_errors(json!({"_schema": [e.to_string()]}))
        })
    }

    pub fn tag_names(&self) -> Option<Vec<String>> {
        self.tags.as_ref().and_then(TagList::names)
    }

    /// Trimmed title and description; both must be present.
    pub fn to_create(&self) -> Result<CreatePost, QuillError> {
        let title = non_empty(self.title.as_deref());
        let desc = non_empty(self.desc.as_deref());

        let (Some(title), Some(desc)) = (title, desc) else {
            let mut errors = serde_json::Map::new();
            if non_empty(self.title.as_deref()).is_none() {
                errors.insert("title".to_string(), json!(["Title is required"]));
            }
            if non_empty(self.desc.as_deref()).is_none() {
                errors.insert("desc".to_string(), json!(["Description is required"]));
            }
            return Err(QuillError::validation(FIELDS_REQUIRED).with_errors(Value::Object(errors)));
        };

        let create = CreatePost { title, desc };
        validate(&create, FIELDS_REQUIRED)?;
        Ok(create)
    }

    /// Supplied, non-blank title and description.
    pub fn to_patch(&self) -> Result<PatchPost, QuillError> {
        let patch = PatchPost {
            title: non_empty(self.title.as_deref()),
            desc: non_empty(self.desc.as_deref()),
        };
        validate(&patch, "Invalid post payload")?;
        Ok(patch)
    }
}
