/// Upload rules applied before anything reaches a store.
#[derive(Debug, Clone)]
pub struct BlobConfig {
    /// Absolute max size allowed for a single blob
    pub max_blob_bytes: u64,

    /// Lowercase file extensions accepted, without the dot
    pub allowed_extensions: Vec<String>,

    /// Lowercase MIME types accepted
    pub allowed_content_types: Vec<String>,

    /// Key namespace, e.g. `posts`
    pub key_prefix: String,
}

pub const DEFAULT_MAX_BLOB_BYTES: u64 = 5 * 1024 * 1024; // 5MB

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            max_blob_bytes: DEFAULT_MAX_BLOB_BYTES,
            allowed_extensions: ["jpeg", "jpg", "png", "gif", "webp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            allowed_content_types: [
                "image/jpeg",
                "image/jpg",
                "image/png",
                "image/gif",
                "image/webp",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            key_prefix: "posts".to_string(),
        }
    }
}

impl BlobConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_blob_bytes(mut self, bytes: u64) -> Self {
        self.max_blob_bytes = bytes;
        self
    }

    pub fn allows_extension(&self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        self.allowed_extensions.iter().any(|e| *e == ext)
    }

    /// Parameters (`; charset=...`) are ignored.
    pub fn allows_content_type(&self, content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        self.allowed_content_types.iter().any(|c| *c == essence)
    }
}
