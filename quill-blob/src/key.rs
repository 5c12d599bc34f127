use chrono::Utc;

/// Builds storage keys for new objects.
pub trait BlobKeyStrategy: Send + Sync {
    fn object_key(&self, prefix: &str, filename: &str) -> String;
}

/// `<prefix>/<upload millis>-<sanitized filename>`
#[derive(Debug, Clone, Default)]
pub struct TimestampKeyStrategy;

impl TimestampKeyStrategy {
    pub fn key_at(prefix: &str, millis: i64, filename: &str) -> String {
        let name = sanitize_filename(filename);
        let prefix = prefix.trim_matches('/');
        if prefix.is_empty() {
            format!("{millis}-{name}")
        } else {
            format!("{prefix}/{millis}-{name}")
        }
    }
}

impl BlobKeyStrategy for TimestampKeyStrategy {
    fn object_key(&self, prefix: &str, filename: &str) -> String {
        Self::key_at(prefix, Utc::now().timestamp_millis(), filename)
    }
}

/// Keeps `[A-Za-z0-9._-]`, replaces everything else with `_`.
/// Directory components are discarded first.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}
