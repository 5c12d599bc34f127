pub mod validator;

use chrono::{SecondsFormat, Utc};

/// RFC 3339 UTC timestamp with millisecond precision; sorts lexically.
pub fn now_ts() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// New identifier of the form `<prefix>:<uuid>`.
pub fn new_id(prefix: &str) -> String {
    format!("{prefix}:{}", uuid::Uuid::new_v4())
}
