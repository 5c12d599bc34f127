//! Startup configuration, read once from the environment (and `.env`).

use std::env;

use anyhow::{anyhow, bail, Context, Result};
use quill_blob::config::DEFAULT_MAX_BLOB_BYTES;
use quill_blob::S3Config;
use quill_core::pagination::{DEFAULT_LIMIT, DEFAULT_MAX_LIMIT};
use quill_core::{PaginateConfig, QuillApp};
use serde_json::Value;

use crate::services::BlogParams;

pub const REQUIRED_VARS: [&str; 4] = [
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_REGION",
    "AWS_S3_BUCKET_NAME",
];

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct MongoSettings {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub http: HttpSettings,
    pub s3: S3Config,
    pub upload_max_bytes: u64,
    pub paginate: PaginateConfig,
    pub mongo: Option<MongoSettings>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from any key lookup. Blank values count as unset.
    /// Every missing required variable is reported in one error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let missing: Vec<&str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|key| get(*key).is_none())
            .collect();
        if !missing.is_empty() {
            bail!("Missing required environment variables: {}", missing.join(", "));
        }
        let required = |key: &str| get(key).ok_or_else(|| anyhow!("Missing {key}"));

        let mut s3 = S3Config::new(
            required("AWS_ACCESS_KEY_ID")?,
            required("AWS_SECRET_ACCESS_KEY")?,
            required("AWS_REGION")?,
            required("AWS_S3_BUCKET_NAME")?,
        );
        if let Some(endpoint) = get("AWS_ENDPOINT_URL") {
            s3 = s3.with_endpoint_url(endpoint);
        }
        if let Some(public_url) = get("AWS_S3_PUBLIC_URL") {
            s3 = s3.with_public_url(public_url);
        }
        if let Some(raw) = get("AWS_S3_PUBLIC_READ") {
            s3 = s3.with_public_read(parse_bool("AWS_S3_PUBLIC_READ", &raw)?);
        }

        let http = HttpSettings {
            host: get("HTTP_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parsed(&get, "HTTP_PORT")?.unwrap_or(3000),
        };

        let default_limit = parsed(&get, "PAGINATE_DEFAULT")?.unwrap_or(DEFAULT_LIMIT);
        let max_limit = parsed(&get, "PAGINATE_MAX")?.unwrap_or(DEFAULT_MAX_LIMIT);
        if default_limit == 0 || max_limit == 0 {
            bail!("PAGINATE_DEFAULT and PAGINATE_MAX must be positive");
        }

        let mongo = get("MONGODB_URI").map(|uri| MongoSettings {
            uri,
            database: get("MONGODB_DATABASE").unwrap_or_else(|| "blog".to_string()),
        });

        Ok(Self {
            http,
            s3,
            upload_max_bytes: parsed(&get, "UPLOAD_MAX_BYTES")?.unwrap_or(DEFAULT_MAX_BLOB_BYTES),
            paginate: PaginateConfig {
                default_limit: default_limit.min(max_limit),
                max_limit,
            },
            mongo,
        })
    }

    /// Publishes the app-level keys (`http.*`, `paginate.*`) into the app config.
    pub fn apply(&self, app: &QuillApp<Value, BlogParams>) {
        app.set("http.host", self.http.host.clone());
        app.set("http.port", self.http.port.to_string());
        app.set("paginate.default", self.paginate.default_limit.to_string());
        app.set("paginate.max", self.paginate.max_limit.to_string());
    }
}

fn parsed<T, G>(get: &G, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| raw.parse::<T>().with_context(|| format!("{key} has an invalid value: {raw}")))
        .transpose()
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => bail!("{key} must be true or false, got {raw}"),
    }
}
