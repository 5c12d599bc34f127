use std::fmt;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use bytes::Bytes;

use crate::error::classify_store_error;
use crate::{BlobResult, BlobStore, PutResult};

/// Connection settings for an S3 (or S3-compatible) bucket.
#[derive(Clone)]
pub struct S3Config {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub bucket: String,
    /// Custom endpoint for S3-compatible services; enables path-style addressing.
    pub endpoint_url: Option<String>,
    /// Overrides the derived public base URL.
    pub public_url: Option<String>,
    /// Upload objects with the `public-read` canned ACL.
    pub public_read: bool,
}

impl fmt::Debug for S3Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Config")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("endpoint_url", &self.endpoint_url)
            .field("public_url", &self.public_url)
            .field("public_read", &self.public_read)
            .finish()
    }
}

impl S3Config {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
            bucket: bucket.into(),
            endpoint_url: None,
            public_url: None,
            public_read: true,
        }
    }

    pub fn with_endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    pub fn with_public_url(mut self, url: impl Into<String>) -> Self {
        self.public_url = Some(url.into());
        self
    }

    pub fn with_public_read(mut self, public_read: bool) -> Self {
        self.public_read = public_read;
        self
    }

    /// Public base URL with a trailing `/`:
    /// the override if set, `<endpoint>/<bucket>/` for custom endpoints,
    /// otherwise the virtual-hosted AWS form.
    pub fn public_base(&self) -> String {
        let base = match (&self.public_url, &self.endpoint_url) {
            (Some(public), _) => public.trim_end_matches('/').to_string(),
            (None, Some(endpoint)) => {
                format!("{}/{}", endpoint.trim_end_matches('/'), self.bucket)
            }
            (None, None) => format!("https://{}.s3.{}.amazonaws.com", self.bucket, self.region),
        };
        format!("{base}/")
    }
}

/// S3 store implementation using the AWS SDK
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
    public_base: String,
    public_read: bool,
}

impl S3Store {
    pub async fn new(config: S3Config) -> Self {
        let public_base = config.public_base();
        let bucket = config.bucket.clone();
        let public_read = config.public_read;
        let client = Self::create_client(config).await;

        Self {
            client,
            bucket,
            public_base,
            public_read,
        }
    }

    async fn create_client(config: S3Config) -> Client {
        let credentials = Credentials::new(
            config.access_key_id,
            config.secret_access_key,
            None,
            None,
            "quill",
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region))
            .credentials_provider(credentials);

        let path_style = config.endpoint_url.is_some();
        if let Some(endpoint) = config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let aws_config = loader.load().await;

        Client::from_conf(
            aws_sdk_s3::config::Builder::from(&aws_config)
                .force_path_style(path_style)
                .build(),
        )
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn map_sdk_error<E, R>(err: SdkError<E, R>) -> crate::BlobError
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
        R: fmt::Debug + Send + Sync + 'static,
    {
        let code = err.as_service_error().and_then(|e| e.code()).map(str::to_string);
        let message = err
            .as_service_error()
            .and_then(|e| e.message())
            .map(str::to_string)
            .unwrap_or_else(|| err.to_string());
        classify_store_error(code.as_deref(), &message)
    }
}

#[async_trait]
impl BlobStore for S3Store {
    async fn put(&self, key: &str, content_type: Option<&str>, data: Bytes) -> BlobResult<PutResult> {
        let size_bytes = data.len() as u64;

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data));

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }
        if self.public_read {
            request = request.acl(ObjectCannedAcl::PublicRead);
        }

        let result = request.send().await.map_err(Self::map_sdk_error)?;

        Ok(PutResult {
            etag: result.e_tag,
            size_bytes,
        })
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(Self::map_sdk_error)?;
        Ok(())
    }

    fn public_base(&self) -> String {
        self.public_base.clone()
    }
}
