use std::sync::Arc;

use anyhow::Result;
use quill_blob::{AttachmentManager, BlobConfig, S3Store};
use quill_blog::config::Settings;
use quill_core::QuillApp;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    let settings = Settings::from_env()?;

    let app = QuillApp::new();
    settings.apply(&app);

    let s3 = S3Store::new(settings.s3.clone()).await;
    tracing::info!(bucket = s3.bucket(), "object storage configured");
    let attachments = AttachmentManager::new(
        Arc::new(s3),
        BlobConfig::default().with_max_blob_bytes(settings.upload_max_bytes),
    );

    let store = quill_blog::document_store(&settings).await?;
    let ax = quill_blog::build(app, store, attachments)?;

    let addr = format!("{}:{}", settings.http.host, settings.http.port);
    ax.listen(addr).await
}
