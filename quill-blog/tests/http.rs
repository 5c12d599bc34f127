use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::Router;
use bytes::Bytes;
use http_body_util::BodyExt;
use quill_blob::{AttachmentManager, BlobConfig, BlobError, BlobResult, BlobStore, MemoryBlobStore, PutResult};
use quill_blog::{build, memory_store};
use quill_core::QuillApp;
use serde_json::{json, Value};
use tower::ServiceExt;

const BOUNDARY: &str = "blog-test-boundary";

fn router_with(blobs: Arc<dyn BlobStore>) -> Router {
    let app = QuillApp::new();
    app.set("paginate.default", "10");
    app.set("paginate.max", "100");
    let attachments = AttachmentManager::new(blobs, BlobConfig::default());
    build(app, memory_store(), attachments).unwrap().into_router()
}

fn router() -> (Router, Arc<MemoryBlobStore>) {
    let blobs = Arc::new(MemoryBlobStore::new());
    (router_with(blobs.clone()), blobs)
}

struct FailingStore {
    denied: bool,
}

#[async_trait]
impl BlobStore for FailingStore {
    async fn put(&self, _key: &str, _content_type: Option<&str>, _data: Bytes) -> BlobResult<PutResult> {
        if self.denied {
            Err(BlobError::access_denied("bucket policy forbids PutObject"))
        } else {
            Err(BlobError::upload_failed("connection reset"))
        }
    }

    async fn delete(&self, _key: &str) -> BlobResult<()> {
        Err(BlobError::upload_failed("connection reset"))
    }

    fn public_base(&self) -> String {
        "https://bucket.example/".to_string()
    }
}

/// Accepts uploads, refuses every delete.
struct StickyStore(MemoryBlobStore);

#[async_trait]
impl BlobStore for StickyStore {
    async fn put(&self, key: &str, content_type: Option<&str>, data: Bytes) -> BlobResult<PutResult> {
        self.0.put(key, content_type, data).await
    }

    async fn delete(&self, _key: &str) -> BlobResult<()> {
        Err(BlobError::access_denied("bucket policy forbids DeleteObject"))
    }

    fn public_base(&self) -> String {
        self.0.public_base()
    }
}

/// Accepts the first upload, fails every later one.
struct FlakyStore {
    inner: MemoryBlobStore,
    puts: AtomicUsize,
}

#[async_trait]
impl BlobStore for FlakyStore {
    async fn put(&self, key: &str, content_type: Option<&str>, data: Bytes) -> BlobResult<PutResult> {
        if self.puts.fetch_add(1, Ordering::SeqCst) == 0 {
            self.inner.put(key, content_type, data).await
        } else {
            Err(BlobError::upload_failed("connection reset"))
        }
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        self.inner.delete(key).await
    }

    fn public_base(&self) -> String {
        self.inner.public_base()
    }
}

async fn send(router: &Router, req: Request<Body>) -> (u16, Value) {
    let res = router.clone().oneshot(req).await.unwrap();
    let status = res.status().as_u16();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder().method("DELETE").uri(uri).body(Body::empty()).unwrap()
}

fn json_req(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a str, &'a [u8]),
}

fn multipart(method: &str, uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    let mut body: Vec<u8> = vec![];
    for part in parts {
        match part {
            Part::Text(name, value) => body.extend_from_slice(
                format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                    .as_bytes(),
            ),
            Part::File(name, filename, content_type, data) => {
                body.extend_from_slice(
                    format!(
                        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

async fn create_tag(router: &Router, name: &str) -> Value {
    let (status, body) = send(router, json_req("POST", "/api/tags", json!({"name": name}))).await;
    assert_eq!(status, 201, "{body}");
    body["data"].clone()
}

async fn create_post(router: &Router, body: Value) -> Value {
    let (status, body) = send(router, json_req("POST", "/api/posts", body)).await;
    assert_eq!(status, 201, "{body}");
    body["data"].clone()
}

#[tokio::test]
async fn health_ok() {
    let (router, _) = router();
    let res = router.oneshot(get("/health")).await.unwrap();
    assert_eq!(res.status().as_u16(), 200);
    assert!(res.headers().get("x-request-id").is_some());
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(std::str::from_utf8(&bytes).unwrap(), "ok");
}

#[tokio::test]
async fn end_to_end_example() {
    let (router, _) = router();

    let tag = create_tag(&router, "Technology").await;
    assert_eq!(tag["name"], "technology");

    let post = create_post(&router, json!({"title": "Test Post", "desc": "This is a test post"})).await;
    assert_eq!(post["title"], "Test Post");
    assert!(post.get("image").is_none());

    let (status, body) = send(&router, get("/api/posts")).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"], json!({"page": 1, "limit": 10, "total": 1, "pages": 1}));

    let (status, body) = send(&router, get("/api/posts/search?q=test")).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn tag_names_are_unique_after_case_folding() {
    let (router, _) = router();
    create_tag(&router, "Rust").await;

    let (status, body) = send(&router, json_req("POST", "/api/tags", json!({"name": "  RUST "}))).await;
    assert_eq!(status, 409);
    assert_eq!(body, json!({"success": false, "error": "Tag already exists"}));
}

#[tokio::test]
async fn tag_validation_and_missing_ids() {
    let (router, _) = router();

    let (status, body) = send(&router, json_req("POST", "/api/tags", json!({}))).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Tag name is required");

    let (status, body) = send(&router, get("/api/tags/tag:missing")).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "Tag not found");

    let (status, _) = send(&router, json_req("PUT", "/api/tags/tag:missing", json!({"name": "x"}))).await;
    assert_eq!(status, 404);

    let (status, _) = send(&router, delete("/api/tags/tag:missing")).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn tag_update_and_delete() {
    let (router, _) = router();
    let a = create_tag(&router, "a").await;
    create_tag(&router, "b").await;
    let uri = format!("/api/tags/{}", a["id"].as_str().unwrap());

    let (status, body) = send(&router, json_req("PUT", &uri, json!({"name": "B"}))).await;
    assert_eq!(status, 409);
    assert_eq!(body["error"], "Tag name already exists");

    let (status, body) = send(&router, json_req("PUT", &uri, json!({"name": " Renamed "}))).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["name"], "renamed");

    let (status, body) = send(&router, delete(&uri)).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"success": true, "message": "Tag deleted successfully"}));

    let (_, body) = send(&router, get("/api/tags")).await;
    assert_eq!(body["pagination"]["total"], 1);
}

#[tokio::test]
async fn invalid_sort_is_rejected() {
    let (router, _) = router();
    let (status, body) = send(&router, get("/api/tags?sort=-password")).await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn multipart_create_with_tags_and_image() {
    let (router, blobs) = router();
    let tech = create_tag(&router, "technology").await;

    let (status, body) = send(
        &router,
        multipart(
            "POST",
            "/api/posts",
            &[
                Part::Text("title", "Hello"),
                Part::Text("desc", "World"),
                Part::Text("tags", "Technology, unknown-tag"),
                Part::File("image", "my cat.png", "image/png", b"\x89PNG"),
            ],
        ),
    )
    .await;
    assert_eq!(status, 201, "{body}");

    let post = &body["data"];
    assert_eq!(post["tags"], json!([{"id": tech["id"], "name": "technology"}]));

    let image = post["image"].as_str().unwrap();
    assert!(image.starts_with("memory://blobs/posts/"));
    assert!(image.ends_with("-my_cat.png"));

    let keys = blobs.keys().await;
    assert_eq!(keys.len(), 1);
    let stored = blobs.blob(&keys[0]).await.unwrap();
    assert_eq!(stored.content_type.as_deref(), Some("image/png"));

    // the unknown tag was not created
    let (_, tags) = send(&router, get("/api/tags")).await;
    assert_eq!(tags["pagination"]["total"], 1);
}

#[tokio::test]
async fn multipart_create_without_title_is_400() {
    let (router, _) = router();
    let (status, body) = send(&router, multipart("POST", "/api/posts", &[Part::Text("desc", "x")])).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Title and description are required");
}

#[tokio::test]
async fn non_image_uploads_are_rejected() {
    let (router, blobs) = router();
    let (status, body) = send(
        &router,
        multipart(
            "POST",
            "/api/posts",
            &[
                Part::Text("title", "T"),
                Part::Text("desc", "D"),
                Part::File("image", "notes.txt", "text/plain", b"hello"),
            ],
        ),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Only image files are allowed!");
    assert!(blobs.keys().await.is_empty());

    let (_, list) = send(&router, get("/api/posts")).await;
    assert_eq!(list["pagination"]["total"], 0);
}

#[tokio::test]
async fn upload_failures_abort_create() {
    for denied in [false, true] {
        let router = router_with(Arc::new(FailingStore { denied }));
        let (status, body) = send(
            &router,
            multipart(
                "POST",
                "/api/posts",
                &[
                    Part::Text("title", "T"),
                    Part::Text("desc", "D"),
                    Part::File("image", "a.png", "image/png", b"PNG"),
                ],
            ),
        )
        .await;
        assert_eq!(status, 500);
        assert_eq!(body, json!({"success": false, "error": "Failed to upload image"}));

        let (_, list) = send(&router, get("/api/posts")).await;
        assert_eq!(list["pagination"]["total"], 0);
    }
}

#[tokio::test]
async fn multipart_update_patches_only_supplied_fields() {
    let (router, blobs) = router();
    let post = create_post(&router, json!({"title": "Old", "desc": "Keep me"})).await;
    let uri = format!("/api/posts/{}", post["id"].as_str().unwrap());

    let (status, body) = send(
        &router,
        multipart(
            "PUT",
            &uri,
            &[
                Part::Text("title", "New"),
                Part::File("image", "b.gif", "image/gif", b"GIF89a"),
            ],
        ),
    )
    .await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["data"]["title"], "New");
    assert_eq!(body["data"]["desc"], "Keep me");
    assert!(body["data"]["image"].as_str().unwrap().ends_with("-b.gif"));
    assert_eq!(blobs.keys().await.len(), 1);

    let (status, _) = send(&router, json_req("PUT", "/api/posts/post:missing", json!({"title": "x"}))).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn update_upload_failure_keeps_post_and_image() {
    let blobs = Arc::new(FlakyStore {
        inner: MemoryBlobStore::new(),
        puts: AtomicUsize::new(0),
    });
    let router = router_with(blobs.clone());
    let (status, body) = send(
        &router,
        multipart(
            "POST",
            "/api/posts",
            &[
                Part::Text("title", "Old"),
                Part::Text("desc", "D"),
                Part::File("image", "a.png", "image/png", b"PNG"),
            ],
        ),
    )
    .await;
    assert_eq!(status, 201, "{body}");
    let old_image = body["data"]["image"].clone();
    let old_keys = blobs.inner.keys().await;
    assert_eq!(old_keys.len(), 1);

    let uri = format!("/api/posts/{}", body["data"]["id"].as_str().unwrap());
    let (status, body) = send(
        &router,
        multipart(
            "PUT",
            &uri,
            &[
                Part::Text("title", "New"),
                Part::File("image", "b.png", "image/png", b"PNG2"),
            ],
        ),
    )
    .await;
    assert_eq!(status, 500);
    assert_eq!(body, json!({"success": false, "error": "Failed to upload image"}));

    let (status, body) = send(&router, get(&uri)).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["title"], "Old");
    assert_eq!(body["data"]["image"], old_image);
    assert_eq!(blobs.inner.keys().await, old_keys);
}

#[tokio::test]
async fn oversized_image_within_form_limit_reports_size() {
    let (router, blobs) = router();
    let image = vec![0u8; 5 * 1024 * 1024 + 512 * 1024];
    let (status, body) = send(
        &router,
        multipart(
            "POST",
            "/api/posts",
            &[
                Part::Text("title", "T"),
                Part::Text("desc", "D"),
                Part::File("image", "big.png", "image/png", &image),
            ],
        ),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Image exceeds the maximum size of 5242880 bytes");
    assert!(blobs.keys().await.is_empty());
}

#[tokio::test]
async fn deleting_a_post_removes_its_image() {
    let (router, blobs) = router();
    let (status, body) = send(
        &router,
        multipart(
            "POST",
            "/api/posts",
            &[
                Part::Text("title", "T"),
                Part::Text("desc", "D"),
                Part::File("image", "a.png", "image/png", b"PNG"),
            ],
        ),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(blobs.keys().await.len(), 1);

    let uri = format!("/api/posts/{}", body["data"]["id"].as_str().unwrap());
    let (status, body) = send(&router, delete(&uri)).await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Post deleted successfully");
    assert!(blobs.keys().await.is_empty());

    let (status, body) = send(&router, get(&uri)).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "Post not found");
}

#[tokio::test]
async fn delete_succeeds_when_image_cleanup_fails() {
    let router = router_with(Arc::new(StickyStore(MemoryBlobStore::new())));
    let (status, body) = send(
        &router,
        multipart(
            "POST",
            "/api/posts",
            &[
                Part::Text("title", "T"),
                Part::Text("desc", "D"),
                Part::File("image", "a.png", "image/png", b"PNG"),
            ],
        ),
    )
    .await;
    assert_eq!(status, 201, "{body}");

    let uri = format!("/api/posts/{}", body["data"]["id"].as_str().unwrap());
    let (status, _) = send(&router, delete(&uri)).await;
    assert_eq!(status, 200);
    let (status, _) = send(&router, get(&uri)).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn search_requires_a_query() {
    let (router, _) = router();
    for uri in ["/api/posts/search", "/api/posts/search?q=", "/api/posts/search?q=%20"] {
        let (status, body) = send(&router, get(uri)).await;
        assert_eq!(status, 400, "{uri}");
        assert_eq!(body["error"], "Search query is required");
    }
}

#[tokio::test]
async fn search_matches_title_or_description() {
    let (router, _) = router();
    create_post(&router, json!({"title": "Rust tips", "desc": "ownership"})).await;
    create_post(&router, json!({"title": "Cooking", "desc": "A RUSTic bread"})).await;
    create_post(&router, json!({"title": "Go", "desc": "channels"})).await;

    let (status, body) = send(&router, get("/api/posts/search?q=rust&limit=1")).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"], json!({"page": 1, "limit": 1, "total": 2, "pages": 2}));

    let (status, body) = send(&router, get("/api/posts/search?q=%20tips")).await;
    assert_eq!(status, 200);
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["title"], "Rust tips");

    let (_, body) = send(&router, get("/api/posts/search?q=rust%20")).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["title"], "Rust tips");
}

#[tokio::test]
async fn by_tag_lists_tagged_posts() {
    let (router, _) = router();
    let (status, body) = send(&router, get("/api/posts/by-tag/tag:missing")).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "Tag not found");

    let rust = create_tag(&router, "rust").await;
    create_tag(&router, "go").await;
    create_post(&router, json!({"title": "A", "desc": "d", "tags": "rust"})).await;
    create_post(&router, json!({"title": "B", "desc": "d", "tags": ["go", "rust"]})).await;
    create_post(&router, json!({"title": "C", "desc": "d", "tags": "go"})).await;

    let uri = format!("/api/posts/by-tag/{}", rust["id"].as_str().unwrap());
    let (status, body) = send(&router, get(&uri)).await;
    assert_eq!(status, 200);
    assert_eq!(body["pagination"]["total"], 2);
}

#[tokio::test]
async fn list_filters_and_pages() {
    let (router, _) = router();
    let rust = create_tag(&router, "rust").await;
    let go = create_tag(&router, "go").await;

    for i in 0..5 {
        create_post(&router, json!({"title": format!("Rust {i}"), "desc": "d", "tags": "rust"})).await;
    }
    create_post(&router, json!({"title": "Go intro", "desc": "d", "tags": "go"})).await;

    let (_, body) = send(&router, get("/api/posts?limit=2&page=3")).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"], json!({"page": 3, "limit": 2, "total": 6, "pages": 3}));

    let (_, body) = send(&router, get("/api/posts?limit=2&page=4")).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let (_, body) = send(&router, get("/api/posts?title=RUST")).await;
    assert_eq!(body["pagination"]["total"], 5);

    let uri = format!("/api/posts?tags={},{}", go["id"].as_str().unwrap(), "tag:none");
    let (_, body) = send(&router, get(&uri)).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["title"], "Go intro");

    let uri = format!("/api/posts?title=go&tags={}", rust["id"].as_str().unwrap());
    let (_, body) = send(&router, get(&uri)).await;
    assert_eq!(body["pagination"]["total"], 0);

    let (_, body) = send(&router, get("/api/posts?page=abc&limit=ten")).await;
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 10);

    let (_, body) = send(&router, get("/api/posts?sort=title&limit=1")).await;
    assert_eq!(body["data"][0]["title"], "Go intro");
}
