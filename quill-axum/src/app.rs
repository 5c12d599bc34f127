use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Request};
use axum::handler::Handler;
use axum::routing::get;
use axum::Router;
use quill_core::{QuillApp, QuillService};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::middlewares::{MultipartConfig, MultipartToJson};
use crate::params::FromRestParams;
use crate::rest;

pub struct AxumApp<R, P = ()>
where
    R: Send + Sync + 'static,
    P: Send + Sync + 'static,
{
    pub app: Arc<QuillApp<R, P>>,
    pub router: Router<()>,
    multipart: Option<MultipartConfig>,
    body_limit: Option<usize>,
}

impl<R, P> Clone for AxumApp<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            app: Arc::clone(&self.app),
            router: self.router.clone(),
            multipart: self.multipart.clone(),
            body_limit: self.body_limit,
        }
    }
}

impl<R, P> AxumApp<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + 'static,
{
    pub fn new(app: QuillApp<R, P>) -> Self {
        Self {
            app: Arc::new(app),
            router: Router::new(),
            multipart: None,
            body_limit: None,
        }
    }

    pub fn use_router(mut self, path: &str, router: Router<()>) -> Self {
        self.router = self.router.nest(path, router);
        self
    }

    pub fn use_get<H, T>(mut self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()> + Clone + Send + 'static,
        T: 'static,
    {
        self.router = self.router.route(path, get(handler));
        self
    }

    pub fn service<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()> + Clone + Send + 'static,
        T: 'static,
    {
        self.use_get(path, handler)
    }

    /// Registers `service` under `path` (without the leading `/`) and mounts
    /// the REST routes its capabilities allow.
    pub fn use_service(mut self, path: &'static str, service: Arc<dyn QuillService<R, P>>) -> Self
    where
        R: Serialize + DeserializeOwned,
        P: FromRestParams,
    {
        let name = path.trim_start_matches('/');
        let capabilities = service.capabilities();
        self.app.register_service(name, service);

        let service_name = Arc::new(name.to_string());
        let router = rest::service_router(service_name, Arc::clone(&self.app), &capabilities);

        self.router = self.router.nest(path, router);
        self
    }

    /// Accept `multipart/form-data` bodies, converted to JSON before routing.
    pub fn with_multipart(mut self, config: MultipartConfig) -> Self {
        self.multipart = Some(config);
        self
    }

    /// Raise (or lower) the body size accepted by JSON extractors.
    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = Some(bytes);
        self
    }

    /// The final router with request-id, tracing and body layers applied.
    pub fn into_router(self) -> Router<()> {
        let mut router = self.router;

        if let Some(limit) = self.body_limit {
            router = router.layer(DefaultBodyLimit::max(limit));
        }
        if let Some(config) = self.multipart {
            router = router.layer(MultipartToJson::with_config(config));
        }

        router
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
                let request_id = req
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default();
                tracing::info_span!(
                    "http",
                    method = %req.method(),
                    uri = %req.uri(),
                    request_id = %request_id,
                )
            }))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(addr = ?listener.local_addr()?, "listening");
        axum::serve(listener, self.into_router()).await?;
        Ok(())
    }
}

pub fn axum<R, P>(app: QuillApp<R, P>) -> AxumApp<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + 'static,
{
    AxumApp::new(app)
}
