use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{OriginalUri, Path, Query, State},
    http::{HeaderMap, StatusCode, Uri},
    routing::{self, MethodRouter},
    Json, Router,
};
use quill_core::errors::QuillError;
use quill_core::{QuillApp, ServiceCapabilities, ServiceMethodKind};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::{
    envelope::{Envelope, MessageEnvelope},
    params::{FromRestParams, RestParams},
    QuillAxumError, QuillAxumState,
};

type QueryMap = HashMap<String, String>;

fn map_json_rejection(rejection: JsonRejection) -> QuillAxumError {
    QuillError::validation("Failed to parse the request body as JSON")
        .with_errors(json!({"_schema": [rejection.body_text()]}))
        .into()
}

fn map_query_rejection(rejection: QueryRejection) -> QuillAxumError {
    QuillError::validation("Failed to parse the query string")
        .with_errors(json!({"_schema": [rejection.body_text()]}))
        .into()
}

fn rest_params<P: FromRestParams>(
    headers: &HeaderMap,
    query: Result<Query<QueryMap>, QueryRejection>,
    method: &str,
    uri: &Uri,
) -> Result<P, QuillAxumError> {
    let Query(query) = query.map_err(map_query_rejection)?;
    Ok(P::from_rest_params(RestParams::from_parts(headers, query, method, uri)))
}

/// Builds the routes for one service, mounting only what its capabilities allow:
///
/// - `GET /`            → find
/// - `POST /`           → create (201)
/// - `GET /{id}`        → get
/// - `PUT /{id}`        → update
/// - `DELETE /{id}`     → remove
/// - `GET /{name}`      → `Custom(name)`
/// - `GET /{name}/{id}` → `CustomById(name)`
pub fn service_router<R, P>(
    service_name: Arc<String>,
    app: Arc<QuillApp<R, P>>,
    capabilities: &ServiceCapabilities,
) -> Router<()>
where
    R: Serialize + DeserializeOwned + Send + Sync + 'static,
    P: FromRestParams + Send + Sync + 'static,
{
    let state = QuillAxumState { app };
    let mut router: Router<QuillAxumState<R, P>> = Router::new();

    let mut collection: MethodRouter<QuillAxumState<R, P>> = MethodRouter::new();
    let mut item: MethodRouter<QuillAxumState<R, P>> = MethodRouter::new();
    let (mut has_collection, mut has_item) = (false, false);

    for method in &capabilities.allowed_methods {
        match method {
            ServiceMethodKind::Find => {
                has_collection = true;
                let service_name = Arc::clone(&service_name);
                collection = collection.get(
                    move |State(state): State<QuillAxumState<R, P>>,
                          headers: HeaderMap,
                          query: Result<Query<QueryMap>, QueryRejection>,
                          OriginalUri(uri): OriginalUri| async move {
                        let params = rest_params::<P>(&headers, query, "GET", &uri)?;

                        let svc = state.app.service(&service_name)?;
                        let page = svc.find(params).await?;
                        Ok::<_, QuillAxumError>(Json(Envelope::page(page)))
                    },
                );
            }
            ServiceMethodKind::Create => {
                has_collection = true;
                let service_name = Arc::clone(&service_name);
                collection = collection.post(
                    move |State(state): State<QuillAxumState<R, P>>,
                          headers: HeaderMap,
                          query: Result<Query<QueryMap>, QueryRejection>,
                          OriginalUri(uri): OriginalUri,
                          data: Result<Json<R>, JsonRejection>| async move {
                        let Json(data) = data.map_err(map_json_rejection)?;
                        let params = rest_params::<P>(&headers, query, "POST", &uri)?;

                        let svc = state.app.service(&service_name)?;
                        let res = svc.create(data, params).await?;
                        Ok::<_, QuillAxumError>((StatusCode::CREATED, Json(Envelope::data(res))))
                    },
                );
            }
            ServiceMethodKind::Get => {
                has_item = true;
                let service_name = Arc::clone(&service_name);
                item = item.get(
                    move |State(state): State<QuillAxumState<R, P>>,
                          headers: HeaderMap,
                          query: Result<Query<QueryMap>, QueryRejection>,
                          OriginalUri(uri): OriginalUri,
                          Path(id): Path<String>| async move {
                        let params = rest_params::<P>(&headers, query, "GET", &uri)?;

                        let svc = state.app.service(&service_name)?;
                        let res = svc.get(&id, params).await?;
                        Ok::<_, QuillAxumError>(Json(Envelope::data(res)))
                    },
                );
            }
            ServiceMethodKind::Update => {
                has_item = true;
                let service_name = Arc::clone(&service_name);
                item = item.put(
                    move |State(state): State<QuillAxumState<R, P>>,
                          headers: HeaderMap,
                          query: Result<Query<QueryMap>, QueryRejection>,
                          OriginalUri(uri): OriginalUri,
                          Path(id): Path<String>,
                          data: Result<Json<R>, JsonRejection>| async move {
                        let Json(data) = data.map_err(map_json_rejection)?;
                        let params = rest_params::<P>(&headers, query, "PUT", &uri)?;

                        let svc = state.app.service(&service_name)?;
                        let res = svc.update(&id, data, params).await?;
                        Ok::<_, QuillAxumError>(Json(Envelope::data(res)))
                    },
                );
            }
            ServiceMethodKind::Remove => {
                has_item = true;
                let service_name = Arc::clone(&service_name);
                item = item.delete(
                    move |State(state): State<QuillAxumState<R, P>>,
                          headers: HeaderMap,
                          query: Result<Query<QueryMap>, QueryRejection>,
                          OriginalUri(uri): OriginalUri,
                          Path(id): Path<String>| async move {
                        let params = rest_params::<P>(&headers, query, "DELETE", &uri)?;

                        let svc = state.app.service(&service_name)?;
                        let entity = svc.entity_name();
                        svc.remove(&id, params).await?;
                        Ok::<_, QuillAxumError>(Json(MessageEnvelope::new(format!(
                            "{entity} deleted successfully"
                        ))))
                    },
                );
            }
            ServiceMethodKind::Custom(name) => {
                let service_name = Arc::clone(&service_name);
                let name: &'static str = *name;
                router = router.route(
                    &format!("/{name}"),
                    routing::get(
                        move |State(state): State<QuillAxumState<R, P>>,
                              headers: HeaderMap,
                              query: Result<Query<QueryMap>, QueryRejection>,
                              OriginalUri(uri): OriginalUri| async move {
                            let params = rest_params::<P>(&headers, query, "GET", &uri)?;

                            let svc = state.app.service(&service_name)?;
                            let page = svc.custom(name, None, params).await?;
                            Ok::<_, QuillAxumError>(Json(Envelope::page(page)))
                        },
                    ),
                );
            }
            ServiceMethodKind::CustomById(name) => {
                let service_name = Arc::clone(&service_name);
                let name: &'static str = *name;
                router = router.route(
                    &format!("/{name}/{{id}}"),
                    routing::get(
                        move |State(state): State<QuillAxumState<R, P>>,
                              headers: HeaderMap,
                              query: Result<Query<QueryMap>, QueryRejection>,
                              OriginalUri(uri): OriginalUri,
                              Path(id): Path<String>| async move {
                            let params = rest_params::<P>(&headers, query, "GET", &uri)?;

                            let svc = state.app.service(&service_name)?;
                            let page = svc.custom(name, Some(&id), params).await?;
                            Ok::<_, QuillAxumError>(Json(Envelope::page(page)))
                        },
                    ),
                );
            }
        }
    }

    if has_collection {
        router = router.route("/", collection);
    }
    if has_item {
        router = router.route("/{id}", item);
    }

    router.with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn query_rejections_use_the_error_envelope() {
        let uri: Uri = "/notes?page=two".parse().unwrap();
        let rejection = Query::<HashMap<String, u32>>::try_from_uri(&uri).unwrap_err();

        let res = map_query_rejection(rejection).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"], "Failed to parse the query string");
        assert!(body["errors"]["_schema"][0].is_string());
    }

    #[test]
    fn well_formed_queries_become_params() {
        let uri: Uri = "/notes?q=rust".parse().unwrap();
        let query = Query::<QueryMap>::try_from_uri(&uri);
        let params: RestParams = rest_params(&HeaderMap::new(), query, "GET", &uri).unwrap();
        assert_eq!(params.query_text("q"), Some("rust"));
        assert_eq!(params.method, "GET");
    }
}
