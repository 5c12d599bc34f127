use std::sync::{Arc, PoisonError, RwLock};

use anyhow::Result;

use crate::{QuillConfig, QuillConfigSnapshot, QuillService, QuillServiceRegistry};

struct QuillAppInner<R, P>
where
    R: Send + 'static,
    P: Send + 'static,
{
    registry: RwLock<QuillServiceRegistry<R, P>>,
    config: RwLock<QuillConfig>,
}

/// QuillApp is the central application container.
///
/// Framework-agnostic. Holds the service registry and config.
/// Cloning is cheap; clones share state.
pub struct QuillApp<R, P = ()>
where
    R: Send + 'static,
    P: Send + 'static,
{
    inner: Arc<QuillAppInner<R, P>>,
}

impl<R, P> Default for QuillApp<R, P>
where
    R: Send + 'static,
    P: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<R, P> Clone for QuillApp<R, P>
where
    R: Send + 'static,
    P: Send + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, P> QuillApp<R, P>
where
    R: Send + 'static,
    P: Send + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(QuillAppInner {
                registry: RwLock::new(QuillServiceRegistry::new()),
                config: RwLock::new(QuillConfig::new()),
            }),
        }
    }

    pub fn register_service<S>(&self, name: S, service: Arc<dyn QuillService<R, P>>)
    where
        S: Into<String>,
    {
        self.inner
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(name, service);
    }

    /// Look up a registered service by name.
    pub fn service(&self, name: &str) -> Result<Arc<dyn QuillService<R, P>>> {
        self.inner
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("QuillService not found: {name}"))
    }

    pub fn set<K, V>(&self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.inner
            .config
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set(key, value);
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner
            .config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .map(str::to_string)
    }

    pub fn config_snapshot(&self) -> QuillConfigSnapshot {
        self.inner
            .config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Page, ServiceCapabilities, ServiceMethodKind};
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl QuillService<String> for Echo {
        fn capabilities(&self) -> ServiceCapabilities {
            ServiceCapabilities::from_methods(vec![ServiceMethodKind::Get])
        }

        async fn get(&self, id: &str, _params: ()) -> Result<String> {
            Ok(id.to_string())
        }
    }

    #[tokio::test]
    async fn registered_service_is_callable() {
        let app: QuillApp<String> = QuillApp::new();
        app.register_service("echo", Arc::new(Echo));

        let svc = app.service("echo").unwrap();
        assert_eq!(svc.get("abc", ()).await.unwrap(), "abc");
        assert!(svc.capabilities().allows(&ServiceMethodKind::Get));
        assert!(!svc.capabilities().allows(&ServiceMethodKind::Find));
    }

    #[tokio::test]
    async fn unimplemented_methods_error() {
        let app: QuillApp<String> = QuillApp::new();
        app.register_service("echo", Arc::new(Echo));
        let svc = app.service("echo").unwrap();

        let err = svc.find(()).await.map(|p: Page<String>| p.data).unwrap_err();
        assert!(err.to_string().contains("find"));
        assert!(app.service("missing").is_err());
    }

    #[test]
    fn clones_share_config() {
        let app: QuillApp<String> = QuillApp::new();
        let other = app.clone();
        app.set("http.port", "3000");
        assert_eq!(other.get("http.port").as_deref(), Some("3000"));
        assert_eq!(other.config_snapshot().get_usize("http.port"), Some(3000));
    }
}
