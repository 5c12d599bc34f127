use std::sync::Arc;

use quill_core::QuillApp;

pub struct QuillAxumState<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + 'static,
{
    pub app: Arc<QuillApp<R, P>>,
}

impl<R, P> Clone for QuillAxumState<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            app: Arc::clone(&self.app),
        }
    }
}

impl<R, P> QuillAxumState<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + 'static,
{
    pub fn new(app: QuillApp<R, P>) -> Self {
        Self { app: Arc::new(app) }
    }
}
