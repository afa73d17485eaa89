use std::future::Future;
use std::pin::Pin;

pub type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Where preview resolution tasks run. The pipeline never owns a runtime.
pub trait AsyncExecutor: Send + Sync {
    fn spawn(&self, task: BoxFuture);
}

impl dyn AsyncExecutor {
    pub fn spawn_task<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.spawn(Box::pin(task));
    }
}
