use super::*;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn spawned_tasks_run_on_the_owned_runtime() {
    let runtime = AsyncRuntime::new().unwrap();
    let executor: Arc<dyn AsyncExecutor> = Arc::new(runtime.executor());
    let (tx, rx) = mpsc::channel();

    executor.spawn_task(async move {
        let _ = tx.send(7u32);
    });

    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 7);
}

#[test]
fn current_executor_requires_a_runtime() {
    assert!(TokioExecutor::current().is_none());

    let runtime = AsyncRuntime::new().unwrap();
    let found = runtime.block_on(async { TokioExecutor::current().is_some() });
    assert!(found);
}
