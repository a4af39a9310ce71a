//! Shared hook builders for integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use graceful_closer::lifecycle::HookError;
use graceful_closer::{ShutdownContext, ShutdownCoordinator};

/// Register a hook that bumps `counter` and succeeds.
#[allow(dead_code)]
pub fn register_counting(coordinator: &ShutdownCoordinator, name: &str, counter: &Arc<AtomicUsize>) {
    let counter = counter.clone();
    coordinator.register_named(name, move |_ctx| async move {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
}

/// Register a hook that bumps `counter`, waits `delay`, then fails.
#[allow(dead_code)]
pub fn register_failing(
    coordinator: &ShutdownCoordinator,
    name: &str,
    counter: &Arc<AtomicUsize>,
    delay: Duration,
) {
    let counter = counter.clone();
    let message = format!("{} refused to close", name);
    coordinator.register_named(name, move |_ctx| async move {
        counter.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(delay).await;
        Err(HookError::from(message))
    });
}

/// Register a hook that ignores its context and never returns.
#[allow(dead_code)]
pub fn register_stalling(coordinator: &ShutdownCoordinator, name: &str) {
    coordinator.register_named(name, |_ctx| std::future::pending::<Result<(), HookError>>());
}

/// Register a hook that waits for its context to end, then reports it.
#[allow(dead_code)]
pub fn register_cooperative(coordinator: &ShutdownCoordinator, name: &str, finished: &Arc<AtomicUsize>) {
    let finished = finished.clone();
    coordinator.register_named(name, move |ctx: ShutdownContext| async move {
        let reason = ctx.done().await;
        finished.fetch_add(1, Ordering::SeqCst);
        Err(HookError::from(reason))
    });
}

/// Register a hook that panics with `payload` after yielding once.
#[allow(dead_code)]
pub fn register_panicking(coordinator: &ShutdownCoordinator, name: &str, payload: &'static str) {
    coordinator.register_named(name, move |_ctx| async move {
        tokio::task::yield_now().await;
        if !payload.is_empty() {
            panic!("{}", payload);
        }
        Ok(())
    });
}

#[allow(dead_code)]
pub fn budget(millis: u64) -> ShutdownContext {
    ShutdownContext::with_timeout(Duration::from_millis(millis))
}
