//! Shutdown coordination.
//!
//! # States
//! - Idle: hooks are being registered
//! - Running: the single shutdown run is draining the registry
//! - Completed: the run's wait loop exited; the outcome is fixed
//!
//! # State Transitions
//! ```text
//! Idle → Running: first call to shutdown() (signal watcher or owner)
//! Running → Completed: every hook reported, or the context ended
//! ```
//!
//! # Design Decisions
//! - The run executes in its own task, so dropping the triggering call
//!   does not abandon it halfway
//! - The outcome lives on the coordinator; every caller reads the same value
//! - Hooks still running at the deadline are detached, not joined

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::future::Future;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::ShutdownConfig;
use crate::lifecycle::context::ShutdownContext;
use crate::lifecycle::error::{HookError, ShutdownError};
use crate::lifecycle::hook::Hook;
use crate::lifecycle::signals::{self, TerminationSignal};
use crate::observability::metrics;

/// One-shot event fired when the shutdown run finishes.
///
/// Clones observe the same event; waiting after it fired returns immediately.
#[derive(Debug, Clone, Default)]
pub struct CompletionSignal {
    token: CancellationToken,
}

impl CompletionSignal {
    /// Wait until the shutdown run has finished.
    pub async fn wait(&self) {
        self.token.cancelled().await;
    }

    pub fn is_fired(&self) -> bool {
        self.token.is_cancelled()
    }

    fn fire(&self) {
        self.token.cancel();
    }
}

/// Coordinator for graceful shutdown.
///
/// Resource owners register cleanup hooks at any time; the first trigger runs
/// them all concurrently under the trigger's context. Cloning yields another
/// handle to the same coordinator.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    hooks: Mutex<Vec<Hook>>,
    started: AtomicBool,
    watching: AtomicBool,
    outcome: OnceLock<Result<(), ShutdownError>>,
    completion: CompletionSignal,
}

impl ShutdownCoordinator {
    /// Create a coordinator that only shuts down when triggered explicitly.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                hooks: Mutex::new(Vec::new()),
                started: AtomicBool::new(false),
                watching: AtomicBool::new(false),
                outcome: OnceLock::new(),
                completion: CompletionSignal::default(),
            }),
        }
    }

    /// Create a coordinator that also shuts down on the given OS signals,
    /// giving watcher-triggered runs `grace` to finish.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn with_signals(signals: &[TerminationSignal], grace: Duration) -> std::io::Result<Self> {
        let coordinator = Self::new();
        if !signals.is_empty() {
            let trigger = signals::listen(signals)?;
            coordinator.spawn_watcher(trigger, grace);
        }
        Ok(coordinator)
    }

    pub fn from_config(config: &ShutdownConfig) -> std::io::Result<Self> {
        Self::with_signals(&config.signals, config.signal_grace())
    }

    /// Register an unnamed hook.
    pub fn register<F, Fut>(&self, action: F)
    where
        F: FnOnce(ShutdownContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        self.register_hook(Hook::new(None, action));
    }

    /// Register a hook under a name used in logs and errors.
    pub fn register_named<F, Fut>(&self, name: impl Into<String>, action: F)
    where
        F: FnOnce(ShutdownContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        self.register_hook(Hook::new(Some(name.into()), action));
    }

    /// Append a hook to the registry.
    ///
    /// A hook registered while a run is starting may miss the snapshot; hooks
    /// registered after the snapshot are kept but never executed.
    pub fn register_hook(&self, hook: Hook) {
        if self.inner.started.load(Ordering::Acquire) {
            tracing::warn!(hook = ?hook.name(), "Hook registered after shutdown started; it will not run");
        }
        self.inner.lock_hooks().push(hook);
    }

    /// Number of hooks waiting in the registry.
    pub fn pending_hooks(&self) -> usize {
        self.inner.lock_hooks().len()
    }

    /// Trigger shutdown and wait for the outcome.
    ///
    /// The first call starts the run with `ctx` as its budget. Every call,
    /// first or not, waits for that run to finish and returns its outcome.
    pub async fn shutdown(&self, ctx: ShutdownContext) -> Result<(), ShutdownError> {
        if self
            .inner
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move { inner.run(ctx).await });
        }

        self.inner.completion.wait().await;
        self.outcome().unwrap_or(Err(ShutdownError::RunAborted))
    }

    /// Completion event of the shutdown run.
    pub fn completion(&self) -> CompletionSignal {
        self.inner.completion.clone()
    }

    /// Outcome of the run, `None` until it has completed.
    pub fn outcome(&self) -> Option<Result<(), ShutdownError>> {
        self.inner.outcome.get().cloned()
    }

    /// Whether a run has been triggered.
    pub fn is_started(&self) -> bool {
        self.inner.started.load(Ordering::Acquire)
    }

    /// Trigger shutdown with a fresh `grace` budget when `trigger` resolves.
    ///
    /// Only one watcher is allowed per coordinator; later calls return `None`.
    pub fn spawn_watcher<F>(&self, trigger: F, grace: Duration) -> Option<JoinHandle<()>>
    where
        F: Future<Output = TerminationSignal> + Send + 'static,
    {
        if self.inner.watching.swap(true, Ordering::AcqRel) {
            tracing::warn!("Signal watcher already running");
            return None;
        }
        Some(signals::spawn_watcher(self.clone(), trigger, grace))
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ShutdownCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownCoordinator")
            .field("pending_hooks", &self.pending_hooks())
            .field("started", &self.is_started())
            .field("completed", &self.inner.completion.is_fired())
            .finish()
    }
}

impl Inner {
    fn lock_hooks(&self) -> std::sync::MutexGuard<'_, Vec<Hook>> {
        self.hooks.lock().expect("hook registry mutex poisoned")
    }

    /// The single shutdown run.
    async fn run(&self, ctx: ShutdownContext) {
        let started = Instant::now();
        let finish = FinishGuard { inner: self };

        let hooks = std::mem::take(&mut *self.lock_hooks());
        if hooks.is_empty() {
            tracing::info!("No hooks to close");
            finish.complete(Ok(()), started);
            return;
        }

        let total = hooks.len();
        tracing::info!(hooks = total, "Starting graceful shutdown");

        let (report_tx, mut report_rx) = mpsc::unbounded_channel();
        for (index, hook) in hooks.into_iter().enumerate().rev() {
            let label = hook.label(index);
            let report_tx = report_tx.clone();
            let ctx = ctx.clone();
            tokio::spawn(async move {
                let result = hook.execute(&label, ctx).await;
                // The receiver is gone once the run stopped waiting.
                let _ = report_tx.send(result);
            });
        }
        drop(report_tx);

        let mut first_error: Option<ShutdownError> = None;
        let mut pending = total;
        metrics::set_hooks_pending(pending);

        while pending > 0 {
            tokio::select! {
                reason = ctx.done() => {
                    tracing::warn!(pending, error = %reason, "Context ended during shutdown");
                    record_error(&mut first_error, reason.into());
                    break;
                }
                report = report_rx.recv() => match report {
                    Some(result) => {
                        pending -= 1;
                        metrics::set_hooks_pending(pending);
                        if let Err(err) = result {
                            record_error(&mut first_error, err);
                        }
                    }
                    None => break,
                },
            }
        }

        if pending > 0 {
            tracing::warn!(pending, "Leaving unfinished hooks running in the background");
        } else if first_error.is_none() {
            tracing::info!("All resources closed");
        }

        let result = match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        };
        finish.complete(result, started);
    }
}

/// Keep the first error; later ones only reach the debug log.
fn record_error(first: &mut Option<ShutdownError>, err: ShutdownError) {
    match first {
        None => {
            tracing::error!(error = %err, "Shutdown error");
            *first = Some(err);
        }
        Some(_) => tracing::debug!(error = %err, "Additional shutdown error"),
    }
}

/// Publishes the outcome, then fires completion on drop so waiters are
/// released even if the run task unwinds or is dropped before reaching the
/// end. A run that never published an outcome is recorded as aborted.
struct FinishGuard<'a> {
    inner: &'a Inner,
}

impl FinishGuard<'_> {
    fn complete(self, result: Result<(), ShutdownError>, started: Instant) {
        let duration = started.elapsed();
        let outcome = match &result {
            Ok(()) => "success",
            Err(err) => err.kind(),
        };
        metrics::record_shutdown(outcome, duration);
        tracing::info!(outcome, duration_ms = duration.as_millis() as u64, "Shutdown finished");

        let _ = self.inner.outcome.set(result);
    }
}

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        if self.inner.outcome.set(Err(ShutdownError::RunAborted)).is_ok() {
            tracing::error!("Shutdown run ended without an outcome");
        }
        self.inner.completion.fire();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn budget() -> ShutdownContext {
        ShutdownContext::with_timeout(Duration::from_secs(1))
    }

    #[tokio::test]
    async fn empty_registry_completes_immediately() {
        let coordinator = ShutdownCoordinator::new();
        assert!(!coordinator.completion().is_fired());
        assert!(coordinator.outcome().is_none());

        assert!(coordinator.shutdown(budget()).await.is_ok());
        assert!(coordinator.completion().is_fired());
        assert!(matches!(coordinator.outcome(), Some(Ok(()))));
    }

    #[tokio::test]
    async fn hooks_launch_in_reverse_order() {
        // The current-thread scheduler polls spawned tasks in spawn order.
        let coordinator = ShutdownCoordinator::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for name in ["a", "b", "c"] {
            let order = order.clone();
            coordinator.register_named(name, move |_ctx| async move {
                order.lock().unwrap().push(name);
                Ok(())
            });
        }

        coordinator.shutdown(budget()).await.unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn registry_is_drained_once() {
        let coordinator = ShutdownCoordinator::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let c = calls.clone();
        coordinator.register(move |_ctx| async move {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert_eq!(coordinator.pending_hooks(), 1);

        coordinator.shutdown(budget()).await.unwrap();
        assert_eq!(coordinator.pending_hooks(), 0);

        let c = calls.clone();
        coordinator.register(move |_ctx| async move {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        coordinator.shutdown(budget()).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(coordinator.pending_hooks(), 1);
    }

    #[tokio::test]
    async fn first_error_wins() {
        let coordinator = ShutdownCoordinator::new();
        coordinator.register_named("slow", |_ctx| async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Err("slow failure".into())
        });
        coordinator.register_named("fast", |_ctx| async { Err("fast failure".into()) });

        let err = coordinator.shutdown(budget()).await.unwrap_err();
        assert_eq!(err.hook(), Some("fast"));
    }

    #[tokio::test]
    async fn unnamed_hooks_are_labelled_by_index() {
        let coordinator = ShutdownCoordinator::new();
        coordinator.register(|_ctx| async { Ok(()) });
        coordinator.register(|_ctx| async { Err("nope".into()) });

        let err = coordinator.shutdown(budget()).await.unwrap_err();
        assert_eq!(err.hook(), Some("hook-1"));
    }

    #[tokio::test]
    async fn canceled_context_is_reported() {
        let coordinator = ShutdownCoordinator::new();
        coordinator.register(|ctx: ShutdownContext| async move {
            ctx.done().await;
            Ok(())
        });

        let ctx = ShutdownContext::background();
        let trigger = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let err = coordinator.shutdown(ctx).await.unwrap_err();
        assert!(matches!(err, ShutdownError::Context(crate::lifecycle::ContextError::Canceled)));
    }

    #[test]
    fn run_torn_down_mid_flight_is_reported_as_aborted() {
        let coordinator = ShutdownCoordinator::new();
        coordinator.register_named("stuck", |_ctx| std::future::pending::<Result<(), HookError>>());

        let first = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let trigger = coordinator.clone();
        first.block_on(async move {
            let run = trigger.shutdown(ShutdownContext::with_timeout(Duration::from_secs(30)));
            assert!(tokio::time::timeout(Duration::from_millis(50), run).await.is_err());
        });
        assert!(coordinator.is_started());
        assert!(coordinator.outcome().is_none());

        // Dropping the runtime drops the run task before it can publish.
        drop(first);
        assert!(coordinator.completion().is_fired());

        let second = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let result = second.block_on(coordinator.shutdown(budget()));

        assert!(matches!(result, Err(ShutdownError::RunAborted)));
        assert!(matches!(coordinator.outcome(), Some(Err(ShutdownError::RunAborted))));
    }

    #[tokio::test]
    async fn only_one_watcher() {
        let coordinator = ShutdownCoordinator::new();
        let first = coordinator.spawn_watcher(std::future::pending(), Duration::from_secs(1));
        let second = coordinator.spawn_watcher(std::future::pending(), Duration::from_secs(1));

        assert!(first.is_some());
        assert!(second.is_none());

        coordinator.shutdown(budget()).await.unwrap();
        first.unwrap().await.unwrap();
    }
}
