//! OS signal handling.
//!
//! # Responsibilities
//! - Register handlers for the configured termination signals
//! - Trigger the coordinator with a fresh grace-period context
//! - Stand down when shutdown was already driven by another path
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Handlers are registered eagerly so failures surface at startup
//! - The watcher acts at most once. Tokio never uninstalls a handler, so
//!   later signals are absorbed and do not reach the OS default action

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::lifecycle::context::ShutdownContext;
use crate::lifecycle::shutdown::ShutdownCoordinator;

/// Termination requests the watcher can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminationSignal {
    /// SIGINT (Ctrl+C).
    Interrupt,
    /// SIGTERM.
    Terminate,
    /// SIGQUIT.
    Quit,
    /// SIGHUP.
    Hangup,
}

impl TerminationSignal {
    #[cfg(unix)]
    fn kind(self) -> tokio::signal::unix::SignalKind {
        use tokio::signal::unix::SignalKind;

        match self {
            TerminationSignal::Interrupt => SignalKind::interrupt(),
            TerminationSignal::Terminate => SignalKind::terminate(),
            TerminationSignal::Quit => SignalKind::quit(),
            TerminationSignal::Hangup => SignalKind::hangup(),
        }
    }
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TerminationSignal::Interrupt => "SIGINT",
            TerminationSignal::Terminate => "SIGTERM",
            TerminationSignal::Quit => "SIGQUIT",
            TerminationSignal::Hangup => "SIGHUP",
        };
        f.write_str(name)
    }
}

/// Future resolving with the first termination signal received.
pub type SignalFuture = Pin<Box<dyn Future<Output = TerminationSignal> + Send + 'static>>;

/// Register handlers for `signals` and return a future for the first one.
///
/// An empty set yields a future that never resolves.
#[cfg(unix)]
pub fn listen(signals: &[TerminationSignal]) -> std::io::Result<SignalFuture> {
    use futures_util::future::{self, FutureExt};
    use tokio::signal::unix::signal;

    if signals.is_empty() {
        return Ok(future::pending().boxed());
    }

    let mut waits = Vec::with_capacity(signals.len());
    for &sig in signals {
        let mut stream = signal(sig.kind())?;
        waits.push(
            async move {
                if stream.recv().await.is_none() {
                    future::pending::<()>().await;
                }
                sig
            }
            .boxed(),
        );
    }

    Ok(async move {
        let (sig, _, _) = future::select_all(waits).await;
        sig
    }
    .boxed())
}

/// Register handlers for `signals` and return a future for the first one.
///
/// Only Ctrl+C is available off Unix; other signals are ignored.
#[cfg(not(unix))]
pub fn listen(signals: &[TerminationSignal]) -> std::io::Result<SignalFuture> {
    use futures_util::future::{self, FutureExt};

    for sig in signals.iter().filter(|s| **s != TerminationSignal::Interrupt) {
        tracing::warn!(signal = %sig, "Signal not supported on this platform, ignoring");
    }

    if !signals.contains(&TerminationSignal::Interrupt) {
        return Ok(future::pending().boxed());
    }

    Ok(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            future::pending::<()>().await;
        }
        TerminationSignal::Interrupt
    }
    .boxed())
}

/// Spawn the watcher task: shut down when `trigger` fires, or exit quietly
/// once the coordinator completes through another path.
pub(crate) fn spawn_watcher<F>(
    coordinator: ShutdownCoordinator,
    trigger: F,
    grace: Duration,
) -> JoinHandle<()>
where
    F: Future<Output = TerminationSignal> + Send + 'static,
{
    let completion = coordinator.completion();

    tokio::spawn(async move {
        tokio::select! {
            sig = trigger => {
                tracing::info!(signal = %sig, grace_ms = grace.as_millis() as u64, "Termination signal received, starting graceful shutdown");
                let ctx = ShutdownContext::with_timeout(grace);
                if let Err(e) = coordinator.shutdown(ctx).await {
                    tracing::error!(error = %e, "Failed to close resources");
                }
            }
            _ = completion.wait() => {
                tracing::debug!("Shutdown completed elsewhere, signal watcher exiting");
            }
        }
    })
}
