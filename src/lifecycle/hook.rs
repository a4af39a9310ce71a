//! Shutdown hooks and their execution wrapper.
//!
//! # Responsibilities
//! - Hold an owner-supplied cleanup action together with its optional name
//! - Run the action with timing and structured logging
//! - Contain panics raised by the action and turn them into errors

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::time::Instant;

use futures_util::FutureExt;

use crate::lifecycle::context::ShutdownContext;
use crate::lifecycle::error::{HookError, ShutdownError};
use crate::observability::metrics;

/// Boxed future produced by a hook action.
pub type HookFuture = Pin<Box<dyn Future<Output = Result<(), HookError>> + Send + 'static>>;

type HookAction = Box<dyn FnOnce(ShutdownContext) -> HookFuture + Send + 'static>;

/// A cleanup operation registered by a resource owner.
pub struct Hook {
    name: Option<String>,
    action: HookAction,
}

impl Hook {
    pub fn new<F, Fut>(name: Option<String>, action: F) -> Self
    where
        F: FnOnce(ShutdownContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        Self {
            name,
            action: Box::new(move |ctx| -> HookFuture { Box::pin(action(ctx)) }),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name used in logs: the registered name, or the registration index.
    pub(crate) fn label(&self, index: usize) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("hook-{}", index),
        }
    }

    /// Run the action, never letting a panic escape.
    ///
    /// The action itself is invoked inside the guarded future, so a panic in
    /// the synchronous part of the closure is contained as well.
    pub(crate) async fn execute(self, label: &str, ctx: ShutdownContext) -> Result<(), ShutdownError> {
        let action = self.action;
        let start = Instant::now();
        tracing::info!(hook = %label, "Closing");

        let outcome = AssertUnwindSafe(async move { action(ctx).await })
            .catch_unwind()
            .await;
        let duration = start.elapsed();
        let duration_ms = duration.as_millis() as u64;

        let result = match outcome {
            Ok(Ok(())) => {
                tracing::info!(hook = %label, duration_ms, "Closed successfully");
                Ok(())
            }
            Ok(Err(err)) => {
                tracing::error!(hook = %label, duration_ms, error = %err, "Failed to close");
                Err(ShutdownError::hook_failed(label, err))
            }
            Err(payload) => {
                let payload = panic_message(payload.as_ref());
                tracing::error!(hook = %label, duration_ms, payload = %payload, "Panic in shutdown hook");
                Err(ShutdownError::HookPanicked {
                    hook: label.to_string(),
                    payload,
                })
            }
        };

        metrics::record_hook(label, outcome_label(&result), duration);
        result
    }
}

impl std::fmt::Debug for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hook").field("name", &self.name).finish_non_exhaustive()
    }
}

fn outcome_label(result: &Result<(), ShutdownError>) -> &'static str {
    match result {
        Ok(()) => "closed",
        Err(err) => err.kind(),
    }
}

/// Extract a printable message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
