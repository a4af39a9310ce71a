//! Error definitions for the shutdown subsystem.

use std::sync::Arc;
use thiserror::Error;

/// Error returned by a hook action.
///
/// Collaborators return whatever error their resource produces; it is boxed
/// so unrelated subsystems can share one registration signature.
pub type HookError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a [`ShutdownContext`](crate::lifecycle::ShutdownContext) stopped being live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The context was canceled explicitly.
    #[error("context canceled")]
    Canceled,

    /// The context deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Aggregated outcome of a shutdown run.
///
/// Cloneable so every caller of
/// [`ShutdownCoordinator::shutdown`](crate::lifecycle::ShutdownCoordinator::shutdown)
/// receives the same value.
#[derive(Debug, Clone, Error)]
pub enum ShutdownError {
    /// A hook action returned an error.
    #[error("hook {hook} failed: {source}")]
    HookFailed {
        hook: String,
        source: Arc<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// A hook action panicked; the panic was contained by the hook wrapper.
    #[error("panic recovered in hook {hook}: {payload}")]
    HookPanicked { hook: String, payload: String },

    /// The shutdown context ended before every hook finished.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// The run was torn down before it recorded an outcome, for example
    /// because its runtime shut down mid-flight.
    #[error("shutdown run aborted before completing")]
    RunAborted,
}

impl ShutdownError {
    pub(crate) fn hook_failed(hook: &str, err: HookError) -> Self {
        Self::HookFailed {
            hook: hook.to_string(),
            source: Arc::from(err),
        }
    }

    /// Name of the hook responsible for this error, if any.
    pub fn hook(&self) -> Option<&str> {
        match self {
            Self::HookFailed { hook, .. } | Self::HookPanicked { hook, .. } => Some(hook),
            Self::Context(_) | Self::RunAborted => None,
        }
    }

    /// True when the run stopped waiting because the deadline passed.
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Self::Context(ContextError::DeadlineExceeded))
    }

    /// True when the error comes from a contained panic.
    pub fn is_panic(&self) -> bool {
        matches!(self, Self::HookPanicked { .. })
    }

    /// Short label used for logs and metrics.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::HookFailed { .. } => "failed",
            Self::HookPanicked { .. } => "panicked",
            Self::Context(ContextError::Canceled) => "canceled",
            Self::Context(ContextError::DeadlineExceeded) => "deadline_exceeded",
            Self::RunAborted => "aborted",
        }
    }
}
