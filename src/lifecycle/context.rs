//! Bounded shutdown context.
//!
//! A [`ShutdownContext`] carries the time budget of a shutdown run. The
//! coordinator races its hooks against it, and every hook receives a clone so
//! it can stop early once the budget is gone.
//!
//! # Design Decisions
//! - Cancellation is shared by all clones (one `CancellationToken`)
//! - The deadline is a plain instant, checked lazily; no timer task is spawned
//! - Derived contexts never outlive their parent

use std::time::Duration;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::lifecycle::error::ContextError;

/// Cancellation and deadline carrier handed to the coordinator and its hooks.
#[derive(Debug, Clone)]
pub struct ShutdownContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl ShutdownContext {
    /// A context without deadline. It only ends when canceled.
    pub fn background() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// A context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A context that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// Derive a context expiring after `timeout` or at the parent's deadline,
    /// whichever comes first. Canceling the parent cancels the child.
    pub fn child(&self, timeout: Duration) -> Self {
        let own = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(parent) => parent.min(own),
            None => own,
        };

        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Cancel this context and every clone of it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` for contexts without one.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Non-blocking check. `None` while the context is still live.
    pub fn err(&self) -> Option<ContextError> {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Some(ContextError::DeadlineExceeded);
            }
        }
        if self.token.is_cancelled() {
            return Some(ContextError::Canceled);
        }
        None
    }

    /// Resolves once the context is canceled or its deadline passes.
    pub async fn done(&self) -> ContextError {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => ContextError::Canceled,
                    _ = time::sleep_until(deadline) => ContextError::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                ContextError::Canceled
            }
        }
    }
}
