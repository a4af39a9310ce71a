//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Build coordinator → Register hooks → Run components
//!
//! Shutdown (shutdown.rs):
//!     First trigger → Snapshot registry → Run hooks concurrently (hook.rs)
//!     → Wait for all hooks or the context deadline (context.rs)
//!     → Publish outcome → Fire completion
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Fresh grace-period context → shutdown()
//! ```
//!
//! # Design Decisions
//! - One run per process: later triggers wait for it and share its outcome
//! - Hooks run concurrently; launch order is reverse registration order
//! - Panics inside hooks are contained and reported as errors
//! - Shutdown has a deadline: unfinished hooks are left behind, not awaited

pub mod context;
pub mod error;
pub mod hook;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use context::ShutdownContext;
pub use error::{ContextError, HookError, ShutdownError};
pub use hook::Hook;
pub use shutdown::{CompletionSignal, ShutdownCoordinator};
pub use signals::TerminationSignal;
pub use startup::{App, AppError};
