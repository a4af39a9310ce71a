//! Graceful shutdown coordination for long-running services.
//!
//! Resource owners register cleanup hooks with a [`ShutdownCoordinator`];
//! the first termination signal or internal failure runs them all
//! concurrently under one time budget and reports a single outcome.

pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use lifecycle::{
    App, AppError, CompletionSignal, ShutdownContext, ShutdownCoordinator, ShutdownError,
};
