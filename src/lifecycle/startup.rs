//! Process orchestration.
//!
//! # Responsibilities
//! - Build the shutdown coordinator from configuration
//! - Run long-lived components and watch them for crashes
//! - Turn the first termination request or crash into one graceful shutdown
//!
//! # Design Decisions
//! - A crashing component is an internal shutdown trigger, not a panic
//! - Internally triggered runs get their own grace period
//! - The shutdown outcome is the process outcome

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::loader::ConfigError;
use crate::config::AppConfig;
use crate::lifecycle::context::ShutdownContext;
use crate::lifecycle::error::{HookError, ShutdownError};
use crate::lifecycle::shutdown::ShutdownCoordinator;
use crate::observability::logging::LoggingError;

/// Errors surfaced by the process runner.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to initialize logging: {0}")]
    Logging(#[from] LoggingError),

    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] std::io::Error),

    #[error("component {component} crashed: {source}")]
    Component {
        component: String,
        source: HookError,
    },

    #[error("graceful shutdown failed: {0}")]
    Shutdown(#[from] ShutdownError),
}

struct Crash {
    component: String,
    error: HookError,
}

/// Runs components until a termination request or a crash, then shuts down.
pub struct App {
    coordinator: ShutdownCoordinator,
    failure_grace: Duration,
    crash_tx: mpsc::UnboundedSender<Crash>,
    crash_rx: mpsc::UnboundedReceiver<Crash>,
}

impl App {
    /// Build the app and start its signal watcher.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        let coordinator =
            ShutdownCoordinator::from_config(&config.shutdown).map_err(AppError::Signals)?;
        Ok(Self::with_coordinator(coordinator, config.shutdown.failure_grace()))
    }

    /// Build the app around an existing coordinator.
    pub fn with_coordinator(coordinator: ShutdownCoordinator, failure_grace: Duration) -> Self {
        let (crash_tx, crash_rx) = mpsc::unbounded_channel();
        Self {
            coordinator,
            failure_grace,
            crash_tx,
            crash_rx,
        }
    }

    /// Handle for resource owners to register their hooks.
    pub fn coordinator(&self) -> &ShutdownCoordinator {
        &self.coordinator
    }

    /// Start a long-lived component. An `Err` return triggers shutdown.
    pub fn spawn_component<F>(&self, name: impl Into<String>, component: F)
    where
        F: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        let name = name.into();
        let crash_tx = self.crash_tx.clone();

        tokio::spawn(async move {
            tracing::info!(component = %name, "Component running");
            match component.await {
                Ok(()) => tracing::info!(component = %name, "Component finished"),
                Err(error) => {
                    let _ = crash_tx.send(Crash {
                        component: name,
                        error,
                    });
                }
            }
        });
    }

    /// Wait for the first shutdown trigger and return the shutdown outcome.
    pub async fn run(mut self) -> Result<(), AppError> {
        let completion = self.coordinator.completion();

        tokio::select! {
            _ = completion.wait() => {
                tracing::info!("Shutdown signal received");
                let ctx = ShutdownContext::with_timeout(self.failure_grace);
                self.coordinator.shutdown(ctx).await?;
                Ok(())
            }
            Some(crash) = self.crash_rx.recv() => {
                tracing::error!(component = %crash.component, error = %crash.error, "Component crashed, shutting down");
                let ctx = ShutdownContext::with_timeout(self.failure_grace);
                if let Err(e) = self.coordinator.shutdown(ctx).await {
                    tracing::error!(error = %e, "Error during shutdown");
                    return Err(e.into());
                }
                Err(AppError::Component {
                    component: crash.component,
                    source: crash.error,
                })
            }
        }
    }
}
