//! graceful-closer
//!
//! Runs until a termination request, then closes every registered resource
//! concurrently under the configured grace period.
//!
//! # Lifecycle
//!
//! ```text
//!   config.toml ──▶ AppConfig ──▶ logging ──▶ App (coordinator + signal watcher)
//!                                                  │
//!        SIGINT / SIGTERM ─────────────────────────┤
//!        component crash ──────────────────────────┤
//!                                                  ▼
//!                                 shutdown run: hooks in parallel, one deadline
//!                                                  │
//!                                                  ▼
//!                                        outcome ──▶ exit code
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use graceful_closer::config::loader::load_or_default;
use graceful_closer::observability::{logging, metrics};
use graceful_closer::lifecycle::HookError;
use graceful_closer::{App, AppError};

#[derive(Parser)]
#[command(name = "graceful-closer", version)]
#[command(about = "Closes registered resources gracefully on termination", long_about = None)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long = "config-path", env = "CONFIG_PATH")]
    config_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("graceful-closer failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = load_or_default(cli.config_path.as_deref())?;
    let sink = logging::init_logging(&config.logger)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        signals = ?config.shutdown.signals,
        signal_grace_ms = config.shutdown.signal_grace_ms,
        "graceful-closer starting"
    );

    if config.observability.metrics_enabled {
        if let Err(e) = metrics::init_metrics(config.observability.metrics_address) {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to start metrics endpoint"
            );
        }
    }

    let app = App::new(&config)?;
    app.coordinator().register_named("logger", move |_ctx| async move {
        sink.flush().map_err(HookError::from)
    });

    let result = app.run().await;
    match &result {
        Ok(()) => tracing::info!("Shutdown complete"),
        Err(e) => tracing::error!(error = %e, "Shutdown finished with errors"),
    }
    result
}
