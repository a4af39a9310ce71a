//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Route output to stdout or to a log file
//! - Expose the sink so shutdown can flush it
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Log level from config, `RUST_LOG` overrides it
//! - File output is unbuffered; flushing syncs it to disk

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogMode, LoggerConfig};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to prepare log file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("global subscriber already set: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Where log records end up.
#[derive(Debug, Clone)]
pub enum LogSink {
    Stdout,
    File(Arc<File>),
}

impl LogSink {
    /// Push buffered output to its destination.
    pub fn flush(&self) -> io::Result<()> {
        match self {
            LogSink::Stdout => io::stdout().flush(),
            LogSink::File(file) => file.sync_all(),
        }
    }
}

/// Map a configured level name to a filter. Unknown names mean `info`.
pub fn parse_level(level: &str) -> LevelFilter {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" | "warning" => LevelFilter::WARN,
        // tracing has no fatal level
        "error" | "fatal" => LevelFilter::ERROR,
        "off" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

/// Open the configured log destination, creating the log directory if needed.
pub fn open_sink(config: &LoggerConfig) -> Result<LogSink, LoggingError> {
    match config.mode {
        LogMode::Stdout => Ok(LogSink::Stdout),
        LogMode::File => {
            let dir = Path::new(&config.dir);
            let path = dir.join(&config.file_name);
            let file_error = |source| LoggingError::File {
                path: path.clone(),
                source,
            };

            fs::create_dir_all(dir).map_err(file_error)?;

            let mut options = OpenOptions::new();
            options.create(true);
            if config.rewrite {
                options.write(true).truncate(true);
            } else {
                options.append(true);
            }
            let file = options.open(&path).map_err(file_error)?;

            Ok(LogSink::File(Arc::new(file)))
        }
    }
}

/// Install the global subscriber and return the sink it writes to.
pub fn init_logging(config: &LoggerConfig) -> Result<LogSink, LoggingError> {
    let level = parse_level(&config.level);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let sink = open_sink(config)?;
    match &sink {
        LogSink::Stdout => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .try_init()?;
        }
        LogSink::File(file) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Arc::clone(file)),
                )
                .try_init()?;
        }
    }

    Ok(sink)
}
