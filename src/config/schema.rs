//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the process.
//! All types derive Serde traits for deserialization from config files.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::lifecycle::signals::TerminationSignal;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Log sink settings.
    pub logger: LoggerConfig,

    /// Graceful shutdown settings.
    pub shutdown: ShutdownConfig,

    /// Metrics settings.
    pub observability: ObservabilityConfig,
}

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogMode {
    #[default]
    Stdout,
    File,
}

/// Logger configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Log level (trace, debug, info, warn, error, fatal), case-insensitive.
    pub level: String,

    /// Output mode.
    pub mode: LogMode,

    /// Directory for the log file in file mode.
    pub dir: String,

    /// Log file name in file mode.
    pub file_name: String,

    /// Truncate an existing log file on startup instead of appending.
    pub rewrite: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            mode: LogMode::Stdout,
            dir: "logs".to_string(),
            file_name: "graceful-closer.log".to_string(),
            rewrite: false,
        }
    }
}

/// Graceful shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// OS signals that start a graceful shutdown.
    pub signals: Vec<TerminationSignal>,

    /// Budget for shutdowns started by a signal, in milliseconds.
    pub signal_grace_ms: u64,

    /// Budget for shutdowns started by a crashed component, in milliseconds.
    pub failure_grace_ms: u64,
}

impl ShutdownConfig {
    pub fn signal_grace(&self) -> Duration {
        Duration::from_millis(self.signal_grace_ms)
    }

    pub fn failure_grace(&self) -> Duration {
        Duration::from_millis(self.failure_grace_ms)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            signals: vec![TerminationSignal::Interrupt, TerminationSignal::Terminate],
            signal_grace_ms: 5000,
            failure_grace_ms: 2000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address, parsed when the file is read.
    pub metrics_address: SocketAddr,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: SocketAddr::from((Ipv4Addr::LOCALHOST, 9090)),
        }
    }
}
