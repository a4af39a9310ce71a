//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (grace periods > 0)
//! - Check that file logging has somewhere to write
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::{AppConfig, LogMode};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("shutdown.{field} must be greater than zero")]
    ZeroGrace { field: &'static str },

    #[error("shutdown.signals lists {0} more than once")]
    DuplicateSignal(String),

    #[error("logger.{field} must not be empty in file mode")]
    MissingLogTarget { field: &'static str },
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.shutdown.signal_grace_ms == 0 {
        errors.push(ValidationError::ZeroGrace { field: "signal_grace_ms" });
    }
    if config.shutdown.failure_grace_ms == 0 {
        errors.push(ValidationError::ZeroGrace { field: "failure_grace_ms" });
    }

    let mut seen = HashSet::new();
    for signal in &config.shutdown.signals {
        if !seen.insert(*signal) {
            errors.push(ValidationError::DuplicateSignal(signal.to_string()));
        }
    }

    if config.logger.mode == LogMode::File {
        if config.logger.dir.trim().is_empty() {
            errors.push(ValidationError::MissingLogTarget { field: "dir" });
        }
        if config.logger.file_name.trim().is_empty() {
            errors.push(ValidationError::MissingLogTarget { field: "file_name" });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
