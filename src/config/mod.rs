//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → passed by reference to the logger, metrics and coordinator
//! ```
//!
//! # Design Decisions
//! - Config is an explicit value built once at startup, never global state
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::AppConfig;
pub use schema::LogMode;
pub use schema::LoggerConfig;
pub use schema::ObservabilityConfig;
pub use schema::ShutdownConfig;
