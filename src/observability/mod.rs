//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown run and hooks produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log output (stdout or file)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields (hook, duration_ms, pending) on every shutdown event
//! - The log sink is itself a shutdown hook, flushed on exit
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
