//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! service, builder, watcher produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (lookup and reload counters)
//!
//! Consumers:
//!     → stderr (pretty or JSON lines)
//!     → whatever `metrics` recorder the host process installs
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Metrics are cheap and no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
