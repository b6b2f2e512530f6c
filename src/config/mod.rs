//! Service settings.
//!
//! # Data Flow
//! ```text
//! settings file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → handed to ConfigService at construction
//!
//! While running:
//!     watcher.rs sees a suite document change
//!     → ConfigService::invalidate
//!     → next lookup probes and reloads
//! ```
//!
//! # Design Decisions
//! - Settings are fixed for the lifetime of a service
//! - All fields have defaults so an empty file is valid
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    DiscoveryConfig, DocumentConfig, LogFormat, LoggingConfig, ReloadConfig, ServiceConfig,
};
