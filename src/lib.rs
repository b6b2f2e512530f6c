//! VinGris: hierarchical configuration suites with live reload.
//!
//! A suite document holds named applications, each with key/value
//! properties. [`ConfigService`] serves lookups from it, layering an optional
//! per-application override document on top, expanding `@@NAME@@` tokens at
//! lookup time and reparsing either document when it changes on disk.

pub mod config;
pub mod document;
pub mod error;
pub mod observability;
pub mod service;
pub mod substitution;
pub mod suite;

pub use config::ServiceConfig;
pub use error::{ErrorKind, Result, VingrisError};
pub use service::ConfigService;
pub use substitution::{expand, SystemProperties};
