//! Settings validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject empty names and file names carrying directories
//! - Check that the log filter parses
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: ServiceConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::ServiceConfig;

/// A single semantic problem in the settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("discovery.base_filename must be a bare file name, got '{0}'")]
    BaseFilenameHasDirectory(String),

    #[error("logging.filter is invalid: {0}")]
    InvalidFilter(String),
}

/// Validate settings before they are handed to a service.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let required = [
        ("discovery.location_variable", &config.discovery.location_variable),
        ("discovery.base_filename", &config.discovery.base_filename),
        ("discovery.legacy_subdirectory", &config.discovery.legacy_subdirectory),
        ("document.override_property", &config.document.override_property),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            errors.push(ValidationError::Empty(field));
        }
    }

    let filename = &config.discovery.base_filename;
    if filename.contains(['/', '\\']) {
        errors.push(ValidationError::BaseFilenameHasDirectory(filename.clone()));
    }

    if let Err(e) = EnvFilter::try_new(&config.logging.filter) {
        errors.push(ValidationError::InvalidFilter(e.to_string()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
