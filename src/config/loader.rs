//! Settings loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for settings loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate settings from TOML text.
pub fn parse_config(content: &str) -> Result<ServiceConfig, ConfigError> {
    let config: ServiceConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate settings from a TOML file.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;

    #[test]
    fn test_partial_settings_keep_defaults() {
        let config = parse_config(
            r#"
            [reload]
            check_interval_ms = 250

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.reload.check_interval_ms, 250);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.discovery.base_filename, "VinGris.xml");
        assert_eq!(config.document.override_property, "vingris-override-file");
        assert!(config.document.strict_structure);
    }

    #[test]
    fn test_validation_errors_are_reported() {
        let err = parse_config("[discovery]\nbase_filename = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert_eq!(
            err.to_string(),
            "Validation failed: discovery.base_filename must not be empty"
        );
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("settings.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
