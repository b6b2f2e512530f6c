//! Service settings schema.
//!
//! These settings describe how the service finds and treats its documents;
//! they are not the suite documents themselves. All types derive Serde
//! traits for deserialization from a TOML settings file.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::suite::BuildOptions;

/// Root settings for a [`ConfigService`](crate::ConfigService).
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Where the base document lives.
    pub discovery: DiscoveryConfig,

    /// Staleness probing.
    pub reload: ReloadConfig,

    /// Document interpretation.
    pub document: DocumentConfig,

    /// Log output of the binary.
    pub logging: LoggingConfig,
}

/// Base document discovery.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Variable naming the directory that holds the base document. Looked
    /// up in the environment, then in the system properties.
    pub location_variable: String,

    /// File name of the base document inside that directory.
    pub base_filename: String,

    /// Subdirectory of the working directory used when the configured
    /// location has no document.
    pub legacy_subdirectory: String,

    /// Explicit document path; replaces the location variable.
    pub base_path: Option<PathBuf>,

    /// Directory the legacy subdirectory is resolved against. Defaults to
    /// the process working directory.
    pub working_dir: Option<PathBuf>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            location_variable: "vin.gris".to_string(),
            base_filename: "VinGris.xml".to_string(),
            legacy_subdirectory: "conf".to_string(),
            base_path: None,
            working_dir: None,
        }
    }
}

/// Staleness probe settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReloadConfig {
    /// Minimum time between two modification-time probes (milliseconds).
    pub check_interval_ms: u64,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: 1_000,
        }
    }
}

/// How documents are interpreted.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Reserved property naming an application's override document.
    pub override_property: String,

    /// Reject `<property>` elements placed directly under `<suite>`.
    pub strict_structure: bool,
}

impl DocumentConfig {
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            strict: self.strict_structure,
        }
    }
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            override_property: "vingris-override-file".to_string(),
            strict_structure: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,

    /// `tracing` filter directive, overridden by `RUST_LOG`.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            filter: "vingris=info".to_string(),
        }
    }
}
