//! Base document discovery.
//!
//! # Order
//! 1. `discovery.base_path`, when set
//! 2. `<location variable>/<base filename>`, the variable being looked up in
//!    the environment and then the system properties
//! 3. `<working directory>/<legacy subdirectory>/<base filename>`
//!
//! The service runs discovery once and keeps the result for its lifetime,
//! so a fallback to the legacy directory is permanent.

use std::path::{Path, PathBuf};

use crate::config::schema::DiscoveryConfig;
use crate::error::{Result, VingrisError};
use crate::substitution::VariableSource;

/// The configured primary location, if any.
pub fn configured_path<V>(config: &DiscoveryConfig, variables: &V) -> Option<PathBuf>
where
    V: VariableSource + ?Sized,
{
    if let Some(path) = &config.base_path {
        return Some(path.clone());
    }
    variables
        .lookup(&config.location_variable)
        .map(|dir| Path::new(&dir).join(&config.base_filename))
}

/// The legacy location under `working_dir`.
pub fn legacy_path(config: &DiscoveryConfig, working_dir: &Path) -> PathBuf {
    working_dir
        .join(&config.legacy_subdirectory)
        .join(&config.base_filename)
}

/// Find the base document, falling back to the legacy directory.
///
/// The returned path is absolute.
pub fn locate_base<V>(
    config: &DiscoveryConfig,
    variables: &V,
    working_dir: &Path,
) -> Result<PathBuf>
where
    V: VariableSource + ?Sized,
{
    let configured = configured_path(config, variables);

    if let Some(path) = &configured {
        if path.is_file() {
            return absolute(path);
        }
    }

    let legacy = legacy_path(config, working_dir);
    tracing::warn!(
        configured = ?configured,
        fallback = %legacy.display(),
        "Configuration location not usable, looking in legacy directory"
    );

    if legacy.is_file() {
        absolute(&legacy)
    } else {
        Err(VingrisError::FileNotFound { path: legacy })
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|source| VingrisError::Io {
        path: path.to_path_buf(),
        source,
    })
}
