//! Error types surfaced by configuration lookups.

use std::path::PathBuf;

use thiserror::Error;

use crate::document::DocumentError;
use crate::suite::BuildError;
use crate::substitution::SubstitutionError;

/// Result alias for lookups and reloads.
pub type Result<T, E = VingrisError> = std::result::Result<T, E>;

/// Everything a lookup can fail with.
///
/// Failures never disturb the cached stores; the next call starts fresh.
#[derive(Debug, Error)]
pub enum VingrisError {
    /// No document at the discovered or declared location.
    #[error("configuration file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    /// The document exists but could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not well-formed.
    #[error("failed to parse {}: {source}", .path.display())]
    ParseFailure {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },

    /// The document is well-formed but not shaped like a suite.
    #[error("invalid suite structure in {}: {source}", .path.display())]
    Structure {
        path: PathBuf,
        #[source]
        source: BuildError,
    },

    #[error("application '{application}' not found in {}", .path.display())]
    ApplicationNotFound { application: String, path: PathBuf },

    /// The name belongs to a suite-level `<property>`, not an application.
    #[error(
        "'{application}' in {} is a <property>, not an <application>; check for a property sharing the application's name",
        .path.display()
    )]
    ApplicationTypeConflict { application: String, path: PathBuf },

    #[error("property '{property}' not found in application '{application}' in {}", .path.display())]
    PropertyNotFound {
        application: String,
        property: String,
        path: PathBuf,
    },

    /// A value could not be expanded.
    #[error("property '{property}' of application '{application}' in {}: {source}", .path.display())]
    Substitution {
        application: String,
        property: String,
        path: PathBuf,
        #[source]
        source: SubstitutionError,
    },

    /// The override document an application declares does not exist.
    #[error("override file for application '{application}' not found: {}", .path.display())]
    OverrideFileNotFound { application: String, path: PathBuf },
}

/// Flat classification of [`VingrisError`], nested causes included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    FileNotFound,
    Io,
    ParseFailure,
    MalformedApplication,
    MalformedProperty,
    StructuralOrderViolation,
    UnexpectedElement,
    ApplicationNotFound,
    ApplicationTypeConflict,
    PropertyNotFound,
    UndefinedVariable,
    MalformedSubstitution,
    OverrideFileNotFound,
}

impl VingrisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VingrisError::FileNotFound { .. } => ErrorKind::FileNotFound,
            VingrisError::Io { .. } => ErrorKind::Io,
            VingrisError::ParseFailure { .. } => ErrorKind::ParseFailure,
            VingrisError::Structure { source, .. } => match source {
                BuildError::MalformedApplication { .. } => ErrorKind::MalformedApplication,
                BuildError::MalformedProperty { .. } => ErrorKind::MalformedProperty,
                BuildError::StructuralOrderViolation { .. } => ErrorKind::StructuralOrderViolation,
                BuildError::UnexpectedElement(_) => ErrorKind::UnexpectedElement,
            },
            VingrisError::ApplicationNotFound { .. } => ErrorKind::ApplicationNotFound,
            VingrisError::ApplicationTypeConflict { .. } => ErrorKind::ApplicationTypeConflict,
            VingrisError::PropertyNotFound { .. } => ErrorKind::PropertyNotFound,
            VingrisError::Substitution { source, .. } => match source {
                SubstitutionError::UndefinedVariable(_) => ErrorKind::UndefinedVariable,
                SubstitutionError::MalformedSubstitution { .. } => ErrorKind::MalformedSubstitution,
            },
            VingrisError::OverrideFileNotFound { .. } => ErrorKind::OverrideFileNotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_sees_through_wrappers() {
        let err = VingrisError::Substitution {
            application: "svc".into(),
            property: "url".into(),
            path: PathBuf::from("/etc/VinGris.xml"),
            source: SubstitutionError::UndefinedVariable("HOST".into()),
        };
        assert_eq!(err.kind(), ErrorKind::UndefinedVariable);
        assert_eq!(
            err.to_string(),
            "property 'url' of application 'svc' in /etc/VinGris.xml: undefined environment variable or system property 'HOST'"
        );

        let err = VingrisError::Structure {
            path: PathBuf::from("a.xml"),
            source: BuildError::UnexpectedElement("x".into()),
        };
        assert_eq!(err.kind(), ErrorKind::UnexpectedElement);
    }
}
