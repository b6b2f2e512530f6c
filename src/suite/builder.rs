//! Builds a [`SuiteStore`] from a document tree.
//!
//! # Expected Shape
//! ```text
//! suite
//!   application(name) *
//!     property(key, value) *
//! ```
//!
//! # Design Decisions
//! - Fail fast on the first structural problem
//! - Values are stored raw; substitution happens at lookup time
//! - A later application with the same name replaces the earlier one

use thiserror::Error;

use super::{AppConfig, SuiteEntry, SuiteStore};
use crate::document::{Node, APPLICATION_TAG, PROPERTY_TAG, SUITE_TAG};

/// Structural problems found while walking a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// `<application>` without exactly one naming attribute.
    #[error("<application> must carry exactly one attribute naming it, found {found}")]
    MalformedApplication { found: usize },

    /// `<property>` without exactly a key and a value.
    #[error("<property> must carry exactly two attributes (key, value), found {found}")]
    MalformedProperty { found: usize },

    /// An element appears where the suite shape does not allow it.
    #[error("<{element}> {reason}")]
    StructuralOrderViolation {
        element: String,
        reason: &'static str,
    },

    /// An element outside the suite vocabulary.
    #[error("unexpected element <{0}>")]
    UnexpectedElement(String),
}

/// Builder switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Reject `<property>` directly under `<suite>`. When off, such
    /// properties are kept as suite-level entries.
    pub strict: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { strict: true }
    }
}

/// Walk `root` and build a new store.
pub fn build_suite(root: &Node, options: BuildOptions) -> Result<SuiteStore, BuildError> {
    match root.tag.as_str() {
        SUITE_TAG => {}
        APPLICATION_TAG | PROPERTY_TAG => {
            return Err(violation(&root.tag, "appears outside of a <suite>"));
        }
        other => return Err(BuildError::UnexpectedElement(other.to_string())),
    }

    let mut store = SuiteStore::default();

    for child in &root.children {
        match child.tag.as_str() {
            APPLICATION_TAG => {
                let (name, app) = build_application(child)?;
                if store.insert(name.clone(), SuiteEntry::Application(app)).is_some() {
                    tracing::warn!(application = %name, "Duplicate entry, later definition wins");
                }
            }
            PROPERTY_TAG if options.strict => {
                return Err(violation(PROPERTY_TAG, "appears before any <application> scope"));
            }
            PROPERTY_TAG => {
                let (key, value) = build_property(child)?;
                tracing::debug!(property = %key, "Keeping suite-level property");
                store.insert(key, SuiteEntry::Property(value));
            }
            SUITE_TAG => return Err(violation(SUITE_TAG, "is nested inside another <suite>")),
            other => return Err(BuildError::UnexpectedElement(other.to_string())),
        }
    }

    Ok(store)
}

fn build_application(node: &Node) -> Result<(String, AppConfig), BuildError> {
    let [(_, name)] = node.attributes.as_slice() else {
        return Err(BuildError::MalformedApplication {
            found: node.attributes.len(),
        });
    };

    let mut app = AppConfig::default();
    for child in &node.children {
        match child.tag.as_str() {
            PROPERTY_TAG => {
                let (key, value) = build_property(child)?;
                app.insert(key, value);
            }
            APPLICATION_TAG | SUITE_TAG => {
                return Err(violation(&child.tag, "is nested inside an <application>"));
            }
            other => return Err(BuildError::UnexpectedElement(other.to_string())),
        }
    }

    Ok((name.clone(), app))
}

fn build_property(node: &Node) -> Result<(String, String), BuildError> {
    if node.attributes.len() != 2 {
        return Err(BuildError::MalformedProperty {
            found: node.attributes.len(),
        });
    }
    if let Some(child) = node.children.first() {
        return match child.tag.as_str() {
            SUITE_TAG | APPLICATION_TAG | PROPERTY_TAG => {
                Err(violation(&child.tag, "is nested inside a <property>"))
            }
            other => Err(BuildError::UnexpectedElement(other.to_string())),
        };
    }

    // Named attributes win; otherwise the first is the key, the second the value.
    let position = |name: &str| node.attributes.iter().position(|(attr, _)| attr == name);
    let key_at = position("key").or_else(|| position("name"));
    let (key_at, value_at) = match (key_at, position("value")) {
        (Some(key), Some(value)) => (key, value),
        (Some(key), None) => (key, 1 - key),
        (None, Some(value)) => (1 - value, value),
        (None, None) => (0, 1),
    };

    Ok((
        node.attributes[key_at].1.clone(),
        node.attributes[value_at].1.clone(),
    ))
}

fn violation(element: &str, reason: &'static str) -> BuildError {
    BuildError::StructuralOrderViolation {
        element: element.to_string(),
        reason,
    }
}
