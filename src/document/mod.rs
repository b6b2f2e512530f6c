//! Structured document trees.
//!
//! # Data Flow
//! ```text
//! document on disk (XML or TOML)
//!     → xml.rs / toml_doc.rs (format adapter)
//!     → Node tree (tag, ordered attributes, children)
//!     → suite::builder walks the tree
//! ```
//!
//! # Design Decisions
//! - The tree is format-neutral; the builder never sees parser events
//! - Attribute order is preserved so positional attributes keep their meaning
//! - Format is chosen from the file extension, XML being the default

pub mod toml_doc;
pub mod xml;

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::error::{Result, VingrisError};

/// Tag of the document root.
pub const SUITE_TAG: &str = "suite";
/// Tag of an application scope.
pub const APPLICATION_TAG: &str = "application";
/// Tag of a single key/value property.
pub const PROPERTY_TAG: &str = "property";

/// Errors reported by the format adapters.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The XML reader rejected the input.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// An XML attribute could not be read.
    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    /// The TOML parser rejected the input.
    #[error("TOML error: {0}")]
    Toml(#[from] ::toml::de::Error),

    /// Well-formed syntax that still cannot be turned into a tree.
    #[error("malformed document: {0}")]
    Malformed(String),
}

/// Concrete syntax of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Xml,
    Toml,
}

impl DocumentFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => DocumentFormat::Toml,
            _ => DocumentFormat::Xml,
        }
    }
}

/// One element of a parsed document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    pub tag: String,
    /// Attributes in document order.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Value of the first attribute called `name`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Parse document text in the given format.
pub fn parse(content: &str, format: DocumentFormat) -> std::result::Result<Node, DocumentError> {
    match format {
        DocumentFormat::Xml => xml::parse(content),
        DocumentFormat::Toml => toml_doc::parse(content),
    }
}

/// Read and parse the document at `path`.
pub fn read_document(path: &Path) -> Result<Node> {
    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            VingrisError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            VingrisError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    parse(&content, DocumentFormat::from_path(path)).map_err(|source| VingrisError::ParseFailure {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_path(Path::new("VinGris.xml")), DocumentFormat::Xml);
        assert_eq!(DocumentFormat::from_path(Path::new("suite.TOML")), DocumentFormat::Toml);
        assert_eq!(DocumentFormat::from_path(Path::new("no-extension")), DocumentFormat::Xml);
    }

    #[test]
    fn test_read_missing_document() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_document(&dir.path().join("absent.xml")).unwrap_err();
        assert!(matches!(err, VingrisError::FileNotFound { .. }));
    }

    #[test]
    fn test_read_reports_parse_failure_with_path() {
        let mut file = tempfile::Builder::new().suffix(".xml").tempfile().unwrap();
        file.write_all(b"<suite><application name=\"a\"></suite>").unwrap();

        let err = read_document(file.path()).unwrap_err();
        match err {
            VingrisError::ParseFailure { path, .. } => assert_eq!(path, file.path()),
            other => panic!("unexpected error: {other}"),
        }
    }
}
