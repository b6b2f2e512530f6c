//! TOML adapter.
//!
//! The document table is the implicit `suite` root. Scalars become
//! attributes, tables and arrays of tables become children tagged with
//! their key:
//!
//! ```toml
//! [[application]]
//! name = "svc"
//!
//! [[application.property]]
//! key = "url"
//! value = "http://@@HOST@@/api"
//! ```

use toml::{Table, Value};

use super::{DocumentError, Node, SUITE_TAG};

/// Parse a TOML document into a [`Node`] tree rooted at `suite`.
pub fn parse(content: &str) -> Result<Node, DocumentError> {
    let table: Table = toml::from_str(content)?;
    convert(SUITE_TAG, &table)
}

fn convert(tag: &str, table: &Table) -> Result<Node, DocumentError> {
    let mut node = Node::new(tag);

    for (key, value) in table {
        match value {
            Value::Table(child) => node.children.push(convert(key, child)?),
            Value::Array(items) => {
                for item in items {
                    let Value::Table(child) = item else {
                        return Err(DocumentError::Malformed(format!(
                            "array `{key}` under <{tag}> may only hold tables"
                        )));
                    };
                    node.children.push(convert(key, child)?);
                }
            }
            Value::String(text) => node.attributes.push((key.clone(), text.clone())),
            scalar => node.attributes.push((key.clone(), scalar.to_string())),
        }
    }

    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_attribute_order() {
        let root = parse(
            r#"
            [[application]]
            name = "svc"

            [[application.property]]
            key = "timeout"
            value = 30

            [[application.property]]
            value = "later"
            key = "reordered"
            "#,
        )
        .unwrap();

        assert_eq!(root.tag, "suite");
        let app = &root.children[0];
        assert_eq!(app.tag, "application");
        assert_eq!(app.attributes, vec![("name".to_string(), "svc".to_string())]);
        assert_eq!(app.children.len(), 2);
        assert_eq!(app.children[0].attribute("value"), Some("30"));
        assert_eq!(app.children[1].attributes[0].0, "value");
    }

    #[test]
    fn test_root_level_property_becomes_suite_child() {
        let root = parse("[[property]]\nkey = \"k\"\nvalue = \"v\"\n").unwrap();
        assert_eq!(root.children[0].tag, "property");
    }

    #[test]
    fn test_rejects_scalar_arrays() {
        let err = parse("application = [1, 2]").unwrap_err();
        assert!(matches!(err, DocumentError::Malformed(_)));
    }

    #[test]
    fn test_syntax_error() {
        assert!(matches!(parse("[[application"), Err(DocumentError::Toml(_))));
    }
}
