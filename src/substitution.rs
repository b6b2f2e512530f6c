//! `@@NAME@@` variable substitution.
//!
//! # Responsibilities
//! - Expand substitution tokens inside property values
//! - Resolve names against the environment, then the system property table
//!
//! # Design Decisions
//! - Resolved values are never re-scanned, so a value cannot smuggle in
//!   further tokens
//! - Pure function over its inputs; safe to call from any thread

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

/// Opening and closing delimiter of a substitution token.
pub const DELIMITER: &str = "@@";

/// Substitution failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubstitutionError {
    /// The token names neither an environment variable nor a system property.
    #[error("undefined environment variable or system property '{0}'")]
    UndefinedVariable(String),

    /// An opening delimiter without a closing one.
    #[error("unterminated substitution token starting at byte {position}")]
    MalformedSubstitution { position: usize },
}

/// Somewhere to look up variable values.
pub trait VariableSource {
    fn lookup(&self, name: &str) -> Option<String>;
}

impl VariableSource for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Process-level system properties, consulted after the environment.
///
/// Cloning shares the same table.
#[derive(Debug, Clone, Default)]
pub struct SystemProperties {
    inner: Arc<DashMap<String, String>>,
}

impl SystemProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, returning the previous value.
    pub fn set(&self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.inner.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.inner.get(name).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, name: &str) -> Option<String> {
        self.inner.remove(name).map(|(_, value)| value)
    }
}

impl VariableSource for SystemProperties {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name)
    }
}

/// Environment variables first, then system properties.
pub struct ProcessVariables<'a> {
    properties: &'a SystemProperties,
}

impl<'a> ProcessVariables<'a> {
    pub fn new(properties: &'a SystemProperties) -> Self {
        Self { properties }
    }
}

impl VariableSource for ProcessVariables<'_> {
    fn lookup(&self, name: &str) -> Option<String> {
        // names the platform cannot hold in its environment
        let env_safe = !name.is_empty() && !name.contains(['=', '\0']);
        env_safe
            .then(|| std::env::var(name).ok())
            .flatten()
            .or_else(|| self.properties.get(name))
    }
}

/// Replace every `@@NAME@@` token in `input`.
pub fn expand<V>(input: &str, variables: &V) -> Result<String, SubstitutionError>
where
    V: VariableSource + ?Sized,
{
    let mut output = String::with_capacity(input.len());
    let mut rest = input;
    let mut offset = 0;

    while let Some(open) = rest.find(DELIMITER) {
        let name_start = open + DELIMITER.len();
        let close = rest[name_start..]
            .find(DELIMITER)
            .ok_or(SubstitutionError::MalformedSubstitution {
                position: offset + open,
            })?;
        let name = &rest[name_start..name_start + close];
        let value = variables
            .lookup(name)
            .ok_or_else(|| SubstitutionError::UndefinedVariable(name.to_string()))?;

        output.push_str(&rest[..open]);
        output.push_str(&value);

        let consumed = name_start + close + DELIMITER.len();
        rest = &rest[consumed..];
        offset += consumed;
    }

    output.push_str(rest);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_expand_single_token() {
        let vars = vars(&[("HOME", "/x")]);
        assert_eq!(expand("prefix-@@HOME@@-suffix", &vars).unwrap(), "prefix-/x-suffix");
    }

    #[test]
    fn test_expand_multiple_and_adjacent_tokens() {
        let vars = vars(&[("A", "1"), ("B", "2")]);
        assert_eq!(expand("@@A@@@@B@@/@@A@@", &vars).unwrap(), "12/1");
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(expand("no tokens here", &vars(&[])).unwrap(), "no tokens here");
        assert_eq!(expand("", &vars(&[])).unwrap(), "");
    }

    #[test]
    fn test_undefined_variable() {
        assert_eq!(
            expand("x-@@NOPE@@", &vars(&[])).unwrap_err(),
            SubstitutionError::UndefinedVariable("NOPE".into())
        );
    }

    #[test]
    fn test_unterminated_token() {
        assert_eq!(
            expand("ok @@OPEN", &vars(&[("OPEN", "v")])).unwrap_err(),
            SubstitutionError::MalformedSubstitution { position: 3 }
        );
    }

    #[test]
    fn test_resolved_values_are_not_rescanned() {
        let vars = vars(&[("OUTER", "@@INNER@@"), ("INNER", "leak")]);
        assert_eq!(expand("[@@OUTER@@]", &vars).unwrap(), "[@@INNER@@]");
    }

    #[test]
    fn test_environment_before_system_properties() {
        let properties = SystemProperties::new();
        properties.set("PATH", "from-properties");
        properties.set("vingris.test.only", "from-properties");

        let process = ProcessVariables::new(&properties);
        assert_eq!(process.lookup("PATH"), std::env::var("PATH").ok());
        assert_eq!(process.lookup("vingris.test.only").as_deref(), Some("from-properties"));
        assert_eq!(process.lookup("a=b"), None);
    }

    #[test]
    fn test_system_properties_are_shared_between_clones() {
        let properties = SystemProperties::new();
        let clone = properties.clone();
        clone.set("k", "v");
        assert_eq!(properties.get("k").as_deref(), Some("v"));
        assert_eq!(properties.remove("k").as_deref(), Some("v"));
        assert_eq!(clone.get("k"), None);
    }
}
