//! Immutable suite stores.
//!
//! A [`SuiteStore`] maps application names to their [`AppConfig`]. Stores are
//! built once by [`builder::build_suite`] and never mutated afterwards; a
//! reload produces a brand-new store.

pub mod builder;

use std::collections::{BTreeMap, HashMap};

pub use builder::{build_suite, BuildError, BuildOptions};

/// Properties of one application scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    properties: BTreeMap<String, String>,
}

impl AppConfig {
    /// Raw (unsubstituted) value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    fn insert(&mut self, key: String, value: String) -> Option<String> {
        self.properties.insert(key, value)
    }
}

/// A top-level entry of a suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuiteEntry {
    Application(AppConfig),
    /// A `<property>` placed directly under `<suite>`; only produced by the
    /// lenient builder.
    Property(String),
}

/// All application scopes parsed from one document.
#[derive(Debug, Clone, Default)]
pub struct SuiteStore {
    entries: HashMap<String, SuiteEntry>,
}

impl SuiteStore {
    pub fn entry(&self, name: &str) -> Option<&SuiteEntry> {
        self.entries.get(name)
    }

    /// The application called `name`, if that name is an application.
    pub fn application(&self, name: &str) -> Option<&AppConfig> {
        match self.entries.get(name) {
            Some(SuiteEntry::Application(app)) => Some(app),
            _ => None,
        }
    }

    pub fn application_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|(name, entry)| match entry {
            SuiteEntry::Application(_) => Some(name.as_str()),
            SuiteEntry::Property(_) => None,
        })
    }

    /// Number of top-level entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, name: String, entry: SuiteEntry) -> Option<SuiteEntry> {
        self.entries.insert(name, entry)
    }
}
