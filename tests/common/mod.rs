//! Shared helpers for suite document tests.
#![allow(dead_code)]

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use tempfile::TempDir;
use vingris::{ConfigService, ServiceConfig, SystemProperties};

/// A scratch directory whose writes always move the modification time forward.
pub struct Fixture {
    pub dir: TempDir,
    generation: AtomicU64,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            generation: AtomicU64::new(1),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Atomically replace `name` with `content`, giving it a fresh mtime.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let target = self.path(name);
        let staging = self.path(&format!(".{name}.staging"));
        fs::write(&staging, content).unwrap();

        let generation = self.generation.fetch_add(1, Ordering::SeqCst);
        set_mtime(&staging, SystemTime::now() + Duration::from_secs(generation * 10));
        fs::rename(&staging, &target).unwrap();
        target
    }
}

pub fn set_mtime(path: &Path, time: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

/// XML suite document from `(application, [(key, value)])` pairs.
pub fn suite_xml(apps: &[(&str, Vec<(&str, &str)>)]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<suite>\n");
    for (name, props) in apps {
        xml.push_str(&format!("  <application name=\"{name}\">\n"));
        for (key, value) in props {
            xml.push_str(&format!("    <property key=\"{key}\" value=\"{value}\"/>\n"));
        }
        xml.push_str("  </application>\n");
    }
    xml.push_str("</suite>\n");
    xml
}

pub fn settings_for(base: &Path, check_interval_ms: u64) -> ServiceConfig {
    let mut settings = ServiceConfig::default();
    settings.discovery.base_path = Some(base.to_path_buf());
    settings.reload.check_interval_ms = check_interval_ms;
    settings
}

pub fn service_for(base: &Path, check_interval_ms: u64) -> ConfigService {
    ConfigService::with_properties(settings_for(base, check_interval_ms), SystemProperties::new())
}
