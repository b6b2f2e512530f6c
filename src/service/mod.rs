//! Reloading configuration service.
//!
//! # Data Flow
//! ```text
//! get_property(app, key)
//!     → refresh: rate-limited modification-time probe
//!     → (stale) reload base, then the app's override, under the reload lock
//!     → publish a new Snapshot via ArcSwap
//!     → precedence lookup: override scope, then base scope
//!     → substitution against environment / system properties
//! ```
//!
//! # Design Decisions
//! - Readers load the current snapshot without locking; only reloads lock
//! - A snapshot is never mutated, reloads build a new one and swap it in
//! - At most one probe per check interval, unless invalidated or the
//!   requesting application declares an override not loaded yet
//! - Override failures only surface for applications the override concerns
//! - A failed reload leaves the last good snapshot in service

pub mod discovery;

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Instant, SystemTime};

use arc_swap::ArcSwapOption;

use crate::config::ServiceConfig;
use crate::document;
use crate::error::{Result, VingrisError};
use crate::observability::metrics;
use crate::substitution::{expand, ProcessVariables, SystemProperties};
use crate::suite::{build_suite, AppConfig, SuiteEntry, SuiteStore};

/// One parsed document and where it came from.
#[derive(Debug)]
pub struct LoadedDocument {
    pub path: PathBuf,
    pub store: SuiteStore,
}

/// The stores readers see. Replaced wholesale on reload.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub base: Arc<LoadedDocument>,
    pub overlay: Option<Arc<LoadedDocument>>,
    /// Raw declaration `overlay` was resolved from.
    pub overlay_declaration: Option<String>,
}

impl Snapshot {
    /// Raw value of `property` and the document it came from.
    ///
    /// A non-empty override scope holding the key wins; anything else falls
    /// through to the base scope.
    pub fn resolve(&self, application: &str, property: &str) -> Result<(&str, &Path)> {
        let base = self.base_application(application)?;

        let overridden = self
            .override_application(application)
            .and_then(|app| app.get(property));
        if let Some(value) = overridden {
            let path = self
                .overlay
                .as_ref()
                .map_or(self.base.path.as_path(), |o| o.path.as_path());
            return Ok((value, path));
        }

        base.get(property)
            .map(|value| (value, self.base.path.as_path()))
            .ok_or_else(|| VingrisError::PropertyNotFound {
                application: application.to_string(),
                property: property.to_string(),
                path: self.base.path.clone(),
            })
    }

    /// Every key visible to `application`, override keys included.
    pub fn keys(&self, application: &str) -> Result<Vec<String>> {
        let base = self.base_application(application)?;
        let mut keys: Vec<String> = base.keys().map(str::to_string).collect();
        if let Some(overlay) = self.override_application(application) {
            keys.extend(overlay.keys().filter(|k| !base.contains(k)).map(str::to_string));
        }
        keys.sort();
        Ok(keys)
    }

    fn base_application(&self, application: &str) -> Result<&AppConfig> {
        match self.base.store.entry(application) {
            Some(SuiteEntry::Application(app)) => Ok(app),
            Some(SuiteEntry::Property(_)) => Err(VingrisError::ApplicationTypeConflict {
                application: application.to_string(),
                path: self.base.path.clone(),
            }),
            None => Err(VingrisError::ApplicationNotFound {
                application: application.to_string(),
                path: self.base.path.clone(),
            }),
        }
    }

    /// Whether `application` declares an override other than the loaded one.
    fn declaration_pending(&self, application: &str, override_property: &str) -> bool {
        self.base
            .store
            .application(application)
            .and_then(|app| app.get(override_property))
            .is_some_and(|declared| self.overlay_declaration.as_deref() != Some(declared))
    }

    fn override_application(&self, application: &str) -> Option<&AppConfig> {
        self.overlay
            .as_ref()
            .and_then(|overlay| overlay.store.application(application))
            .filter(|app| !app.is_empty())
    }
}

/// Bookkeeping owned by whoever holds the reload lock.
#[derive(Debug, Default)]
struct ReloadState {
    /// Discovered once, then fixed.
    base_path: Option<PathBuf>,
    base_modified: Option<SystemTime>,
    /// Raw declaration the override path was resolved from.
    override_declared: Option<String>,
    override_owner: Option<String>,
    override_path: Option<PathBuf>,
    override_modified: Option<SystemTime>,
}

/// Hierarchical configuration store with transparent reloads.
///
/// Build one per process and share it through an `Arc`.
pub struct ConfigService {
    settings: ServiceConfig,
    properties: SystemProperties,
    snapshot: ArcSwapOption<Snapshot>,
    reload: Mutex<ReloadState>,
    epoch: Instant,
    /// Milliseconds since `epoch` of the last probe.
    last_check_ms: AtomicU64,
    /// Probe on the next call regardless of the interval.
    force_check: AtomicBool,
    parse_count: AtomicU64,
}

impl ConfigService {
    pub fn new(settings: ServiceConfig) -> Self {
        Self::with_properties(settings, SystemProperties::new())
    }

    /// Create a service resolving variables against `properties` after the
    /// environment.
    pub fn with_properties(settings: ServiceConfig, properties: SystemProperties) -> Self {
        Self {
            settings,
            properties,
            snapshot: ArcSwapOption::empty(),
            reload: Mutex::new(ReloadState::default()),
            epoch: Instant::now(),
            last_check_ms: AtomicU64::new(0),
            force_check: AtomicBool::new(true),
            parse_count: AtomicU64::new(0),
        }
    }

    pub fn settings(&self) -> &ServiceConfig {
        &self.settings
    }

    /// Look up a property, reloading stale documents first.
    pub fn get_property(&self, application: &str, property: &str) -> Result<String> {
        let result = self.lookup(application, property);
        metrics::record_lookup(result.is_ok());
        result
    }

    /// Like [`get_property`](Self::get_property), but logs failures and
    /// returns `None` instead.
    pub fn get_property_safely(&self, application: &str, property: &str) -> Option<String> {
        match self.get_property(application, property) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::info!(application, property, error = %e, "Property lookup failed");
                None
            }
        }
    }

    /// All properties visible to `application`, substituted.
    pub fn get_application(&self, application: &str) -> Result<BTreeMap<String, String>> {
        let snapshot = self.refresh(application)?;
        let mut resolved = BTreeMap::new();
        for key in snapshot.keys(application)? {
            let value = self.substitute(&snapshot, application, &key)?;
            resolved.insert(key, value);
        }
        Ok(resolved)
    }

    /// Whether a document changed on disk since it was loaded.
    ///
    /// Shares the probe interval with lookups. A detected change makes the
    /// next lookup reload without waiting for the interval.
    pub fn has_config_changed(&self) -> bool {
        if self.snapshot.load().is_none() || self.force_check.load(Ordering::Acquire) {
            return true;
        }
        if !self.claim_check() {
            return false;
        }

        let changed = {
            let state = self.lock_state();
            probe_changed(state.base_path.as_deref(), state.base_modified)
                || probe_changed(state.override_path.as_deref(), state.override_modified)
        };
        if changed {
            self.force_check.store(true, Ordering::Release);
        }
        changed
    }

    /// Make the next lookup probe the filesystem immediately.
    pub fn invalidate(&self) {
        self.force_check.store(true, Ordering::Release);
    }

    /// Set a system property used by substitution.
    pub fn set_system_property(
        &self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<String> {
        self.properties.set(name, value)
    }

    pub fn system_property(&self, name: &str) -> Option<String> {
        self.properties.get(name)
    }

    /// Number of documents parsed so far, failed attempts included.
    pub fn parse_count(&self) -> u64 {
        self.parse_count.load(Ordering::Relaxed)
    }

    /// The discovered base document path, once known.
    pub fn base_path(&self) -> Option<PathBuf> {
        self.lock_state().base_path.clone()
    }

    /// The current override document path, if one was declared.
    pub fn override_path(&self) -> Option<PathBuf> {
        self.lock_state().override_path.clone()
    }

    /// Base and override document paths.
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        let state = self.lock_state();
        state
            .base_path
            .iter()
            .chain(state.override_path.iter())
            .cloned()
            .collect()
    }

    /// The snapshot currently in service, without probing.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshot.load_full()
    }

    fn lookup(&self, application: &str, property: &str) -> Result<String> {
        let snapshot = self.refresh(application)?;
        self.substitute(&snapshot, application, property)
    }

    fn substitute(&self, snapshot: &Snapshot, application: &str, property: &str) -> Result<String> {
        let (raw, source) = snapshot.resolve(application, property)?;
        let variables = ProcessVariables::new(&self.properties);
        expand(raw, &variables).map_err(|e| VingrisError::Substitution {
            application: application.to_string(),
            property: property.to_string(),
            path: source.to_path_buf(),
            source: e,
        })
    }

    /// The snapshot to serve, reloading first when a probe is due.
    fn refresh(&self, application: &str) -> Result<Arc<Snapshot>> {
        let due = self.claim_check();
        if !due {
            if let Some(snapshot) = self.snapshot.load_full() {
                // a declaration not yet loaded cannot wait for the next window
                let override_property = &self.settings.document.override_property;
                if !snapshot.declaration_pending(application, override_property) {
                    return Ok(snapshot);
                }
            }
        }

        let mut state = self.lock_state();
        self.reload_if_stale(&mut state, application)
    }

    /// Claim the current probe window. Only one caller per window wins.
    fn claim_check(&self) -> bool {
        let now = self.elapsed_ms();
        if self.force_check.swap(false, Ordering::AcqRel) {
            self.last_check_ms.store(now, Ordering::Release);
            return true;
        }

        let last = self.last_check_ms.load(Ordering::Acquire);
        if now.saturating_sub(last) < self.settings.reload.check_interval_ms {
            return false;
        }
        self.last_check_ms
            .compare_exchange(last, now, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn reload_if_stale(&self, state: &mut ReloadState, application: &str) -> Result<Arc<Snapshot>> {
        let current = self.snapshot.load_full();
        let overlay = current.as_ref().and_then(|s| s.overlay.clone());

        let base = self.refresh_base(state, current.as_deref())?;
        // publish the base before touching the override so a failing
        // override cannot strand a freshly parsed base
        let current = self.publish(current, base.clone(), overlay.clone(), state);

        let overlay = self.refresh_override(state, &base, overlay, application)?;
        Ok(self.publish(Some(current), base, overlay, state))
    }

    fn refresh_base(
        &self,
        state: &mut ReloadState,
        current: Option<&Snapshot>,
    ) -> Result<Arc<LoadedDocument>> {
        let path = match &state.base_path {
            Some(path) => path.clone(),
            None => {
                let working_dir = match &self.settings.discovery.working_dir {
                    Some(dir) => dir.clone(),
                    None => std::env::current_dir().map_err(|source| VingrisError::Io {
                        path: PathBuf::from("."),
                        source,
                    })?,
                };
                let variables = ProcessVariables::new(&self.properties);
                let path =
                    discovery::locate_base(&self.settings.discovery, &variables, &working_dir)?;
                tracing::info!(path = %path.display(), "Configuration document located");
                state.base_path = Some(path.clone());
                path
            }
        };

        let modified = modified_time(&path)?;
        if let Some(current) = current {
            if state.base_modified == Some(modified) {
                return Ok(current.base.clone());
            }
        }

        tracing::info!(path = %path.display(), "Reloading configuration file");
        let document = self.reload_document(
            &path,
            &mut state.base_modified,
            modified,
            current.is_some(),
            "base",
        )?;
        Ok(Arc::new(document))
    }

    fn refresh_override(
        &self,
        state: &mut ReloadState,
        base: &LoadedDocument,
        current: Option<Arc<LoadedDocument>>,
        application: &str,
    ) -> Result<Option<Arc<LoadedDocument>>> {
        let override_property = &self.settings.document.override_property;
        let declared = base
            .store
            .application(application)
            .and_then(|app| app.get(override_property));

        if let Some(declared) = declared {
            if state.override_declared.as_deref() != Some(declared) {
                let variables = ProcessVariables::new(&self.properties);
                let resolved = expand(declared, &variables).map_err(|e| VingrisError::Substitution {
                    application: application.to_string(),
                    property: override_property.clone(),
                    path: base.path.clone(),
                    source: e,
                })?;
                let path = PathBuf::from(resolved);
                if !path.is_file() {
                    return Err(VingrisError::OverrideFileNotFound {
                        application: application.to_string(),
                        path,
                    });
                }

                tracing::info!(application, path = %path.display(), "Override file declared");
                state.override_declared = Some(declared.to_string());
                state.override_owner = Some(application.to_string());
                state.override_path = Some(path);
                state.override_modified = None;
            }
        }

        let Some(path) = state.override_path.clone() else {
            return Ok(None);
        };

        // failures of an override that does not concern this application
        // stay out of its lookup
        let concerned = declared.is_some()
            || current
                .as_ref()
                .is_some_and(|doc| doc.store.entry(application).is_some());
        match self.reload_override(state, &path, current.clone(), application) {
            Ok(overlay) => Ok(overlay),
            Err(e) if concerned => Err(e),
            Err(e) => {
                tracing::warn!(
                    application,
                    path = %path.display(),
                    error = %e,
                    "Override reload failed, keeping current override"
                );
                Ok(current)
            }
        }
    }

    fn reload_override(
        &self,
        state: &mut ReloadState,
        path: &Path,
        current: Option<Arc<LoadedDocument>>,
        application: &str,
    ) -> Result<Option<Arc<LoadedDocument>>> {
        let modified = match modified_time(path) {
            Ok(modified) => modified,
            Err(VingrisError::FileNotFound { path }) => {
                let owner = state.override_owner.as_deref().unwrap_or(application);
                return Err(VingrisError::OverrideFileNotFound {
                    application: owner.to_string(),
                    path,
                });
            }
            Err(e) => return Err(e),
        };

        let current = current.filter(|doc| doc.path == path);
        if let Some(current) = &current {
            if state.override_modified == Some(modified) {
                return Ok(Some(current.clone()));
            }
        }

        tracing::info!(path = %path.display(), "Reloading override configuration file");
        let document = self.reload_document(
            path,
            &mut state.override_modified,
            modified,
            current.is_some(),
            "override",
        )?;
        Ok(Some(Arc::new(document)))
    }

    /// Parse `path`, recording `modified`.
    ///
    /// With a previous document in service the timestamp is recorded before
    /// parsing, so a broken file is reported once and the previous document
    /// keeps serving until the file changes again.
    fn reload_document(
        &self,
        path: &Path,
        recorded: &mut Option<SystemTime>,
        modified: SystemTime,
        has_previous: bool,
        store: &'static str,
    ) -> Result<LoadedDocument> {
        if has_previous {
            *recorded = Some(modified);
        }
        let document = self.load(path, store)?;
        *recorded = Some(modified);
        Ok(document)
    }

    fn load(&self, path: &Path, store: &'static str) -> Result<LoadedDocument> {
        self.parse_count.fetch_add(1, Ordering::Relaxed);

        let result = document::read_document(path).and_then(|root| {
            build_suite(&root, self.settings.document.build_options()).map_err(|source| {
                VingrisError::Structure {
                    path: path.to_path_buf(),
                    source,
                }
            })
        });

        match result {
            Ok(suite) => {
                metrics::record_reload(store);
                tracing::debug!(
                    path = %path.display(),
                    store,
                    entries = suite.len(),
                    "Document loaded"
                );
                Ok(LoadedDocument {
                    path: path.to_path_buf(),
                    store: suite,
                })
            }
            Err(e) => {
                metrics::record_reload_failure(store);
                tracing::warn!(
                    path = %path.display(),
                    store,
                    error = %e,
                    "Document reload failed, keeping previous state"
                );
                Err(e)
            }
        }
    }

    fn publish(
        &self,
        current: Option<Arc<Snapshot>>,
        base: Arc<LoadedDocument>,
        overlay: Option<Arc<LoadedDocument>>,
        state: &ReloadState,
    ) -> Arc<Snapshot> {
        let overlay_declaration = overlay.as_ref().and(state.override_declared.clone());
        if let Some(current) = current {
            let same_overlay = match (&current.overlay, &overlay) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            };
            if Arc::ptr_eq(&current.base, &base)
                && same_overlay
                && current.overlay_declaration == overlay_declaration
            {
                return current;
            }
        }

        metrics::record_applications(base.store.len());
        let snapshot = Arc::new(Snapshot {
            base,
            overlay,
            overlay_declaration,
        });
        self.snapshot.store(Some(snapshot.clone()));
        snapshot
    }

    fn lock_state(&self) -> MutexGuard<'_, ReloadState> {
        self.reload.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

impl std::fmt::Debug for ConfigService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigService")
            .field("settings", &self.settings)
            .field("parse_count", &self.parse_count())
            .finish_non_exhaustive()
    }
}

fn modified_time(path: &Path) -> Result<SystemTime> {
    std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => VingrisError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => VingrisError::Io {
                path: path.to_path_buf(),
                source,
            },
        })
}

fn probe_changed(path: Option<&Path>, recorded: Option<SystemTime>) -> bool {
    path.is_some_and(|path| modified_time(path).ok() != recorded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Node, APPLICATION_TAG, PROPERTY_TAG, SUITE_TAG};
    use crate::suite::BuildOptions;

    fn document(path: &str, apps: &[(&str, Vec<(&str, &str)>)]) -> Arc<LoadedDocument> {
        let mut root = Node::new(SUITE_TAG);
        for (name, props) in apps {
            let mut app = Node::new(APPLICATION_TAG).with_attribute("name", *name);
            for (key, value) in props {
                app = app.with_child(
                    Node::new(PROPERTY_TAG)
                        .with_attribute("key", *key)
                        .with_attribute("value", *value),
                );
            }
            root = root.with_child(app);
        }
        Arc::new(LoadedDocument {
            path: PathBuf::from(path),
            store: build_suite(&root, BuildOptions::default()).unwrap(),
        })
    }

    #[test]
    fn test_override_wins_when_present() {
        let snapshot = Snapshot {
            base: document("base.xml", &[("svc", vec![("url", "base"), ("port", "80")])]),
            overlay: Some(document("over.xml", &[("svc", vec![("url", "over")])])),
            overlay_declaration: Some("over.xml".to_string()),
        };

        assert_eq!(snapshot.resolve("svc", "url").unwrap(), ("over", Path::new("over.xml")));
        assert_eq!(snapshot.resolve("svc", "port").unwrap(), ("80", Path::new("base.xml")));
        assert_eq!(snapshot.keys("svc").unwrap(), vec!["port", "url"]);
    }

    #[test]
    fn test_empty_override_scope_falls_through() {
        let snapshot = Snapshot {
            base: document("base.xml", &[("svc", vec![("url", "base")])]),
            overlay: Some(document("over.xml", &[("svc", vec![])])),
            overlay_declaration: Some("over.xml".to_string()),
        };
        assert_eq!(snapshot.resolve("svc", "url").unwrap().0, "base");
    }

    #[test]
    fn test_application_must_exist_in_base() {
        let snapshot = Snapshot {
            base: document("base.xml", &[("svc", vec![])]),
            overlay: Some(document("over.xml", &[("other", vec![("k", "v")])])),
            overlay_declaration: Some("over.xml".to_string()),
        };
        let err = snapshot.resolve("other", "k").unwrap_err();
        assert!(matches!(err, VingrisError::ApplicationNotFound { .. }));

        let err = snapshot.resolve("svc", "k").unwrap_err();
        assert!(matches!(err, VingrisError::PropertyNotFound { .. }));
    }

    #[test]
    fn test_claim_check_respects_interval() {
        let service = ConfigService::new(ServiceConfig::default());
        assert!(service.claim_check(), "first probe is always due");
        assert!(!service.claim_check());

        service.invalidate();
        assert!(service.claim_check());
        assert!(!service.claim_check());
    }
}
