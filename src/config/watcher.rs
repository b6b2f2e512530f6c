//! Document watcher for push-style reloads.
//!
//! Lookups already notice changes through the modification-time probe; the
//! watcher only shortens the wait by invalidating the probe window as soon
//! as the filesystem reports a change.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::service::ConfigService;

/// Watches the documents a service has loaded.
pub struct StoreWatcher {
    service: Arc<ConfigService>,
    targets: Vec<PathBuf>,
    update_tx: mpsc::UnboundedSender<PathBuf>,
}

impl StoreWatcher {
    /// Create a watcher for the documents `service` currently uses.
    ///
    /// Returns the watcher and a receiver of changed document paths. Call
    /// after the first lookup; before that no document is known.
    pub fn new(service: Arc<ConfigService>) -> (Self, mpsc::UnboundedReceiver<PathBuf>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let targets = service.watched_paths().iter().map(|p| canonical(p)).collect();

        (
            Self {
                service,
                targets,
                update_tx,
            },
            update_rx,
        )
    }

    /// Paths this watcher reacts to.
    pub fn targets(&self) -> &[PathBuf] {
        &self.targets
    }

    /// Start watching in a background thread.
    ///
    /// Parent directories are watched so that editors replacing a file by
    /// rename are noticed too.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let service = self.service.clone();
        let targets = self.targets.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let kind = event.kind;
                    if !(kind.is_modify() || kind.is_create() || kind.is_remove()) {
                        return;
                    }
                    for path in event.paths.iter().filter(|p| targets.contains(&canonical(p))) {
                        tracing::info!(path = %path.display(), "Document change detected");
                        service.invalidate();
                        let _ = tx.send(path.clone());
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default(),
        )?;

        let mut dirs: Vec<&Path> = self.targets.iter().filter_map(|p| p.parent()).collect();
        dirs.dedup();
        for dir in dirs {
            watcher.watch(dir, RecursiveMode::NonRecursive)?;
        }

        tracing::info!(targets = ?self.targets, "Document watcher started");
        Ok(watcher)
    }
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
