//! Push-style reloads through the document watcher.

use std::sync::Arc;
use std::time::Duration;

use vingris::config::watcher::StoreWatcher;

mod common;
use common::{service_for, suite_xml, Fixture};

#[tokio::test]
async fn test_watcher_invalidates_probe_window() {
    let fixture = Fixture::new();
    let base = fixture.write("VinGris.xml", &suite_xml(&[("svc", vec![("k", "old")])]));

    // interval long enough that only the watcher can trigger the reload
    let service = Arc::new(service_for(&base, 600_000));
    assert_eq!(service.get_property("svc", "k").unwrap(), "old");

    let (watcher, mut changes) = StoreWatcher::new(service.clone());
    assert_eq!(watcher.targets().len(), 1);
    let _watcher = watcher.run().unwrap();

    fixture.write("VinGris.xml", &suite_xml(&[("svc", vec![("k", "new")])]));

    let changed = tokio::time::timeout(Duration::from_secs(10), changes.recv())
        .await
        .expect("no change event within timeout")
        .expect("watcher channel closed");
    assert_eq!(changed.file_name().unwrap(), "VinGris.xml");
    assert_eq!(service.get_property("svc", "k").unwrap(), "new");
}

#[tokio::test]
async fn test_watcher_ignores_unrelated_files() {
    let fixture = Fixture::new();
    let base = fixture.write("VinGris.xml", &suite_xml(&[("svc", vec![("k", "v")])]));
    let service = Arc::new(service_for(&base, 600_000));
    service.get_property("svc", "k").unwrap();

    let (watcher, mut changes) = StoreWatcher::new(service.clone());
    let _watcher = watcher.run().unwrap();

    std::fs::write(fixture.path("unrelated.txt"), "noise").unwrap();

    let result = tokio::time::timeout(Duration::from_millis(500), changes.recv()).await;
    assert!(result.is_err(), "unexpected change event: {result:?}");
}
