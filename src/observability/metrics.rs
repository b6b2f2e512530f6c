//! Metrics collection.
//!
//! # Metrics
//! - `vingris_lookups_total` (counter): property lookups by outcome
//! - `vingris_reloads_total` (counter): documents parsed, by store
//! - `vingris_reload_failures_total` (counter): failed parses, by store
//! - `vingris_applications` (gauge): entries in the base store in service

/// Record one property lookup.
pub fn record_lookup(success: bool) {
    let outcome = if success { "ok" } else { "error" };
    ::metrics::counter!("vingris_lookups_total", "outcome" => outcome).increment(1);
}

/// Record a successful document parse for `store` (`base` or `override`).
pub fn record_reload(store: &'static str) {
    ::metrics::counter!("vingris_reloads_total", "store" => store).increment(1);
}

pub fn record_reload_failure(store: &'static str) {
    ::metrics::counter!("vingris_reload_failures_total", "store" => store).increment(1);
}

pub fn record_applications(count: usize) {
    ::metrics::gauge!("vingris_applications").set(count as f64);
}
