//! In-process counters.
//!
//! Every counter is identified by its name plus a canonical rendering of its
//! labels (sorted by key, values escaped), so identical label sets always
//! accumulate into the same counter. Nothing decays; counters live until the
//! process exits.
//!
//! Rendered as `name{k="v"} value` lines, compatible with the Prometheus text
//! exposition format for untyped samples.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

/// Requests observed at instrumented endpoints, labelled by `client`.
pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";

/// Upstream failures collapsed to an empty result, labelled by `resource`
/// and `kind`.
pub const UPSTREAM_ERRORS_TOTAL: &str = "upstream_errors_total";

/// Revalidation outcomes, labelled by `outcome`.
pub const REVALIDATIONS_TOTAL: &str = "revalidations_total";

/// Process-wide counter registry. Construct once and share behind an `Arc`.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    counters: DashMap<String, AtomicU64>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self, name: &str, labels: &[(&str, &str)]) {
        self.increment_by(name, labels, 1);
    }

    pub fn increment_by(&self, name: &str, labels: &[(&str, &str)], by: u64) {
        let key = counter_key(name, labels);
        // Fast path avoids taking the shard write lock for existing counters.
        if let Some(counter) = self.counters.get(&key) {
            counter.fetch_add(by, Ordering::Relaxed);
            return;
        }
        self.counters
            .entry(key)
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(by, Ordering::Relaxed);
    }

    /// Current value, 0 for unknown counters.
    pub fn get(&self, name: &str, labels: &[(&str, &str)]) -> u64 {
        self.counters
            .get(&counter_key(name, labels))
            .map(|counter| counter.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// One `"<key> <value>"` line per counter, sorted by key.
    pub fn render(&self) -> String {
        let mut lines: Vec<(String, u64)> = self
            .counters
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().load(Ordering::Relaxed)))
            .collect();
        lines.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        let mut out = String::new();
        for (key, value) in lines {
            let _ = writeln!(out, "{key} {value}");
        }
        out
    }
}

/// `name` alone when there are no labels, else `name{a="1",b="2"}`.
pub fn counter_key(name: &str, labels: &[(&str, &str)]) -> String {
    if labels.is_empty() {
        return name.to_string();
    }
    let mut sorted: Vec<&(&str, &str)> = labels.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let mut key = String::with_capacity(name.len() + 16 * sorted.len());
    key.push_str(name);
    key.push('{');
    for (i, (label, value)) in sorted.into_iter().enumerate() {
        if i > 0 {
            key.push(',');
        }
        key.push_str(label);
        key.push_str("=\"");
        escape_into(&mut key, value);
        key.push('"');
    }
    key.push('}');
    key
}

fn escape_into(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
}
