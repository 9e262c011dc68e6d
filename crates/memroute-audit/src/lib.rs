// SPDX-FileCopyrightText: 2026 Memroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audit sinks for memroute.
//!
//! The router reports failures, fallbacks, propagation summaries and routing
//! decisions as [`AuditEntry`] values. Sinks here deliver them to the log
//! stream or to an append-only markdown file. Recording never fails from the
//! caller's point of view.

pub mod filter;
pub mod markdown;
pub mod tracing_sink;

use std::sync::Arc;

use memroute_config::model::AuditConfig;
use memroute_core::{AuditEntry, AuditSink, NullAuditSink};

pub use filter::{FanOutAuditSink, FilteredAuditSink};
pub use markdown::{MarkdownAuditSink, SessionSummary};
pub use tracing_sink::TracingAuditSink;

/// Build the sink described by `[audit]` config.
///
/// Disabled audit yields a [`NullAuditSink`]. Otherwise entries always go to
/// tracing, and to a markdown file as well when `path` is set. The severity
/// threshold applies to both.
pub fn build_sink(config: &AuditConfig) -> Arc<dyn AuditSink> {
    if !config.enabled {
        tracing::debug!("audit disabled");
        return Arc::new(NullAuditSink);
    }

    let mut sinks: Vec<Arc<dyn AuditSink>> = vec![Arc::new(TracingAuditSink)];
    if let Some(path) = &config.path {
        tracing::debug!(path = %path, "markdown audit trail enabled");
        sinks.push(Arc::new(MarkdownAuditSink::new(path)));
    }

    let inner: Arc<dyn AuditSink> = if sinks.len() == 1 {
        sinks.remove(0)
    } else {
        Arc::new(FanOutAuditSink::new(sinks))
    };
    Arc::new(FilteredAuditSink::new(inner, config.min_severity()))
}

/// Count one entry that passed the severity filter.
pub(crate) fn count_entry(entry: &AuditEntry) {
    metrics::counter!(
        "memroute_audit_entries_total",
        "severity" => entry.severity.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use memroute_core::Severity;

    #[test]
    fn disabled_config_builds_null_sink() {
        let config = AuditConfig {
            enabled: false,
            ..AuditConfig::default()
        };
        let sink = build_sink(&config);
        sink.record(AuditEntry::new("x", "y", Severity::Critical));
    }

    #[test]
    fn markdown_path_is_honoured() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.md");
        let config = AuditConfig {
            enabled: true,
            path: Some(path.display().to_string()),
            min_severity: "MEDIUM".into(),
        };
        let sink = build_sink(&config);
        sink.record(AuditEntry::new("Quiet", "below threshold", Severity::Low));
        sink.record(AuditEntry::new("Loud", "above threshold", Severity::High));

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(!text.contains("Quiet"));
        assert!(text.contains("**[HIGH]** Loud"));
    }

    mod counting {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicU64, Ordering};

        use metrics::{
            Counter, CounterFn, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString,
            Unit,
        };

        struct Hits(Arc<AtomicU64>);

        impl CounterFn for Hits {
            fn increment(&self, value: u64) {
                self.0.fetch_add(value, Ordering::SeqCst);
            }

            fn absolute(&self, value: u64) {
                self.0.store(value, Ordering::SeqCst);
            }
        }

        /// Counts increments of the audit entry counter only.
        #[derive(Default)]
        pub(super) struct AuditCounter(pub(super) Arc<AtomicU64>);

        impl Recorder for AuditCounter {
            fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
            fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
            fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

            fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
                if key.name() == "memroute_audit_entries_total" {
                    Counter::from_arc(Arc::new(Hits(self.0.clone())))
                } else {
                    Counter::noop()
                }
            }

            fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
                Gauge::noop()
            }

            fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
                Histogram::noop()
            }
        }
    }

    #[test]
    fn each_entry_is_counted_once_with_markdown_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let config = AuditConfig {
            enabled: true,
            path: Some(dir.path().join("audit.md").display().to_string()),
            min_severity: "MEDIUM".into(),
        };
        let recorder = counting::AuditCounter::default();
        metrics::with_local_recorder(&recorder, || {
            let sink = build_sink(&config);
            sink.record(AuditEntry::new("Quiet", "filtered out", Severity::Low));
            sink.record(AuditEntry::new("Loud", "kept", Severity::High));
            sink.record(AuditEntry::new("Louder", "kept", Severity::Critical));
        });
        assert_eq!(recorder.0.load(std::sync::atomic::Ordering::SeqCst), 2);
    }
}
