// SPDX-FileCopyrightText: 2026 Memroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sink combinators.

use std::sync::Arc;

use memroute_core::{AuditEntry, AuditSink, Severity};

/// Drops entries below a severity threshold.
#[derive(Clone)]
pub struct FilteredAuditSink {
    inner: Arc<dyn AuditSink>,
    min_severity: Severity,
}

impl FilteredAuditSink {
    pub fn new(inner: Arc<dyn AuditSink>, min_severity: Severity) -> Self {
        Self {
            inner,
            min_severity,
        }
    }

    pub fn min_severity(&self) -> Severity {
        self.min_severity
    }
}

impl std::fmt::Debug for FilteredAuditSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilteredAuditSink")
            .field("min_severity", &self.min_severity)
            .finish_non_exhaustive()
    }
}

impl AuditSink for FilteredAuditSink {
    fn record(&self, entry: AuditEntry) {
        if entry.severity >= self.min_severity {
            crate::count_entry(&entry);
            self.inner.record(entry);
        }
    }
}

/// Delivers every entry to each inner sink in order.
#[derive(Clone, Default)]
pub struct FanOutAuditSink {
    sinks: Vec<Arc<dyn AuditSink>>,
}

impl FanOutAuditSink {
    pub fn new(sinks: Vec<Arc<dyn AuditSink>>) -> Self {
        Self { sinks }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl std::fmt::Debug for FanOutAuditSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanOutAuditSink")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl AuditSink for FanOutAuditSink {
    fn record(&self, entry: AuditEntry) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.record(entry.clone());
            }
            last.record(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<AuditEntry>>);

    impl AuditSink for Collect {
        fn record(&self, entry: AuditEntry) {
            self.0.lock().unwrap().push(entry);
        }
    }

    #[test]
    fn threshold_is_inclusive() {
        let collect = Arc::new(Collect::default());
        let sink = FilteredAuditSink::new(collect.clone(), Severity::Medium);
        sink.record(AuditEntry::new("a", "low", Severity::Low));
        sink.record(AuditEntry::new("b", "medium", Severity::Medium));
        sink.record(AuditEntry::new("c", "critical", Severity::Critical));
        let seen: Vec<String> = collect
            .0
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.category.clone())
            .collect();
        assert_eq!(seen, vec!["b", "c"]);
    }

    #[test]
    fn fan_out_reaches_every_sink() {
        let a = Arc::new(Collect::default());
        let b = Arc::new(Collect::default());
        let sink = FanOutAuditSink::new(vec![a.clone(), b.clone()]);
        sink.record(AuditEntry::new("x", "y", Severity::High));
        assert_eq!(a.0.lock().unwrap().len(), 1);
        assert_eq!(b.0.lock().unwrap().len(), 1);
        assert_eq!(sink.len(), 2);
    }
}
