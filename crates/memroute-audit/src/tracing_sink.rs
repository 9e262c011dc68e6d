// SPDX-FileCopyrightText: 2026 Memroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audit entries as tracing events.

use memroute_core::{AuditEntry, AuditSink, Severity};
use tracing::{debug, error, info, warn};

/// Emits each entry as a structured event at a level matching its severity.
///
/// LOW maps to debug, MEDIUM to info, HIGH to warn and CRITICAL to error.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, entry: AuditEntry) {
        let context = entry.context.as_deref().unwrap_or("");
        let metrics = entry
            .metrics
            .as_ref()
            .map(|m| m.to_string())
            .unwrap_or_default();

        match entry.severity {
            Severity::Low => debug!(
                category = %entry.category,
                context,
                metrics = %metrics,
                "{}",
                entry.description
            ),
            Severity::Medium => info!(
                category = %entry.category,
                context,
                metrics = %metrics,
                "{}",
                entry.description
            ),
            Severity::High => warn!(
                category = %entry.category,
                context,
                metrics = %metrics,
                "{}",
                entry.description
            ),
            Severity::Critical => error!(
                category = %entry.category,
                context,
                metrics = %metrics,
                "{}",
                entry.description
            ),
        }
    }
}
