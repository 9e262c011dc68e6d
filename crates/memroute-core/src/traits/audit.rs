// SPDX-FileCopyrightText: 2026 Memroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audit sink trait for routing, fallback and propagation records.

use crate::types::AuditEntry;

/// Write-only, best-effort destination for audit records.
///
/// `record` cannot fail: sinks swallow (and log) their own errors so the
/// routing core never sees them.
pub trait AuditSink: Send + Sync + 'static {
    fn record(&self, entry: AuditEntry);
}

/// Sink that drops every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _entry: AuditEntry) {}
}
