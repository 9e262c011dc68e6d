// SPDX-FileCopyrightText: 2026 Memroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any installed recorder can collect these.
//! Without a recorder every call is a no-op.

use memroute_core::System;
use metrics::{describe_counter, describe_histogram};

/// Register memroute metric descriptions.
///
/// Call once at startup after a recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "memroute_backend_operations_total",
        "Backend calls by system and outcome"
    );
    describe_histogram!(
        "memroute_backend_latency_ms",
        "Backend call latency in milliseconds"
    );
    describe_counter!(
        "memroute_fallback_total",
        "Operations served by a fallback system"
    );
    describe_counter!(
        "memroute_exhausted_total",
        "Operations for which every system failed"
    );
    describe_counter!(
        "memroute_audit_entries_total",
        "Audit entries accepted by the severity filter"
    );
}

/// Record one backend call.
pub fn record_backend_operation(system: System, success: bool, latency_ms: f64) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!(
        "memroute_backend_operations_total",
        "system" => system.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("memroute_backend_latency_ms", "system" => system.to_string())
        .record(latency_ms);
}

/// Record an operation rescued by a fallback.
pub fn record_fallback(primary: System, served_by: System) {
    metrics::counter!(
        "memroute_fallback_total",
        "primary" => primary.to_string(),
        "served_by" => served_by.to_string()
    )
    .increment(1);
}

/// Record a fully exhausted fallback chain.
pub fn record_exhausted(primary: System) {
    metrics::counter!("memroute_exhausted_total", "primary" => primary.to_string()).increment(1);
}
