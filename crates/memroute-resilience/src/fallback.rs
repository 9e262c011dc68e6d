// SPDX-FileCopyrightText: 2026 Memroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fallback-chain executor.
//!
//! Runs one operation against the primary system and then, on failure, the
//! primary's static fallbacks in order. The executor is an explicit state
//! machine:
//!
//! ```text
//! Selecting -> Attempting(0) -> Succeeded
//!                   |
//!                   v
//!              Attempting(1) -> Succeeded
//!                   |
//!                   v
//!              Attempting(2) -> Succeeded
//!                   |
//!                   v
//!               Exhausted
//! ```
//!
//! Every attempt is timed around exactly one backend call and recorded in the
//! [`PerformanceTracker`]. Per-system failures are absorbed and audited; only
//! exhaustion (or cancellation between attempts) reaches the caller.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use memroute_core::{AuditEntry, AuditSink, BackendError, MemrouteError, Severity, System};
use serde::Serialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::recording;
use crate::tracker::PerformanceTracker;

/// Static fallbacks per primary system, in attempt order.
pub fn fallbacks(primary: System) -> [System; 2] {
    match primary {
        System::Graph => [System::Cache, System::Document],
        System::Cache => [System::Document, System::Graph],
        System::Document => [System::Cache, System::Graph],
    }
}

/// Full attempt order: the primary followed by its fallbacks.
pub fn fallback_chain(primary: System) -> Vec<System> {
    let mut chain = Vec::with_capacity(3);
    chain.push(primary);
    chain.extend(fallbacks(primary));
    chain
}

/// Successful result of a fallback run.
#[derive(Debug, Clone, Serialize)]
pub struct FallbackOutcome<T> {
    pub value: T,
    /// System that produced `value`.
    pub system: System,
    /// True when `system` is not the primary.
    pub used_fallback: bool,
    /// Systems tried, in order, including the successful one.
    pub attempted: Vec<System>,
}

/// Executor states.
#[derive(Debug)]
enum State<T> {
    Selecting,
    Attempting(usize),
    Succeeded { index: usize, value: T },
    Exhausted,
}

/// Drives operations through the fallback chain.
#[derive(Clone)]
pub struct FallbackExecutor {
    tracker: Arc<PerformanceTracker>,
    audit: Arc<dyn AuditSink>,
}

impl FallbackExecutor {
    pub fn new(tracker: Arc<PerformanceTracker>, audit: Arc<dyn AuditSink>) -> Self {
        Self { tracker, audit }
    }

    pub fn tracker(&self) -> &Arc<PerformanceTracker> {
        &self.tracker
    }

    /// Run `op` against `primary`, then its fallbacks, until one succeeds.
    ///
    /// `operation` names the work for logs and audit entries. `op` receives
    /// the system to call and must perform exactly one backend call.
    ///
    /// Cancellation is checked before each attempt; an attempt already in
    /// flight always completes and is recorded.
    pub async fn execute<T, F, Fut>(
        &self,
        primary: System,
        operation: &str,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<FallbackOutcome<T>, MemrouteError>
    where
        F: FnMut(System) -> Fut,
        Fut: Future<Output = Result<T, BackendError>>,
    {
        let chain = fallback_chain(primary);
        let mut attempted: Vec<System> = Vec::with_capacity(chain.len());
        let mut last_error = String::new();
        let mut state = State::Selecting;

        loop {
            state = match state {
                State::Selecting => {
                    debug!(%primary, operation, chain = ?chain, "selecting fallback chain");
                    State::Attempting(0)
                }
                State::Attempting(index) => {
                    if cancel.is_cancelled() {
                        warn!(
                            %primary,
                            operation,
                            attempted = ?attempted,
                            "request cancelled, skipping remaining systems"
                        );
                        return Err(MemrouteError::Cancelled { attempted });
                    }

                    let system = chain[index];
                    attempted.push(system);

                    let started = Instant::now();
                    let result = op(system).await;
                    let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

                    match result {
                        Ok(value) => {
                            self.tracker.record_outcome(system, true, latency_ms);
                            State::Succeeded { index, value }
                        }
                        Err(err) => {
                            self.tracker.record_outcome(system, false, latency_ms);
                            self.audit_failure(primary, system, index, operation, &err, latency_ms);
                            last_error = err.to_string();
                            if index + 1 < chain.len() {
                                State::Attempting(index + 1)
                            } else {
                                State::Exhausted
                            }
                        }
                    }
                }
                State::Succeeded { index, value } => {
                    let system = chain[index];
                    let used_fallback = index > 0;
                    if used_fallback {
                        self.audit_fallback_success(primary, system, operation, attempted.len());
                    }
                    return Ok(FallbackOutcome {
                        value,
                        system,
                        used_fallback,
                        attempted,
                    });
                }
                State::Exhausted => {
                    self.audit_exhausted(primary, operation, &attempted, &last_error);
                    return Err(MemrouteError::AllSystemsExhausted {
                        attempted,
                        last_error,
                    });
                }
            };
        }
    }

    fn audit_failure(
        &self,
        primary: System,
        system: System,
        index: usize,
        operation: &str,
        err: &BackendError,
        latency_ms: f64,
    ) {
        let severity = if index == 0 {
            Severity::High
        } else {
            Severity::Medium
        };
        warn!(
            %system,
            %primary,
            attempt = index + 1,
            operation,
            error = %err,
            "memory system failed"
        );
        self.audit.record(
            AuditEntry::new(
                "Memory System Failure",
                format!("{system} failed during {operation}: {err}"),
                severity,
            )
            .with_context(if index == 0 {
                format!("primary system {system} failed, trying fallbacks")
            } else {
                format!("fallback {system} failed after primary {primary}")
            })
            .with_metrics(json!({
                "system": system,
                "primary": primary,
                "attempt": index + 1,
                "latency_ms": latency_ms,
            })),
        );
    }

    fn audit_fallback_success(
        &self,
        primary: System,
        system: System,
        operation: &str,
        attempts: usize,
    ) {
        info!(%primary, %system, operation, attempts, "fallback system succeeded");
        recording::record_fallback(primary, system);
        self.audit.record(
            AuditEntry::new(
                "Fallback Success",
                format!("Primary system {primary} failed, fallback to {system} succeeded"),
                Severity::Medium,
            )
            .with_context("Consider investigating primary system issue")
            .with_metrics(json!({
                "primary": primary,
                "served_by": system,
                "attempts": attempts,
                "operation": operation,
            })),
        );
    }

    fn audit_exhausted(
        &self,
        primary: System,
        operation: &str,
        attempted: &[System],
        last_error: &str,
    ) {
        let tried = attempted
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        error!(%primary, operation, tried = %tried, last_error, "all memory systems failed");
        recording::record_exhausted(primary);
        self.audit.record(
            AuditEntry::new(
                "All Memory Systems Failed",
                format!(
                    "All memory systems failed for {operation}. Tried: {tried}. \
                     Last error: {last_error}"
                ),
                Severity::Critical,
            )
            .with_context(format!("primary system {primary}"))
            .with_metrics(json!({
                "attempted": attempted,
                "last_error": last_error,
            })),
        );
    }
}

impl std::fmt::Debug for FallbackExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackExecutor")
            .field("tracker", &self.tracker)
            .finish_non_exhaustive()
    }
}
