// SPDX-FileCopyrightText: 2026 Memroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-system performance telemetry.
//!
//! Keeps an exponential moving average of success rate and latency for each
//! memory system and a bounded FIFO of recent outcomes. This is the only state
//! shared between concurrent requests: one mutex guards both the metric map
//! and the ring buffer, and it is never held across an await.

use std::collections::{BTreeMap, VecDeque};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use memroute_core::System;
use serde::Serialize;

use crate::recording;

/// Default EMA smoothing factor.
pub const DEFAULT_EMA_ALPHA: f64 = 0.1;

/// Default capacity of the recent-outcomes ring buffer.
pub const DEFAULT_RECENT_CAPACITY: usize = 100;

/// Score returned for names that are not a known system.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Weight of the success rate in [`PerformanceTracker::score`].
const SUCCESS_WEIGHT: f64 = 0.7;

/// Weight of the latency term in [`PerformanceTracker::score`].
const LATENCY_WEIGHT: f64 = 0.3;

/// Smoothed telemetry for one system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceMetric {
    pub success_rate: f64,
    pub avg_latency_ms: f64,
    pub operation_count: u64,
}

impl PerformanceMetric {
    /// Plausible starting values so a fresh process has non-zero scores.
    pub fn seed(system: System) -> Self {
        let (success_rate, avg_latency_ms) = match system {
            System::Graph => (0.90, 150.0),
            System::Cache => (0.95, 50.0),
            System::Document => (0.85, 200.0),
        };
        Self {
            success_rate,
            avg_latency_ms,
            operation_count: 0,
        }
    }

    /// `0.7 * success_rate + 0.3 * clamp(1 - latency / 1000, 0.1, 1.0)`,
    /// clamped to `[0, 1]`.
    pub fn score(&self) -> f64 {
        let latency_score = (1.0 - self.avg_latency_ms / 1000.0).clamp(0.1, 1.0);
        (SUCCESS_WEIGHT * self.success_rate + LATENCY_WEIGHT * latency_score).clamp(0.0, 1.0)
    }
}

/// One observed backend call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeRecord {
    pub system: System,
    pub success: bool,
    pub latency_ms: f64,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug)]
struct TrackerState {
    metrics: BTreeMap<System, PerformanceMetric>,
    recent: VecDeque<OutcomeRecord>,
}

/// Shared, lock-guarded performance tracker.
///
/// Constructed explicitly and injected (usually as `Arc<PerformanceTracker>`).
#[derive(Debug)]
pub struct PerformanceTracker {
    alpha: f64,
    capacity: usize,
    state: Mutex<TrackerState>,
}

impl PerformanceTracker {
    /// Tracker with the default smoothing factor and buffer capacity.
    pub fn new() -> Self {
        Self::with_settings(DEFAULT_EMA_ALPHA, DEFAULT_RECENT_CAPACITY)
    }

    /// Tracker with an explicit smoothing factor and buffer capacity.
    ///
    /// `alpha` is clamped to `(0, 1]` and `capacity` to at least 1.
    pub fn with_settings(alpha: f64, capacity: usize) -> Self {
        let alpha = if alpha.is_finite() {
            alpha.clamp(f64::EPSILON, 1.0)
        } else {
            DEFAULT_EMA_ALPHA
        };
        let capacity = capacity.max(1);
        let metrics = System::ALL
            .into_iter()
            .map(|s| (s, PerformanceMetric::seed(s)))
            .collect();
        Self {
            alpha,
            capacity,
            state: Mutex::new(TrackerState {
                metrics,
                recent: VecDeque::with_capacity(capacity),
            }),
        }
    }

    /// A poisoned lock only means a panicking thread lost one telemetry
    /// update, so the guard is recovered rather than propagated.
    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fold one outcome into the system's moving averages and the ring buffer.
    pub fn record_outcome(&self, system: System, success: bool, latency_ms: f64) {
        let latency_ms = if latency_ms.is_finite() {
            latency_ms.max(0.0)
        } else {
            0.0
        };
        let alpha = self.alpha;

        let updated = {
            let mut state = self.lock();
            let metric = state
                .metrics
                .entry(system)
                .or_insert_with(|| PerformanceMetric::seed(system));
            let observed = if success { 1.0 } else { 0.0 };
            metric.success_rate = (1.0 - alpha) * metric.success_rate + alpha * observed;
            metric.avg_latency_ms = (1.0 - alpha) * metric.avg_latency_ms + alpha * latency_ms;
            metric.operation_count += 1;
            let updated = *metric;

            if state.recent.len() >= self.capacity {
                state.recent.pop_front();
            }
            state.recent.push_back(OutcomeRecord {
                system,
                success,
                latency_ms,
                recorded_at: Utc::now(),
            });
            updated
        };

        recording::record_backend_operation(system, success, latency_ms);
        tracing::debug!(
            %system,
            success,
            latency_ms,
            success_rate = updated.success_rate,
            avg_latency_ms = updated.avg_latency_ms,
            "recorded backend outcome"
        );
    }

    /// Normalized performance score in `[0, 1]`.
    pub fn score(&self, system: System) -> f64 {
        self.metrics(system).score()
    }

    /// Score by serialized system name; unknown names get [`NEUTRAL_SCORE`].
    pub fn score_by_name(&self, name: &str) -> f64 {
        match System::from_str(name.trim()) {
            Ok(system) => self.score(system),
            Err(_) => NEUTRAL_SCORE,
        }
    }

    /// Current metric for one system.
    pub fn metrics(&self, system: System) -> PerformanceMetric {
        self.lock()
            .metrics
            .get(&system)
            .copied()
            .unwrap_or_else(|| PerformanceMetric::seed(system))
    }

    /// Copy of every system's metric.
    pub fn snapshot(&self) -> BTreeMap<System, PerformanceMetric> {
        self.lock().metrics.clone()
    }

    /// Recent outcomes, oldest first.
    pub fn recent_outcomes(&self) -> Vec<OutcomeRecord> {
        self.lock().recent.iter().cloned().collect()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl Default for PerformanceTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_scores() {
        let t = PerformanceTracker::new();
        // 0.7 * 0.95 + 0.3 * 0.95
        assert!((t.score(System::Cache) - 0.95).abs() < 1e-9);
        // 0.7 * 0.90 + 0.3 * 0.85
        assert!((t.score(System::Graph) - 0.885).abs() < 1e-9);
        // 0.7 * 0.85 + 0.3 * 0.80
        assert!((t.score(System::Document) - 0.835).abs() < 1e-9);
    }

    #[test]
    fn ema_update_formula() {
        let t = PerformanceTracker::new();
        t.record_outcome(System::Graph, false, 1150.0);
        let m = t.metrics(System::Graph);
        assert!((m.success_rate - 0.81).abs() < 1e-9);
        assert!((m.avg_latency_ms - 250.0).abs() < 1e-9);
        assert_eq!(m.operation_count, 1);
    }

    #[test]
    fn unknown_name_is_neutral() {
        let t = PerformanceTracker::new();
        assert_eq!(t.score_by_name("vector"), NEUTRAL_SCORE);
        assert_eq!(t.score_by_name(""), NEUTRAL_SCORE);
        assert!((t.score_by_name("cache") - t.score(System::Cache)).abs() < f64::EPSILON);
    }

    #[test]
    fn failures_rank_below_successes() {
        let t = PerformanceTracker::new();
        for _ in 0..3 {
            t.record_outcome(System::Graph, false, 100.0);
            t.record_outcome(System::Document, true, 100.0);
        }
        assert!(t.score(System::Graph) < t.score(System::Document));
    }

    #[test]
    fn ema_moves_monotonically_without_overshoot() {
        let t = PerformanceTracker::new();
        let mut prev = t.metrics(System::Cache);
        for _ in 0..200 {
            t.record_outcome(System::Cache, false, 800.0);
            let m = t.metrics(System::Cache);
            assert!(m.success_rate <= prev.success_rate);
            assert!(m.success_rate >= 0.0);
            assert!(m.avg_latency_ms >= prev.avg_latency_ms);
            assert!(m.avg_latency_ms <= 800.0);
            prev = m;
        }
    }

    #[test]
    fn ring_buffer_evicts_oldest() {
        let t = PerformanceTracker::with_settings(0.1, 3);
        for i in 0..5 {
            t.record_outcome(System::Cache, true, i as f64);
        }
        let recent = t.recent_outcomes();
        assert_eq!(recent.len(), 3);
        let latencies: Vec<f64> = recent.iter().map(|r| r.latency_ms).collect();
        assert_eq!(latencies, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn invalid_latency_is_sanitized() {
        let t = PerformanceTracker::new();
        t.record_outcome(System::Cache, true, f64::NAN);
        t.record_outcome(System::Cache, true, -10.0);
        assert!(t.metrics(System::Cache).avg_latency_ms.is_finite());
        assert!(t.recent_outcomes().iter().all(|r| r.latency_ms == 0.0));
    }

    #[test]
    fn settings_are_clamped() {
        let t = PerformanceTracker::with_settings(5.0, 0);
        assert_eq!(t.alpha(), 1.0);
        assert_eq!(t.capacity(), 1);
    }

    #[test]
    fn concurrent_updates_are_all_counted() {
        let t = std::sync::Arc::new(PerformanceTracker::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let t = t.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        t.record_outcome(System::Document, true, 10.0);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(t.metrics(System::Document).operation_count, 400);
        assert_eq!(t.recent_outcomes().len(), DEFAULT_RECENT_CAPACITY);
    }
}
