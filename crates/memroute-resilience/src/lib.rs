// SPDX-FileCopyrightText: 2026 Memroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilience primitives for the memroute router.
//!
//! This crate provides:
//! - [`PerformanceTracker`]: EMA telemetry per memory system, shared across requests
//! - [`FallbackExecutor`]: the primary-then-fallbacks state machine
//! - [`recording`]: metrics-facade helpers for backend outcomes

pub mod fallback;
pub mod recording;
pub mod tracker;

pub use fallback::{FallbackExecutor, FallbackOutcome, fallback_chain, fallbacks};
pub use tracker::{NEUTRAL_SCORE, OutcomeRecord, PerformanceMetric, PerformanceTracker};
