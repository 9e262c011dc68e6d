// SPDX-FileCopyrightText: 2026 Memroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request analysis and system selection for memroute.
//!
//! This crate provides:
//! - [`EntityExtractor`]: pattern-based entity extraction from request text
//! - [`IntentClassifier`]: tiered intent classification (rich patterns, keywords, fallback)
//! - [`RoutingEngine`]: performance-weighted scoring and primary/secondary selection
//!
//! Everything here is synchronous and side-effect free apart from reading
//! the shared [`memroute_resilience::PerformanceTracker`].

pub mod classifier;
pub mod engine;
pub mod entities;
pub mod keyword;

pub use classifier::{ClassifierTier, Intent, IntentClassifier, IntentResult};
pub use engine::{RoutingDecision, RoutingEngine, RoutingWeights, SystemScores, preferred_systems};
pub use entities::EntityExtractor;
pub use keyword::{KeywordAnalysis, KeywordAnalyzer, OperationKind, TaskCategory, fallback_intent};
