// SPDX-FileCopyrightText: 2026 Memroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! System scoring and routing decisions.
//!
//! Combines the classified intent, extracted entities, content shape and
//! live tracker scores into one score per memory system, then picks the
//! primary and any secondaries.

use std::collections::BTreeMap;
use std::sync::Arc;

use memroute_config::model::RoutingConfig;
use memroute_core::{Context, EntityKind, ExtractedEntity, MemoryRequest, System};
use memroute_resilience::PerformanceTracker;
use serde::Serialize;
use tracing::debug;

use crate::classifier::{Intent, IntentResult};

/// Words that force a fan-out to every system.
const FAN_OUT_KEYWORDS: &[&str] = &["complete", "full", "comprehensive", "everything"];

/// Tunable routing weights.
///
/// The first six fields come from `[routing]` config; the rest are fixed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingWeights {
    /// Runner-up/top score ratio at or above which the runner-up is added.
    pub near_tie_ratio: f64,
    pub graph_entity_boost: f64,
    pub document_entity_boost: f64,
    pub cache_entity_boost: f64,
    pub long_content_chars: usize,
    pub short_content_chars: usize,
    /// Starting score of every system.
    pub floor: f64,
    /// Bonus of the most preferred system for an intent.
    pub top_rank_bonus: f64,
    /// Bonus lost per preference rank.
    pub rank_decay: f64,
    pub long_content_document_factor: f64,
    pub long_content_cache_factor: f64,
    pub short_content_cache_factor: f64,
    pub urgent_cache_factor: f64,
    pub urgent_graph_factor: f64,
}

impl Default for RoutingWeights {
    fn default() -> Self {
        Self::from(&RoutingConfig::default())
    }
}

impl From<&RoutingConfig> for RoutingWeights {
    fn from(config: &RoutingConfig) -> Self {
        Self {
            near_tie_ratio: config.near_tie_ratio,
            graph_entity_boost: config.graph_entity_boost,
            document_entity_boost: config.document_entity_boost,
            cache_entity_boost: config.cache_entity_boost,
            long_content_chars: config.long_content_chars,
            short_content_chars: config.short_content_chars,
            floor: 0.1,
            top_rank_bonus: 1.0,
            rank_decay: 0.2,
            long_content_document_factor: 1.2,
            long_content_cache_factor: 0.9,
            short_content_cache_factor: 1.1,
            urgent_cache_factor: 1.2,
            urgent_graph_factor: 0.9,
        }
    }
}

/// Preferred systems per intent, most preferred first.
pub fn preferred_systems(intent: Intent) -> &'static [System] {
    match intent {
        Intent::CreateRelation | Intent::QueryRelation => &[System::Graph, System::Cache],
        Intent::TraverseGraph => &[System::Graph],
        Intent::WriteDoc | Intent::ReadDoc => &[System::Document, System::Cache],
        Intent::SemanticSearch => &[System::Cache, System::Graph],
        Intent::ContextRetrieval => &[System::Cache],
        Intent::MemoryLookup => &[System::Cache, System::Document],
        Intent::ComprehensiveStore => &[System::Graph, System::Cache, System::Document],
        Intent::Unknown => &[System::Cache],
    }
}

/// Per-request score for every system.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SystemScores(BTreeMap<System, f64>);

impl SystemScores {
    /// Every system at the same starting value.
    pub fn uniform(value: f64) -> Self {
        Self(System::ALL.into_iter().map(|s| (s, value)).collect())
    }

    pub fn get(&self, system: System) -> f64 {
        self.0.get(&system).copied().unwrap_or(0.0)
    }

    fn add(&mut self, system: System, delta: f64) {
        *self.0.entry(system).or_insert(0.0) += delta;
    }

    fn scale(&mut self, system: System, factor: f64) {
        if let Some(score) = self.0.get_mut(&system) {
            *score *= factor;
        }
    }

    /// Systems by descending score; equal scores keep declaration order.
    pub fn ranked(&self) -> Vec<(System, f64)> {
        let mut ranked: Vec<(System, f64)> = self.0.iter().map(|(s, v)| (*s, *v)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
    }

    pub fn iter(&self) -> impl Iterator<Item = (System, f64)> + '_ {
        self.0.iter().map(|(s, v)| (*s, *v))
    }
}

/// Where one request should go.
#[derive(Debug, Clone, Serialize)]
pub struct RoutingDecision {
    pub primary: System,
    /// Extra systems to involve, in score order.
    pub secondaries: Vec<System>,
    /// The primary's raw score.
    pub confidence: f64,
    pub multi_system: bool,
    pub reasoning: String,
    /// Classification the decision was made from.
    pub classification: IntentResult,
    pub scores: SystemScores,
}

impl RoutingDecision {
    /// Primary followed by secondaries.
    pub fn targets(&self) -> Vec<System> {
        let mut targets = Vec::with_capacity(1 + self.secondaries.len());
        targets.push(self.primary);
        targets.extend(self.secondaries.iter().copied());
        targets
    }
}

/// Scores systems and builds routing decisions.
#[derive(Debug, Clone)]
pub struct RoutingEngine {
    weights: RoutingWeights,
    tracker: Arc<PerformanceTracker>,
}

impl RoutingEngine {
    pub fn new(weights: RoutingWeights, tracker: Arc<PerformanceTracker>) -> Self {
        Self { weights, tracker }
    }

    pub fn weights(&self) -> &RoutingWeights {
        &self.weights
    }

    /// Score every system for one request.
    pub fn score(
        &self,
        intent: Intent,
        entities: &[ExtractedEntity],
        content: &str,
        context: Option<&Context>,
    ) -> SystemScores {
        let w = &self.weights;
        let mut scores = SystemScores::uniform(w.floor);

        for (rank, system) in preferred_systems(intent).iter().enumerate() {
            scores.add(*system, w.top_rank_bonus - w.rank_decay * rank as f64);
        }

        let relational = entities
            .iter()
            .filter(|e| matches!(e.kind, EntityKind::Person | EntityKind::Organization))
            .count();
        if relational >= 2 {
            scores.add(System::Graph, w.graph_entity_boost);
        }
        if entities
            .iter()
            .any(|e| matches!(e.kind, EntityKind::Document | EntityKind::Concept))
        {
            scores.add(System::Document, w.document_entity_boost);
        }
        if entities.len() > 3 {
            scores.add(System::Cache, w.cache_entity_boost);
        }

        for system in System::ALL {
            scores.scale(system, self.tracker.score(system));
        }

        let length = content.chars().count();
        if length > w.long_content_chars {
            scores.scale(System::Document, w.long_content_document_factor);
            scores.scale(System::Cache, w.long_content_cache_factor);
        } else if length < w.short_content_chars {
            scores.scale(System::Cache, w.short_content_cache_factor);
        }

        let urgent = context
            .and_then(|c| c.get("urgency"))
            .and_then(|v| v.as_str())
            .is_some_and(|u| u == "high");
        if urgent {
            scores.scale(System::Cache, w.urgent_cache_factor);
            scores.scale(System::Graph, w.urgent_graph_factor);
        }

        scores
    }

    /// Turn scores into a decision for `request`.
    pub fn route(
        &self,
        request: &MemoryRequest,
        intent: &IntentResult,
        scores: SystemScores,
    ) -> RoutingDecision {
        let ranked = scores.ranked();
        let (primary, top) = ranked[0];

        let mut secondaries = Vec::new();
        let mut multi_system = false;

        if let Some((runner_up, second)) = ranked.get(1).copied() {
            if top > 0.0 && second >= self.weights.near_tie_ratio * top {
                secondaries.push(runner_up);
                multi_system = true;
            }
        }

        let lower = request.content.to_lowercase();
        let fan_out = FAN_OUT_KEYWORDS.iter().any(|k| lower.contains(k));
        if fan_out {
            secondaries = ranked.iter().skip(1).map(|(s, _)| *s).collect();
            multi_system = true;
        }

        let reasoning = format!(
            "Intent-based routing ({}, {:.2}) with performance weighting. Primary score: {:.2}{}",
            intent.intent,
            intent.confidence,
            top,
            if fan_out {
                "; comprehensive request fans out to all systems"
            } else if multi_system {
                "; near-tie with runner-up"
            } else {
                ""
            }
        );

        debug!(
            %primary,
            confidence = top,
            multi_system,
            secondaries = ?secondaries,
            intent = %intent.intent,
            "routing decision"
        );

        RoutingDecision {
            primary,
            secondaries,
            confidence: top,
            multi_system,
            reasoning,
            classification: intent.clone(),
            scores,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ClassifierTier, IntentClassifier};
    use memroute_core::Operation;
    use serde_json::json;

    fn engine() -> (RoutingEngine, Arc<PerformanceTracker>) {
        let tracker = Arc::new(PerformanceTracker::new());
        (
            RoutingEngine::new(RoutingWeights::default(), tracker.clone()),
            tracker,
        )
    }

    fn intent(i: Intent) -> IntentResult {
        IntentResult {
            intent: i,
            confidence: 0.5,
            tier: ClassifierTier::Rich,
            reason: "test",
            patterns_matched: vec![],
        }
    }

    fn entity(kind: EntityKind) -> ExtractedEntity {
        ExtractedEntity {
            name: "X".into(),
            kind,
            confidence: 0.8,
            span: None,
        }
    }

    #[test]
    fn relation_query_routes_to_graph_with_near_tie() {
        let (engine, _) = engine();
        let text = "Find relationships between user and projects";
        let result = IntentClassifier::new().classify(text, None);
        let scores = engine.score(result.intent, &[], text, None);

        // graph: 1.1 * 0.885, cache: 0.9 * 0.95 * 1.1 (short content)
        assert!((scores.get(System::Graph) - 0.9735).abs() < 1e-9);
        assert!((scores.get(System::Cache) - 0.9405).abs() < 1e-9);

        let req = MemoryRequest::new(Operation::Query, text);
        let decision = engine.route(&req, &result, scores);
        assert_eq!(decision.primary, System::Graph);
        assert!(decision.multi_system);
        assert_eq!(decision.secondaries, vec![System::Cache]);
        assert!((decision.confidence - 0.9735).abs() < 1e-9);
        assert_eq!(decision.classification.intent, Intent::QueryRelation);
        assert_eq!(decision.classification.tier, ClassifierTier::Rich);
    }

    #[test]
    fn context_retrieval_routes_to_cache() {
        let (engine, _) = engine();
        let text = "Remember our previous conversation";
        let result = IntentClassifier::new().classify(text, None);
        let scores = engine.score(result.intent, &[], text, None);
        let decision =
            engine.route(&MemoryRequest::new(Operation::Retrieve, text), &result, scores);
        assert_eq!(decision.primary, System::Cache);
        assert!(!decision.multi_system);
        assert!(decision.secondaries.is_empty());
    }

    #[test]
    fn floor_applies_to_unpreferred_systems() {
        let (engine, tracker) = engine();
        let scores = engine.score(Intent::TraverseGraph, &[], &"x".repeat(500), None);
        let doc = 0.1 * tracker.score(System::Document);
        assert!((scores.get(System::Document) - doc).abs() < 1e-12);
        assert!((scores.get(System::Cache) - 0.1 * tracker.score(System::Cache)).abs() < 1e-12);
    }

    #[test]
    fn entity_boosts() {
        let (engine, tracker) = engine();
        let content = "x".repeat(500);
        let entities = vec![
            entity(EntityKind::Person),
            entity(EntityKind::Organization),
            entity(EntityKind::Concept),
            entity(EntityKind::Project),
        ];
        let scores = engine.score(Intent::Unknown, &entities, &content, None);
        assert!((scores.get(System::Graph) - 0.4 * tracker.score(System::Graph)).abs() < 1e-12);
        let doc = 0.3 * tracker.score(System::Document);
        assert!((scores.get(System::Document) - doc).abs() < 1e-12);
        assert!((scores.get(System::Cache) - 1.2 * tracker.score(System::Cache)).abs() < 1e-12);
    }

    #[test]
    fn one_person_does_not_boost_graph() {
        let (engine, tracker) = engine();
        let content = "x".repeat(500);
        let scores = engine.score(Intent::Unknown, &[entity(EntityKind::Person)], &content, None);
        assert!((scores.get(System::Graph) - 0.1 * tracker.score(System::Graph)).abs() < 1e-12);
    }

    #[test]
    fn long_content_favors_documents() {
        let (engine, tracker) = engine();
        let long = "y".repeat(1500);
        let scores = engine.score(Intent::MemoryLookup, &[], &long, None);
        let doc = (0.1 + 0.8) * tracker.score(System::Document) * 1.2;
        let cache = (0.1 + 1.0) * tracker.score(System::Cache) * 0.9;
        assert!((scores.get(System::Document) - doc).abs() < 1e-12);
        assert!((scores.get(System::Cache) - cache).abs() < 1e-12);
    }

    #[test]
    fn high_urgency_favors_cache() {
        let (engine, tracker) = engine();
        let mut ctx = Context::new();
        ctx.insert("urgency".into(), json!("high"));
        let content = "z".repeat(500);
        let scores = engine.score(Intent::QueryRelation, &[], &content, Some(&ctx));
        let graph = 1.1 * tracker.score(System::Graph) * 0.9;
        let cache = 0.9 * tracker.score(System::Cache) * 1.2;
        assert!((scores.get(System::Graph) - graph).abs() < 1e-12);
        assert!((scores.get(System::Cache) - cache).abs() < 1e-12);
    }

    #[test]
    fn degraded_system_is_deprioritized_not_excluded() {
        let (engine, tracker) = engine();
        for _ in 0..30 {
            tracker.record_outcome(System::Graph, false, 900.0);
        }
        let text = "Find relationships between user and projects";
        let scores = engine.score(Intent::QueryRelation, &[], text, None);
        assert!(scores.get(System::Graph) > 0.0);
        let decision = engine.route(
            &MemoryRequest::new(Operation::Query, text),
            &intent(Intent::QueryRelation),
            scores,
        );
        assert_eq!(decision.primary, System::Cache);
    }

    #[test]
    fn fan_out_keyword_overrides_secondaries() {
        let (engine, _) = engine();
        let text = "Store the complete profile";
        let scores = engine.score(Intent::ContextRetrieval, &[], text, None);
        let decision = engine.route(
            &MemoryRequest::new(Operation::Store, text),
            &intent(Intent::ContextRetrieval),
            scores,
        );
        assert_eq!(decision.primary, System::Cache);
        assert!(decision.multi_system);
        assert_eq!(decision.secondaries.len(), 2);
        assert!(!decision.secondaries.contains(&System::Cache));
        // score order: graph (0.1 * 0.885) ahead of document (0.1 * 0.835)
        assert_eq!(decision.secondaries, vec![System::Graph, System::Document]);
        assert_eq!(decision.targets().len(), 3);
    }

    #[test]
    fn ranked_ties_use_declaration_order() {
        let scores = SystemScores::uniform(0.5);
        let order: Vec<System> = scores.ranked().into_iter().map(|(s, _)| s).collect();
        assert_eq!(order, vec![System::Graph, System::Cache, System::Document]);
    }

    #[test]
    fn weights_follow_config() {
        let config = RoutingConfig {
            near_tie_ratio: 0.99,
            ..RoutingConfig::default()
        };
        let tracker = Arc::new(PerformanceTracker::new());
        let engine = RoutingEngine::new(RoutingWeights::from(&config), tracker);
        let text = "Find relationships between user and projects";
        let scores = engine.score(Intent::QueryRelation, &[], text, None);
        let decision = engine.route(
            &MemoryRequest::new(Operation::Query, text),
            &intent(Intent::QueryRelation),
            scores,
        );
        assert_eq!(decision.primary, System::Graph);
        assert!(!decision.multi_system);
    }
}
