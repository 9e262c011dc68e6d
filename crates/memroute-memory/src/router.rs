// SPDX-FileCopyrightText: 2026 Memroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `MemoryRouter` facade.
//!
//! Wires extraction, classification, scoring, fallback execution and
//! propagation around one shared [`PerformanceTracker`] and one audit sink.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use memroute_config::MemrouteConfig;
use memroute_core::{
    AuditEntry, AuditSink, BackendError, BackendRegistry, Context, HealthStatus, MemoryBackend,
    MemoryRequest, MemrouteError, NullAuditSink, Operation, Severity, System, TaskContext,
};
use memroute_resilience::{FallbackExecutor, FallbackOutcome, PerformanceMetric, PerformanceTracker};
use memroute_router::{
    EntityExtractor, IntentClassifier, IntentResult, RoutingDecision, RoutingEngine,
    RoutingWeights,
};
use serde::Serialize;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::propagation::{PropagationRequest, PropagationResult, Propagator};

/// Running counters kept by a router.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoutingStats {
    pub requests_routed: u64,
    pub multi_system_decisions: u64,
    pub primary_selections: BTreeMap<System, u64>,
    pub fallbacks_used: u64,
    pub exhausted: u64,
    pub propagations: u64,
    pub propagation_failures: u64,
    pub performance: BTreeMap<System, PerformanceMetric>,
}

/// Result of [`MemoryRouter::store_and_propagate`].
#[derive(Debug, Clone, Serialize)]
pub struct StoreReport {
    pub stored: FallbackOutcome<Value>,
    /// Per-target propagation results, keyed by system. Never contains
    /// `stored.system`.
    pub propagation: BTreeMap<System, PropagationResult>,
}

/// Builder for [`MemoryRouter`].
#[derive(Default)]
pub struct MemoryRouterBuilder {
    registry: BackendRegistry,
    tracker: Option<Arc<PerformanceTracker>>,
    audit: Option<Arc<dyn AuditSink>>,
    weights: Option<RoutingWeights>,
    disabled: BTreeSet<System>,
}

impl MemoryRouterBuilder {
    /// Register one backend.
    pub fn backend(mut self, backend: Arc<dyn MemoryBackend>) -> Self {
        self.registry.register(backend);
        self
    }

    /// Replace the whole backend registry.
    pub fn registry(mut self, registry: BackendRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Share an existing tracker.
    pub fn tracker(mut self, tracker: Arc<PerformanceTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn weights(mut self, weights: RoutingWeights) -> Self {
        self.weights = Some(weights);
        self
    }

    /// Switch a system off.
    pub fn disable(mut self, system: System) -> Self {
        self.disabled.insert(system);
        self
    }

    /// Apply routing weights, tracker settings, disabled systems and the
    /// audit sink from configuration. Explicit calls made afterwards win.
    pub fn config(mut self, config: &MemrouteConfig) -> Self {
        self.weights = Some(RoutingWeights::from(&config.routing));
        self.tracker = Some(Arc::new(PerformanceTracker::with_settings(
            config.tracker.ema_alpha,
            config.tracker.recent_capacity,
        )));
        self.disabled.extend(config.systems.disabled());
        self.audit = Some(memroute_audit::build_sink(&config.audit));
        self
    }

    pub fn build(self) -> MemoryRouter {
        let tracker = self
            .tracker
            .unwrap_or_else(|| Arc::new(PerformanceTracker::new()));
        let audit = self.audit.unwrap_or_else(|| Arc::new(NullAuditSink));
        let weights = self.weights.unwrap_or_default();

        debug!(
            backends = ?self.registry.systems(),
            disabled = ?self.disabled,
            "building memory router"
        );

        MemoryRouter {
            extractor: EntityExtractor::new(),
            classifier: IntentClassifier::new(),
            engine: RoutingEngine::new(weights, tracker.clone()),
            executor: FallbackExecutor::new(tracker.clone(), audit.clone()),
            propagator: Propagator::new(
                self.registry.clone(),
                tracker.clone(),
                audit.clone(),
                self.disabled.iter().copied(),
            ),
            registry: self.registry,
            tracker,
            audit,
            disabled: self.disabled,
            stats: Mutex::new(RoutingStats::default()),
        }
    }
}

/// Routes memory operations across the graph, cache and document systems.
pub struct MemoryRouter {
    registry: BackendRegistry,
    tracker: Arc<PerformanceTracker>,
    audit: Arc<dyn AuditSink>,
    extractor: EntityExtractor,
    classifier: IntentClassifier,
    engine: RoutingEngine,
    executor: FallbackExecutor,
    propagator: Propagator,
    disabled: BTreeSet<System>,
    stats: Mutex<RoutingStats>,
}

impl MemoryRouter {
    pub fn builder() -> MemoryRouterBuilder {
        MemoryRouterBuilder::default()
    }

    pub fn tracker(&self) -> &Arc<PerformanceTracker> {
        &self.tracker
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    pub fn is_enabled(&self, system: System) -> bool {
        !self.disabled.contains(&system)
    }

    fn with_stats(&self, f: impl FnOnce(&mut RoutingStats)) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut stats);
    }

    /// Classify free text.
    pub fn classify(&self, text: &str, context: Option<&Context>) -> IntentResult {
        self.classifier.classify(text, context)
    }

    /// Analyze a request and decide where it goes.
    ///
    /// Fills `request.entities` with the extracted entities.
    pub fn route(&self, request: &mut MemoryRequest) -> RoutingDecision {
        let started = Instant::now();

        request.entities = self.extractor.extract(request);
        let intent = self
            .classifier
            .classify(&request.content, request.context.as_ref());
        let scores = self.engine.score(
            intent.intent,
            &request.entities,
            &request.content,
            request.context.as_ref(),
        );
        let decision = self.engine.route(request, &intent, scores);
        let analysis_ms = started.elapsed().as_secs_f64() * 1000.0;

        self.with_stats(|stats| {
            stats.requests_routed += 1;
            if decision.multi_system {
                stats.multi_system_decisions += 1;
            }
            *stats.primary_selections.entry(decision.primary).or_insert(0) += 1;
        });

        self.audit.record(
            AuditEntry::new(
                "Automated Routing Decision",
                format!(
                    "Routed {} to {} ({})",
                    request.operation, decision.primary, decision.reasoning
                ),
                Severity::Low,
            )
            .with_metrics(json!({
                "intent": intent.intent,
                "intent_confidence": intent.confidence,
                "classifier_tier": intent.tier,
                "entity_count": request.entities.len(),
                "analysis_time_ms": analysis_ms,
                "confidence": decision.confidence,
                "multi_system": decision.multi_system,
                "secondaries": decision.secondaries,
            })),
        );

        decision
    }

    /// Route `request` and run it through the fallback chain.
    ///
    /// Store operations send `request.metadata` to `store`; every other
    /// operation sends it to `retrieve`. Secondaries in the decision are
    /// advisory and are not written to here.
    pub async fn execute_with_fallback(
        &self,
        request: &mut MemoryRequest,
        cancel: &CancellationToken,
    ) -> Result<FallbackOutcome<Value>, MemrouteError> {
        let decision = self.route(request);
        let task = TaskContext::new(request.content.clone(), request.context.clone());
        let payload = request.metadata.clone();
        let operation = request.operation;
        let label = operation.to_string();

        let result = self
            .executor
            .execute(decision.primary, &label, cancel, |system| {
                let payload = payload.clone();
                let task = &task;
                async move { self.call(system, operation, payload, task).await }
            })
            .await;

        match &result {
            Ok(outcome) if outcome.used_fallback => self.with_stats(|s| s.fallbacks_used += 1),
            Err(MemrouteError::AllSystemsExhausted { .. }) => self.with_stats(|s| s.exhausted += 1),
            _ => {}
        }
        result
    }

    /// One backend call. Disabled or unregistered systems fail immediately.
    async fn call(
        &self,
        system: System,
        operation: Operation,
        payload: Value,
        task: &TaskContext,
    ) -> Result<Value, BackendError> {
        if self.disabled.contains(&system) {
            return Err(BackendError::NotConfigured(system));
        }
        let backend = self.registry.get(system)?;
        match operation {
            Operation::Store => backend.store(payload, task).await,
            Operation::Query | Operation::Retrieve | Operation::Search => {
                backend.retrieve(payload, task).await
            }
        }
    }

    /// Store `data`, routed by `content`.
    pub async fn store(
        &self,
        data: Value,
        content: &str,
        context: Option<Context>,
        cancel: &CancellationToken,
    ) -> Result<FallbackOutcome<Value>, MemrouteError> {
        let mut request = build_request(Operation::Store, content, context, data);
        self.execute_with_fallback(&mut request, cancel).await
    }

    /// Retrieve with `query`, routed by `content`.
    pub async fn retrieve(
        &self,
        query: Value,
        content: &str,
        context: Option<Context>,
        cancel: &CancellationToken,
    ) -> Result<FallbackOutcome<Value>, MemrouteError> {
        let mut request = build_request(Operation::Retrieve, content, context, query);
        self.execute_with_fallback(&mut request, cancel).await
    }

    /// Store with fallback, then propagate from whichever system stored it.
    pub async fn store_and_propagate(
        &self,
        data: Value,
        content: &str,
        context: Option<Context>,
        data_type: &str,
        entity_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<StoreReport, MemrouteError> {
        let task = TaskContext::new(content, context.clone());
        let stored = self.store(data.clone(), content, context, cancel).await?;
        let propagation = self
            .propagate(&data, stored.system, data_type, entity_id, &task, cancel)
            .await;
        info!(
            stored_in = %stored.system,
            used_fallback = stored.used_fallback,
            propagated = propagation.len(),
            data_type,
            "store and propagate finished"
        );
        Ok(StoreReport {
            stored,
            propagation,
        })
    }

    /// Replicate `data` from `source` to the other systems its data type
    /// belongs in.
    pub async fn propagate(
        &self,
        data: &Value,
        source: System,
        data_type: &str,
        entity_id: Option<&str>,
        task: &TaskContext,
        cancel: &CancellationToken,
    ) -> BTreeMap<System, PropagationResult> {
        let results = self
            .propagator
            .propagate(
                PropagationRequest {
                    data,
                    source,
                    data_type,
                    entity_id,
                    task,
                },
                cancel,
            )
            .await;
        let failures = results.values().filter(|r| !r.is_success()).count() as u64;
        self.with_stats(|s| {
            s.propagations += 1;
            s.propagation_failures += failures;
        });
        results
    }

    /// Feed an externally observed outcome into the tracker.
    pub fn record_outcome(&self, system: System, success: bool, latency_ms: f64) {
        self.tracker.record_outcome(system, success, latency_ms);
    }

    /// Performance score by system name; unknown names are neutral.
    pub fn system_score(&self, name: &str) -> f64 {
        self.tracker.score_by_name(name)
    }

    /// Health of every registered backend.
    pub async fn health(&self) -> BTreeMap<System, HealthStatus> {
        let mut out = BTreeMap::new();
        for system in System::ALL {
            let status = if self.disabled.contains(&system) {
                HealthStatus::Unhealthy("disabled".into())
            } else {
                match self.registry.get(system) {
                    Ok(backend) => backend
                        .health_check()
                        .await
                        .unwrap_or_else(|e| HealthStatus::Unhealthy(e.to_string())),
                    Err(e) => HealthStatus::Unhealthy(e.to_string()),
                }
            };
            out.insert(system, status);
        }
        out
    }

    /// Counters plus a snapshot of tracker metrics.
    pub fn stats(&self) -> RoutingStats {
        let mut stats = self
            .stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        stats.performance = self.tracker.snapshot();
        stats
    }
}

impl std::fmt::Debug for MemoryRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRouter")
            .field("registry", &self.registry)
            .field("disabled", &self.disabled)
            .field("weights", self.engine.weights())
            .finish_non_exhaustive()
    }
}

fn build_request(
    operation: Operation,
    content: &str,
    context: Option<Context>,
    payload: Value,
) -> MemoryRequest {
    let request = MemoryRequest::new(operation, content).with_metadata(payload);
    match context {
        Some(context) => request.with_context(context),
        None => request,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let router = MemoryRouter::builder().build();
        assert!(router.registry().systems().is_empty());
        assert!(router.is_enabled(System::Graph));
        assert_eq!(router.stats().requests_routed, 0);
        assert_eq!(router.stats().performance.len(), 3);
    }

    #[test]
    fn config_disables_systems() {
        let mut config = MemrouteConfig::default();
        config.systems.document.enabled = false;
        config.audit.enabled = false;
        let router = MemoryRouter::builder().config(&config).build();
        assert!(!router.is_enabled(System::Document));
        assert!(router.is_enabled(System::Cache));
    }

    #[test]
    fn route_fills_entities_and_counts() {
        let router = MemoryRouter::builder().build();
        let mut request = MemoryRequest::new(
            Operation::Store,
            "Store the Apollo project notes for Alice Smith",
        );
        let decision = router.route(&mut request);
        assert!(!request.entities.is_empty());
        let stats = router.stats();
        assert_eq!(stats.requests_routed, 1);
        assert_eq!(stats.primary_selections.get(&decision.primary), Some(&1));
    }

    #[test]
    fn unknown_system_score_is_neutral() {
        let router = MemoryRouter::builder().build();
        assert_eq!(router.system_score("vector"), 0.5);
    }
}
