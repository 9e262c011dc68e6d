// SPDX-FileCopyrightText: 2026 Memroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-effort cross-system propagation.
//!
//! After a successful write, the same data is replicated to the other systems
//! a static policy names for its data type. Every target is attempted
//! independently and concurrently; failures are reported in the result map
//! and never abort the remaining targets. There is no cross-system atomicity.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use memroute_core::{
    AuditEntry, AuditSink, BackendError, BackendRegistry, Severity, System, TaskContext,
};
use memroute_resilience::PerformanceTracker;
use serde::Serialize;
use serde_json::{Map, Value, json};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Detail reported for targets skipped because the request was cancelled.
pub const CANCELLED_DETAIL: &str = "skipped: request cancelled";

/// Entity named in audit entries and document titles when none is given.
const UNKNOWN_ENTITY: &str = "unknown";

/// Systems a data type is replicated to. Unknown data types have none.
pub fn policy_targets(data_type: &str) -> &'static [System] {
    match data_type {
        "user_profile" => &[System::Graph, System::Cache, System::Document],
        "relationship" => &[System::Graph, System::Cache],
        "documentation" => &[System::Document, System::Cache],
        "conversation_context" => &[System::Cache],
        "preference" => &[System::Cache, System::Graph],
        "entity" => &[System::Graph, System::Document],
        _ => &[],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropagationStatus {
    Success,
    Error,
}

impl fmt::Display for PropagationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropagationStatus::Success => f.write_str("success"),
            PropagationStatus::Error => f.write_str("error"),
        }
    }
}

/// Outcome for one propagation target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropagationResult {
    pub status: PropagationStatus,
    /// Backend response on success, error message otherwise.
    pub detail: Value,
}

impl PropagationResult {
    pub fn success(detail: Value) -> Self {
        Self {
            status: PropagationStatus::Success,
            detail,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: PropagationStatus::Error,
            detail: Value::String(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == PropagationStatus::Success
    }
}

/// One propagation request.
#[derive(Debug, Clone, Copy)]
pub struct PropagationRequest<'a> {
    pub data: &'a Value,
    /// System that already holds the data.
    pub source: System,
    pub data_type: &'a str,
    pub entity_id: Option<&'a str>,
    pub task: &'a TaskContext,
}

/// Replicates successful writes to secondary systems.
#[derive(Clone)]
pub struct Propagator {
    registry: BackendRegistry,
    tracker: Arc<PerformanceTracker>,
    audit: Arc<dyn AuditSink>,
    disabled: BTreeSet<System>,
}

impl Propagator {
    pub fn new(
        registry: BackendRegistry,
        tracker: Arc<PerformanceTracker>,
        audit: Arc<dyn AuditSink>,
        disabled: impl IntoIterator<Item = System>,
    ) -> Self {
        Self {
            registry,
            tracker,
            audit,
            disabled: disabled.into_iter().collect(),
        }
    }

    /// Policy targets minus the source and any disabled system.
    pub fn targets(&self, source: System, data_type: &str) -> Vec<System> {
        policy_targets(data_type)
            .iter()
            .copied()
            .filter(|s| *s != source && !self.disabled.contains(s))
            .collect()
    }

    /// Replicate `req.data` to every eligible target.
    ///
    /// The source system is never a key of the returned map.
    pub async fn propagate(
        &self,
        req: PropagationRequest<'_>,
        cancel: &CancellationToken,
    ) -> BTreeMap<System, PropagationResult> {
        let targets = self.targets(req.source, req.data_type);
        if targets.is_empty() {
            debug!(
                source = %req.source,
                data_type = req.data_type,
                "no propagation targets"
            );
            return BTreeMap::new();
        }

        if cancel.is_cancelled() {
            warn!(
                source = %req.source,
                data_type = req.data_type,
                targets = ?targets,
                "request cancelled before propagation"
            );
            let results: BTreeMap<System, PropagationResult> = targets
                .into_iter()
                .map(|s| (s, PropagationResult::error(CANCELLED_DETAIL)))
                .collect();
            self.summarize(&req, &results);
            return results;
        }

        let calls = targets.iter().map(|&target| async move {
            let result = self.propagate_to(target, &req).await;
            (target, result)
        });
        let results: BTreeMap<System, PropagationResult> =
            join_all(calls).await.into_iter().collect();

        self.summarize(&req, &results);
        results
    }

    async fn propagate_to(
        &self,
        target: System,
        req: &PropagationRequest<'_>,
    ) -> PropagationResult {
        let backend = match self.registry.get(target) {
            Ok(backend) => backend,
            Err(e) => {
                self.tracker.record_outcome(target, false, 0.0);
                return PropagationResult::error(e.to_string());
            }
        };

        let payload = prepare_payload(target, req);
        let started = Instant::now();
        let outcome: Result<Value, BackendError> = backend.store(payload, req.task).await;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        match outcome {
            Ok(response) => {
                self.tracker.record_outcome(target, true, latency_ms);
                debug!(%target, data_type = req.data_type, latency_ms, "propagated");
                PropagationResult::success(response)
            }
            Err(e) => {
                self.tracker.record_outcome(target, false, latency_ms);
                warn!(%target, data_type = req.data_type, error = %e, "propagation failed");
                PropagationResult::error(e.to_string())
            }
        }
    }

    fn summarize(
        &self,
        req: &PropagationRequest<'_>,
        results: &BTreeMap<System, PropagationResult>,
    ) {
        let entity = req.entity_id.unwrap_or(UNKNOWN_ENTITY);
        let failed: Vec<String> = results
            .iter()
            .filter(|(_, r)| !r.is_success())
            .map(|(s, _)| s.to_string())
            .collect();
        let succeeded: Vec<String> = results
            .iter()
            .filter(|(_, r)| r.is_success())
            .map(|(s, _)| s.to_string())
            .collect();
        let metrics = json!({
            "entity_id": entity,
            "data_type": req.data_type,
            "source": req.source.to_string(),
            "succeeded": succeeded,
            "failed": failed,
        });

        if failed.is_empty() {
            info!(
                source = %req.source,
                data_type = req.data_type,
                entity,
                targets = results.len(),
                "propagation complete"
            );
            self.audit.record(
                AuditEntry::new(
                    "Propagation Complete",
                    format!(
                        "{} for entity '{entity}' propagated from {} to {}",
                        req.data_type,
                        req.source,
                        succeeded.join(", ")
                    ),
                    Severity::Low,
                )
                .with_metrics(metrics),
            );
        } else {
            warn!(
                source = %req.source,
                data_type = req.data_type,
                entity,
                failed = ?failed,
                "propagation incomplete"
            );
            self.audit.record(
                AuditEntry::new(
                    "Data Inconsistency",
                    format!("Propagation failure for entity '{entity}' across systems"),
                    Severity::High,
                )
                .with_context(format!(
                    "Systems involved: {}. Implement sync mechanism.",
                    failed.join(", ")
                ))
                .with_metrics(metrics),
            );
        }
    }
}

impl fmt::Debug for Propagator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Propagator")
            .field("registry", &self.registry)
            .field("disabled", &self.disabled)
            .finish_non_exhaustive()
    }
}

/// Build the payload sent to one target.
///
/// Non-object data is wrapped as `{"value": data}`.
pub fn prepare_payload(target: System, req: &PropagationRequest<'_>) -> Value {
    let mut payload: Map<String, Value> = match req.data {
        Value::Object(map) => map.clone(),
        other => {
            let mut map = Map::new();
            map.insert("value".into(), other.clone());
            map
        }
    };
    let entity = req.entity_id.unwrap_or(UNKNOWN_ENTITY);

    match target {
        System::Graph if req.data_type == "relationship" => {
            let relation = json!({
                "source": req.data.get("source").cloned().unwrap_or(Value::Null),
                "target": req.data.get("target").cloned().unwrap_or(Value::Null),
                "relation_type": req.data.get("relation_type").cloned().unwrap_or(Value::Null),
                "properties": req.data.get("properties").cloned().unwrap_or_else(|| json!({})),
            });
            payload.insert("relations".into(), Value::Array(vec![relation]));
        }
        System::Document => {
            if !payload.contains_key("title") {
                payload.insert(
                    "title".into(),
                    Value::String(format!("{} - {entity}", title_case(req.data_type))),
                );
            }
            if !payload.contains_key("content") {
                let content = serde_json::to_string_pretty(req.data)
                    .unwrap_or_else(|_| req.data.to_string());
                payload.insert("content".into(), Value::String(content));
            }
        }
        _ => {}
    }

    payload.insert(
        "_propagation_metadata".into(),
        json!({
            "entity_id": req.entity_id,
            "data_type": req.data_type,
            "propagation_task": req.task.task,
            "propagated_at": req.data.get("timestamp").cloned().unwrap_or(Value::Null),
        }),
    );
    Value::Object(payload)
}

/// `user_profile` -> `User Profile`.
fn title_case(data_type: &str) -> String {
    data_type
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
