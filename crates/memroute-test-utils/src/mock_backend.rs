// SPDX-FileCopyrightText: 2026 Memroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted memory backend for deterministic testing.
//!
//! `MockBackend` implements `MemoryBackend` with a FIFO of pre-configured
//! outcomes and records every payload it receives.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use memroute_core::{BackendError, HealthStatus, MemoryBackend, System, TaskContext};

/// One scripted response.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Succeed(Value),
    Fail(String),
    Unavailable(String),
}

/// A memory backend that replays scripted outcomes.
///
/// Outcomes are popped from a FIFO queue. When the queue is empty the
/// backend either echoes `{"system": .., "stored"|"results": ..}` or fails,
/// depending on how it was constructed.
#[derive(Debug)]
pub struct MockBackend {
    system: System,
    script: Arc<Mutex<VecDeque<MockOutcome>>>,
    always_fail: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
    stored: Mutex<Vec<Value>>,
    queries: Mutex<Vec<Value>>,
    tasks: Mutex<Vec<String>>,
}

impl MockBackend {
    /// A backend that succeeds unless scripted otherwise.
    pub fn new(system: System) -> Self {
        Self {
            system,
            script: Arc::new(Mutex::new(VecDeque::new())),
            always_fail: false,
            delay: None,
            calls: AtomicUsize::new(0),
            stored: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// A backend that fails every call unless scripted otherwise.
    pub fn failing(system: System) -> Self {
        Self {
            always_fail: true,
            ..Self::new(system)
        }
    }

    /// Pre-load outcomes, consumed one per call.
    pub fn with_script(self, outcomes: Vec<MockOutcome>) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::from(outcomes))),
            ..self
        }
    }

    /// Sleep this long before answering each call.
    pub fn with_delay(self, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..self
        }
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Append an outcome to the script.
    pub async fn push(&self, outcome: MockOutcome) {
        self.script.lock().await.push_back(outcome);
    }

    /// Total store and retrieve calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Payloads passed to `store`, in call order.
    pub async fn stored(&self) -> Vec<Value> {
        self.stored.lock().await.clone()
    }

    /// Queries passed to `retrieve`, in call order.
    pub async fn queries(&self) -> Vec<Value> {
        self.queries.lock().await.clone()
    }

    /// Task descriptions seen, in call order.
    pub async fn tasks(&self) -> Vec<String> {
        self.tasks.lock().await.clone()
    }

    async fn respond(&self, kind: &str, input: &Value) -> Result<Value, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.script.lock().await.pop_front();
        let outcome = match scripted {
            Some(outcome) => outcome,
            None if self.always_fail => MockOutcome::Unavailable("mock backend down".into()),
            None => MockOutcome::Succeed(json!({
                "system": self.system.to_string(),
                kind: input.clone(),
            })),
        };

        tracing::trace!(system = %self.system, kind, ?outcome, "mock backend call");
        match outcome {
            MockOutcome::Succeed(value) => Ok(value),
            MockOutcome::Fail(message) => Err(BackendError::operation(self.system, message)),
            MockOutcome::Unavailable(message) => Err(BackendError::Unavailable {
                system: self.system,
                message,
            }),
        }
    }
}

#[async_trait]
impl MemoryBackend for MockBackend {
    fn system(&self) -> System {
        self.system
    }

    async fn store(&self, payload: Value, task: &TaskContext) -> Result<Value, BackendError> {
        self.stored.lock().await.push(payload.clone());
        self.tasks.lock().await.push(task.task.clone());
        self.respond("stored", &payload).await
    }

    async fn retrieve(&self, query: Value, task: &TaskContext) -> Result<Value, BackendError> {
        self.queries.lock().await.push(query.clone());
        self.tasks.lock().await.push(task.task.clone());
        self.respond("results", &query).await
    }

    async fn health_check(&self) -> Result<HealthStatus, BackendError> {
        if self.always_fail {
            Ok(HealthStatus::Unhealthy("mock backend down".into()))
        } else {
            Ok(HealthStatus::Healthy)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn script_then_default() {
        let backend = MockBackend::new(System::Cache)
            .with_script(vec![MockOutcome::Fail("boom".into())]);
        let task = TaskContext::new("t", None);

        assert!(backend.store(json!({"a": 1}), &task).await.is_err());
        let ok = backend.store(json!({"a": 2}), &task).await.unwrap();
        assert_eq!(ok["system"], "cache");
        assert_eq!(ok["stored"]["a"], 2);
        assert_eq!(backend.calls(), 2);
        assert_eq!(backend.stored().await.len(), 2);
    }

    #[tokio::test]
    async fn failing_backend_is_unavailable() {
        let backend = MockBackend::failing(System::Graph);
        let err = backend
            .retrieve(json!({"q": "x"}), &TaskContext::new("t", None))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Unavailable { system: System::Graph, .. }));
        assert!(matches!(
            backend.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
    }
}
