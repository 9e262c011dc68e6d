// SPDX-FileCopyrightText: 2026 Memroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend trait for the memory persistence systems (graph, cache, document).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::BackendError;
use crate::types::{HealthStatus, System, TaskContext};

/// A client for one backing memory system.
///
/// Implementations own their own timeouts and cancellation: the routing core
/// never wraps calls in a deadline. Results are opaque to the core.
#[async_trait]
pub trait MemoryBackend: Send + Sync + 'static {
    /// Which system this backend serves.
    fn system(&self) -> System;

    /// Persists a payload.
    async fn store(&self, payload: Value, task: &TaskContext) -> Result<Value, BackendError>;

    /// Runs a query against the backend.
    async fn retrieve(&self, query: Value, task: &TaskContext) -> Result<Value, BackendError>;

    /// Reports the backend's current status.
    async fn health_check(&self) -> Result<HealthStatus, BackendError> {
        Ok(HealthStatus::Healthy)
    }
}

/// Registered backends keyed by system.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: HashMap<System, Arc<dyn MemoryBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend under the system it reports. Replaces any previous one.
    pub fn register(&mut self, backend: Arc<dyn MemoryBackend>) {
        let system = backend.system();
        tracing::debug!(%system, "registered memory backend");
        self.backends.insert(system, backend);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, backend: Arc<dyn MemoryBackend>) -> Self {
        self.register(backend);
        self
    }

    /// Remove the backend for a system (used for disabled systems).
    pub fn remove(&mut self, system: System) -> Option<Arc<dyn MemoryBackend>> {
        self.backends.remove(&system)
    }

    /// Look up a backend, reporting a missing one as a per-system failure.
    pub fn get(&self, system: System) -> Result<Arc<dyn MemoryBackend>, BackendError> {
        self.backends
            .get(&system)
            .cloned()
            .ok_or(BackendError::NotConfigured(system))
    }

    pub fn contains(&self, system: System) -> bool {
        self.backends.contains_key(&system)
    }

    /// Registered systems in declaration order.
    pub fn systems(&self) -> Vec<System> {
        System::ALL
            .into_iter()
            .filter(|s| self.backends.contains_key(s))
            .collect()
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("systems", &self.systems())
            .finish()
    }
}
