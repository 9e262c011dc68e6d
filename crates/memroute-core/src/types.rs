// SPDX-FileCopyrightText: 2026 Memroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the classifier, routing engine, executor and backends.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Free-form request context (a JSON object).
pub type Context = serde_json::Map<String, serde_json::Value>;

/// One of the backing memory systems.
///
/// Declaration order (`Graph`, `Cache`, `Document`) is the deterministic
/// tie-break order used wherever two systems score identically.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum System {
    /// Graph / relationship store.
    Graph,
    /// Fast cache / semantic store.
    Cache,
    /// Document / note store.
    Document,
}

impl System {
    /// All systems in declaration order.
    pub const ALL: [System; 3] = [System::Graph, System::Cache, System::Document];

    /// Position in declaration order.
    pub fn ordinal(self) -> usize {
        match self {
            System::Graph => 0,
            System::Cache => 1,
            System::Document => 2,
        }
    }
}

/// Kind of memory operation requested by the caller.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Store,
    Query,
    Retrieve,
    Search,
}

/// Audit severity, ordered from least to most severe.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Health status reported by backend health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Backend is fully operational.
    Healthy,
    /// Backend is operational but experiencing issues.
    Degraded(String),
    /// Backend is not operational.
    Unhealthy(String),
}

/// Kind of a named entity pulled out of request text.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Person,
    Project,
    Document,
    Concept,
    Organization,
}

/// A candidate named entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    pub name: String,
    pub kind: EntityKind,
    /// Extraction confidence (0.0-1.0).
    #[serde(default = "default_entity_confidence")]
    pub confidence: f64,
    /// Text that produced the match, when extracted lexically.
    #[serde(default)]
    pub span: Option<String>,
}

fn default_entity_confidence() -> f64 {
    1.0
}

/// A single memory operation as received from the caller.
///
/// Request-scoped: built per call and discarded afterwards. `entities` is
/// filled in place during routing.
#[derive(Debug, Clone)]
pub struct MemoryRequest {
    pub operation: Operation,
    pub content: String,
    pub context: Option<Context>,
    pub entities: Vec<ExtractedEntity>,
    /// Opaque payload (data to store, or query to run).
    pub metadata: serde_json::Value,
}

impl MemoryRequest {
    /// Create a request with no context and an empty payload.
    pub fn new(operation: Operation, content: impl Into<String>) -> Self {
        Self {
            operation,
            content: content.into(),
            context: None,
            entities: Vec::new(),
            metadata: serde_json::Value::Null,
        }
    }

    /// Attach a context map.
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    /// Attach the opaque payload.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Look up a string value in the request context.
    pub fn context_str(&self, key: &str) -> Option<&str> {
        self.context
            .as_ref()
            .and_then(|c| c.get(key))
            .and_then(|v| v.as_str())
    }
}

/// Task information handed to a backend alongside the payload.
#[derive(Debug, Clone, Default)]
pub struct TaskContext {
    /// Free-text task description (the request content).
    pub task: String,
    pub context: Option<Context>,
}

impl TaskContext {
    pub fn new(task: impl Into<String>, context: Option<Context>) -> Self {
        Self {
            task: task.into(),
            context,
        }
    }
}

/// A write-only audit record.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub category: String,
    pub description: String,
    pub severity: Severity,
    pub context: Option<String>,
    pub metrics: Option<serde_json::Value>,
}

impl AuditEntry {
    pub fn new(
        category: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            category: category.into(),
            description: description.into(),
            severity,
            context: None,
            metrics: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_metrics(mut self, metrics: serde_json::Value) -> Self {
        self.metrics = Some(metrics);
        self
    }
}
