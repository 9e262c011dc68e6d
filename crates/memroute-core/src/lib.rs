// SPDX-FileCopyrightText: 2026 Memroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the memroute memory-operation router.
//!
//! This crate provides the shared request and system types, the error types,
//! and the traits every memory backend and audit sink implements.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{BackendError, MemrouteError};
pub use types::{
    AuditEntry, Context, EntityKind, ExtractedEntity, HealthStatus, MemoryRequest, Operation,
    Severity, System, TaskContext,
};

pub use traits::{AuditSink, BackendRegistry, MemoryBackend, NullAuditSink};

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::{Value, json};

    struct EchoBackend(System);

    #[async_trait]
    impl MemoryBackend for EchoBackend {
        fn system(&self) -> System {
            self.0
        }

        async fn store(&self, payload: Value, _task: &TaskContext) -> Result<Value, BackendError> {
            Ok(json!({ "stored": payload }))
        }

        async fn retrieve(&self, query: Value, _task: &TaskContext) -> Result<Value, BackendError> {
            Ok(json!({ "query": query }))
        }
    }

    #[test]
    fn system_names_round_trip() {
        for system in System::ALL {
            let s = system.to_string();
            assert_eq!(System::from_str(&s).unwrap(), system);
        }
        assert_eq!(System::Graph.to_string(), "graph");
        assert_eq!(System::from_str("Document").unwrap(), System::Document);
        assert!(System::from_str("vector").is_err());
    }

    #[test]
    fn system_order_is_declaration_order() {
        assert!(System::Graph < System::Cache);
        assert!(System::Cache < System::Document);
        assert_eq!(System::Document.ordinal(), 2);
    }

    #[test]
    fn severity_is_ordered_and_uppercase() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::High < Severity::Critical);
        assert_eq!(Severity::Critical.to_string(), "CRITICAL");
        assert_eq!(Severity::from_str("medium").unwrap(), Severity::Medium);
        let json = serde_json::to_string(&Severity::High).unwrap();
        assert_eq!(json, "\"HIGH\"");
    }

    #[test]
    fn operation_parses_case_insensitively() {
        assert_eq!(Operation::from_str("STORE").unwrap(), Operation::Store);
        assert_eq!(Operation::Search.to_string(), "search");
    }

    #[test]
    fn entity_confidence_defaults_to_one() {
        let entity: ExtractedEntity =
            serde_json::from_value(json!({ "name": "Alice", "kind": "person" })).unwrap();
        assert_eq!(entity.kind, EntityKind::Person);
        assert!((entity.confidence - 1.0).abs() < f64::EPSILON);
        assert!(entity.span.is_none());
    }

    #[test]
    fn request_context_lookup() {
        let mut ctx = Context::new();
        ctx.insert("operation".into(), json!("relationship"));
        ctx.insert("count".into(), json!(3));
        let req = MemoryRequest::new(Operation::Query, "who knows whom").with_context(ctx);
        assert_eq!(req.context_str("operation"), Some("relationship"));
        assert_eq!(req.context_str("count"), None);
        assert_eq!(req.context_str("missing"), None);
        assert!(req.entities.is_empty());
    }

    #[test]
    fn exhausted_error_lists_attempted_systems() {
        let err = MemrouteError::AllSystemsExhausted {
            attempted: vec![System::Graph, System::Cache, System::Document],
            last_error: "timeout".into(),
        };
        assert_eq!(
            err.to_string(),
            "all memory systems failed (tried graph, cache, document): timeout"
        );

        let cancelled = MemrouteError::Cancelled { attempted: vec![] };
        assert_eq!(cancelled.to_string(), "request cancelled after trying none");
    }

    #[test]
    fn backend_error_display() {
        let err = BackendError::operation(System::Cache, "write rejected");
        assert_eq!(err.to_string(), "cache operation failed: write rejected");
        assert_eq!(
            BackendError::NotConfigured(System::Graph).to_string(),
            "no backend configured for graph"
        );
    }

    #[tokio::test]
    async fn registry_lookup_and_missing_backend() {
        let registry = BackendRegistry::new()
            .with(Arc::new(EchoBackend(System::Document)))
            .with(Arc::new(EchoBackend(System::Graph)));

        assert_eq!(registry.systems(), vec![System::Graph, System::Document]);
        assert!(!registry.contains(System::Cache));

        let backend = registry.get(System::Graph).unwrap();
        let task = TaskContext::new("store a note", None);
        let out = backend.store(json!({"k": 1}), &task).await.unwrap();
        assert_eq!(out, json!({"stored": {"k": 1}}));
        assert_eq!(backend.health_check().await.unwrap(), HealthStatus::Healthy);

        match registry.get(System::Cache) {
            Err(BackendError::NotConfigured(System::Cache)) => {}
            other => panic!("expected NotConfigured, got {other:?}", other = other.err()),
        }
    }

    #[test]
    fn audit_entry_builder() {
        let entry = AuditEntry::new("Fallback Success", "cache served request", Severity::Medium)
            .with_context("operation=store")
            .with_metrics(json!({ "attempts": 2 }));
        assert_eq!(entry.severity, Severity::Medium);
        assert_eq!(entry.context.as_deref(), Some("operation=store"));
        NullAuditSink.record(entry);
    }
}
