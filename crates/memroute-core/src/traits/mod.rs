// SPDX-FileCopyrightText: 2026 Memroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for the collaborators the routing core consumes.
//!
//! Backends use `#[async_trait]` for dynamic dispatch compatibility; audit
//! sinks are synchronous and infallible.

pub mod audit;
pub mod backend;

pub use audit::{AuditSink, NullAuditSink};
pub use backend::{BackendRegistry, MemoryBackend};
