// SPDX-FileCopyrightText: 2026 Memroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for memroute integration tests.
//!
//! Provides scripted backends and capturing audit sinks for fast,
//! deterministic tests without real memory systems.
//!
//! # Components
//!
//! - [`MockBackend`] - Scripted memory backend with call capture
//! - [`RecordingAuditSink`] - Audit sink that keeps every entry

pub mod mock_audit;
pub mod mock_backend;

pub use mock_audit::RecordingAuditSink;
pub use mock_backend::{MockBackend, MockOutcome};
