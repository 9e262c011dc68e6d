// SPDX-FileCopyrightText: 2026 Memroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the memroute workspace.

use thiserror::Error;

use crate::types::System;

/// Failure of a single backend call.
///
/// Never escapes the fallback executor or the propagator directly: it is
/// recorded, audited, and turned into the next attempt.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend could not be reached or refused the request.
    #[error("{system} unavailable: {message}")]
    Unavailable { system: System, message: String },

    /// No backend is registered (or enabled) for this system.
    #[error("no backend configured for {0}")]
    NotConfigured(System),

    /// The backend accepted the call but the operation failed.
    #[error("{system} operation failed: {message}")]
    Operation {
        system: System,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl BackendError {
    /// Shorthand for an `Operation` error without a source.
    pub fn operation(system: System, message: impl Into<String>) -> Self {
        BackendError::Operation {
            system,
            message: message.into(),
            source: None,
        }
    }
}

/// The primary error type surfaced to memroute callers.
#[derive(Debug, Error)]
pub enum MemrouteError {
    /// Configuration errors (invalid TOML, missing fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Every system in the fallback chain failed.
    #[error("all memory systems failed (tried {}): {last_error}", format_systems(.attempted))]
    AllSystemsExhausted {
        attempted: Vec<System>,
        last_error: String,
    },

    /// The request was cancelled before the fallback chain completed.
    #[error("request cancelled after trying {}", format_systems(.attempted))]
    Cancelled { attempted: Vec<System> },

    /// A payload could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

fn format_systems(systems: &[System]) -> String {
    if systems.is_empty() {
        return "none".to_string();
    }
    systems
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
