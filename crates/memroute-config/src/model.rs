// SPDX-FileCopyrightText: 2026 Memroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the memroute router.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::str::FromStr;

use memroute_core::{Severity, System};
use serde::{Deserialize, Serialize};

/// Top-level memroute configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemrouteConfig {
    /// Process-wide settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Routing engine weights and thresholds.
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Performance tracker settings.
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// Per-system enable flags and endpoints.
    #[serde(default)]
    pub systems: SystemsConfig,

    /// Audit trail settings.
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Process-wide settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Routing engine weights.
///
/// Every field maps onto a named weight in the routing engine; the defaults
/// reproduce the built-in routing behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Runner-up score ratio (relative to the top score) that triggers
    /// multi-system fan-out.
    #[serde(default = "default_near_tie_ratio")]
    pub near_tie_ratio: f64,

    /// Graph boost when two or more person/organization entities are present.
    #[serde(default = "default_graph_entity_boost")]
    pub graph_entity_boost: f64,

    /// Document boost when any document/concept entity is present.
    #[serde(default = "default_document_entity_boost")]
    pub document_entity_boost: f64,

    /// Cache boost when more than three entities are present.
    #[serde(default = "default_cache_entity_boost")]
    pub cache_entity_boost: f64,

    /// Content longer than this favors the document store.
    #[serde(default = "default_long_content_chars")]
    pub long_content_chars: usize,

    /// Content shorter than this favors the cache.
    #[serde(default = "default_short_content_chars")]
    pub short_content_chars: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            near_tie_ratio: default_near_tie_ratio(),
            graph_entity_boost: default_graph_entity_boost(),
            document_entity_boost: default_document_entity_boost(),
            cache_entity_boost: default_cache_entity_boost(),
            long_content_chars: default_long_content_chars(),
            short_content_chars: default_short_content_chars(),
        }
    }
}

fn default_near_tie_ratio() -> f64 {
    0.8
}

fn default_graph_entity_boost() -> f64 {
    0.3
}

fn default_document_entity_boost() -> f64 {
    0.2
}

fn default_cache_entity_boost() -> f64 {
    0.1
}

fn default_long_content_chars() -> usize {
    1000
}

fn default_short_content_chars() -> usize {
    100
}

/// Performance tracker settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TrackerConfig {
    /// EMA smoothing factor for success rate and latency.
    #[serde(default = "default_ema_alpha")]
    pub ema_alpha: f64,

    /// Capacity of the recent-outcomes ring buffer.
    #[serde(default = "default_recent_capacity")]
    pub recent_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            ema_alpha: default_ema_alpha(),
            recent_capacity: default_recent_capacity(),
        }
    }
}

fn default_ema_alpha() -> f64 {
    0.1
}

fn default_recent_capacity() -> usize {
    100
}

/// Per-system configuration blocks.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SystemsConfig {
    #[serde(default)]
    pub graph: SystemConfig,

    #[serde(default)]
    pub cache: SystemConfig,

    #[serde(default)]
    pub document: SystemConfig,
}

impl SystemsConfig {
    /// The block for a given system.
    pub fn get(&self, system: System) -> &SystemConfig {
        match system {
            System::Graph => &self.graph,
            System::Cache => &self.cache,
            System::Document => &self.document,
        }
    }

    /// Systems switched off in configuration. Disabled systems are never
    /// propagation targets; operations routed to one fail over at once.
    pub fn disabled(&self) -> Vec<System> {
        System::ALL
            .into_iter()
            .filter(|s| !self.get(*s).enabled)
            .collect()
    }
}

/// One backing memory system.
///
/// Connection details belong to the backend client registered for the
/// system; only the routing switch lives here.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SystemConfig {
    /// Whether this system may receive operations.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}

/// Audit trail configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Whether audit entries are recorded at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Markdown audit file. When unset, entries are only emitted as tracing events.
    #[serde(default)]
    pub path: Option<String>,

    /// Entries below this severity are dropped (LOW, MEDIUM, HIGH, CRITICAL).
    #[serde(default = "default_min_severity")]
    pub min_severity: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            min_severity: default_min_severity(),
        }
    }
}

impl AuditConfig {
    /// Parsed severity threshold. Falls back to LOW for values validation
    /// would have rejected.
    pub fn min_severity(&self) -> Severity {
        Severity::from_str(self.min_severity.trim()).unwrap_or(Severity::Low)
    }
}

fn default_min_severity() -> String {
    "LOW".to_string()
}
