// SPDX-FileCopyrightText: 2026 Memroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./memroute.toml` > `~/.config/memroute/memroute.toml` > `/etc/memroute/memroute.toml`
//! with environment variable overrides via `MEMROUTE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::MemrouteConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/memroute/memroute.toml";

/// Local config file, relative to the working directory.
pub const LOCAL_CONFIG_FILE: &str = "memroute.toml";

/// Env var section prefixes, longest first so `systems_graph_` wins over a
/// shorter match.
const ENV_SECTIONS: &[(&str, &str)] = &[
    ("systems_graph_", "systems.graph."),
    ("systems_cache_", "systems.cache."),
    ("systems_document_", "systems.document."),
    ("general_", "general."),
    ("routing_", "routing."),
    ("tracker_", "tracker."),
    ("audit_", "audit."),
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/memroute/memroute.toml` (system-wide)
/// 3. `~/.config/memroute/memroute.toml` (user XDG config)
/// 4. `./memroute.toml` (local directory)
/// 5. `MEMROUTE_*` environment variables
pub fn load_config() -> Result<MemrouteConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<MemrouteConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MemrouteConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MemrouteConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MemrouteConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(MemrouteConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// `~/.config/memroute/memroute.toml`, if the platform has a config dir.
pub fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("memroute").join("memroute.toml"))
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `MEMROUTE_ROUTING_NEAR_TIE_RATIO` must map to
/// `routing.near_tie_ratio`, not `routing.near.tie.ratio`.
fn env_provider() -> Env {
    Env::prefixed("MEMROUTE_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name onto a dotted config path.
pub fn map_env_key(key: &str) -> String {
    for (prefix, section) in ENV_SECTIONS {
        if let Some(rest) = key.strip_prefix(prefix) {
            return format!("{section}{rest}");
        }
    }
    key.to_string()
}
