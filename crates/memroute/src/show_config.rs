// SPDX-FileCopyrightText: 2026 Memroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `memroute config` command implementation.

use memroute_config::MemrouteConfig;
use memroute_core::MemrouteError;

/// Print the effective configuration as TOML, or JSON with `--json`.
pub fn run_config(config: &MemrouteConfig, json: bool) -> Result<(), MemrouteError> {
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
    } else {
        print!("{}", render_toml(config)?);
    }
    Ok(())
}

fn render_toml(config: &MemrouteConfig) -> Result<String, MemrouteError> {
    toml::to_string_pretty(config)
        .map_err(|e| MemrouteError::Config(format!("failed to render configuration: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_toml_round_trips() {
        let config = MemrouteConfig::default();
        let text = render_toml(&config).unwrap();
        assert!(text.contains("[routing]"));
        let parsed = memroute_config::load_and_validate_str(&text).unwrap();
        assert_eq!(parsed.routing.near_tie_ratio, config.routing.near_tie_ratio);
        assert_eq!(parsed.systems.graph.enabled, config.systems.graph.enabled);
    }
}
