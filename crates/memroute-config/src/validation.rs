// SPDX-FileCopyrightText: 2026 Memroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as ratio ranges, ordered thresholds, and parseable severities.

use std::str::FromStr;

use memroute_core::Severity;

use crate::diagnostic::ConfigError;
use crate::model::MemrouteConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &MemrouteConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.general.log_level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "general.log_level `{}` must be one of {}",
                config.general.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    let routing = &config.routing;
    if !(routing.near_tie_ratio > 0.0 && routing.near_tie_ratio <= 1.0) {
        errors.push(ConfigError::Validation {
            message: format!(
                "routing.near_tie_ratio must be in (0, 1], got {}",
                routing.near_tie_ratio
            ),
        });
    }

    for (name, value) in [
        ("graph_entity_boost", routing.graph_entity_boost),
        ("document_entity_boost", routing.document_entity_boost),
        ("cache_entity_boost", routing.cache_entity_boost),
    ] {
        if !value.is_finite() || value < 0.0 {
            errors.push(ConfigError::Validation {
                message: format!("routing.{name} must be non-negative, got {value}"),
            });
        }
    }

    if routing.short_content_chars >= routing.long_content_chars {
        errors.push(ConfigError::Validation {
            message: format!(
                "routing.short_content_chars ({}) must be less than routing.long_content_chars ({})",
                routing.short_content_chars, routing.long_content_chars
            ),
        });
    }

    if !(config.tracker.ema_alpha > 0.0 && config.tracker.ema_alpha <= 1.0) {
        errors.push(ConfigError::Validation {
            message: format!(
                "tracker.ema_alpha must be in (0, 1], got {}",
                config.tracker.ema_alpha
            ),
        });
    }

    if config.tracker.recent_capacity == 0 {
        errors.push(ConfigError::Validation {
            message: "tracker.recent_capacity must be at least 1".to_string(),
        });
    }

    if config.systems.disabled().len() == memroute_core::System::ALL.len() {
        errors.push(ConfigError::Validation {
            message: "at least one of systems.graph, systems.cache, systems.document must be enabled"
                .to_string(),
        });
    }

    if Severity::from_str(config.audit.min_severity.trim()).is_err() {
        errors.push(ConfigError::Validation {
            message: format!(
                "audit.min_severity `{}` must be one of LOW, MEDIUM, HIGH, CRITICAL",
                config.audit.min_severity
            ),
        });
    }

    if let Some(path) = &config.audit.path
        && path.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "audit.path must not be empty when set".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = MemrouteConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn out_of_range_near_tie_ratio_fails() {
        let mut config = MemrouteConfig::default();
        config.routing.near_tie_ratio = 1.5;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "near_tie_ratio"));
    }

    #[test]
    fn negative_boost_fails() {
        let mut config = MemrouteConfig::default();
        config.routing.document_entity_boost = -0.2;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "document_entity_boost"));
    }

    #[test]
    fn inverted_content_thresholds_fail() {
        let mut config = MemrouteConfig::default();
        config.routing.short_content_chars = 2000;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "short_content_chars"));
    }

    #[test]
    fn all_systems_disabled_fails() {
        let mut config = MemrouteConfig::default();
        config.systems.graph.enabled = false;
        config.systems.cache.enabled = false;
        config.systems.document.enabled = false;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "at least one"));
    }

    #[test]
    fn errors_are_collected_not_fail_fast() {
        let mut config = MemrouteConfig::default();
        config.general.log_level = "loud".into();
        config.tracker.ema_alpha = 0.0;
        config.tracker.recent_capacity = 0;
        config.audit.min_severity = "urgent".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(has_error(&errors, "log_level"));
        assert!(has_error(&errors, "ema_alpha"));
        assert!(has_error(&errors, "recent_capacity"));
        assert!(has_error(&errors, "min_severity"));
    }

    #[test]
    fn empty_audit_path_fails() {
        let mut config = MemrouteConfig::default();
        config.audit.path = Some("  ".into());
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "audit.path"));
    }
}
