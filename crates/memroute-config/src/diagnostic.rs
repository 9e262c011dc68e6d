// SPDX-FileCopyrightText: 2026 Memroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration diagnostics.
//!
//! Figment extraction errors become miette diagnostics. Unknown keys get a
//! source span and a "did you mean?" hint from Jaro-Winkler similarity.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity for a key suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// One problem found while loading or validating configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key no section of memroute.toml accepts.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(memroute::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        /// Comma-separated keys the section accepts.
        valid_keys: String,
        #[label("this key is not recognized")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value of the wrong TOML type, e.g. a string where a ratio belongs.
    #[error("`{key}` has the wrong type: found {found}")]
    #[diagnostic(code(memroute::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        /// Dotted path, e.g. `tracker.recent_capacity`.
        key: String,
        found: String,
        expected: String,
    },

    /// A well-typed value outside its allowed range.
    #[error("validation error: {message}")]
    #[diagnostic(code(memroute::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(memroute::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Convert every error inside a `figment::Error` into a [`ConfigError`].
///
/// `toml_sources` pairs each loaded file path with its content so unknown
/// keys can be pointed at.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let section: Vec<String> = error.path.clone();
            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    let (span, src) = locate(&error, &section, field, toml_sources);
                    ConfigError::UnknownKey {
                        key: field.clone(),
                        suggestion: suggest_key(field, expected),
                        valid_keys: expected.join(", "),
                        span,
                        src,
                    }
                }
                Kind::InvalidType(found, expected) => ConfigError::InvalidType {
                    key: section.join("."),
                    found: found.to_string(),
                    expected: expected.to_string(),
                },
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

/// Span of `field` inside the file the error came from, when that file is known.
fn locate(
    error: &figment::Error,
    section: &[String],
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let origin = match error.metadata.as_ref().and_then(|m| m.source.as_ref()) {
        Some(figment::Source::File(path)) => path.display().to_string(),
        _ => return (None, None),
    };
    let Some((path, content)) = toml_sources.iter().find(|(p, _)| *p == origin) else {
        return (None, None);
    };

    match key_offset(content, section, field) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), field.len())),
            Some(NamedSource::new(path, content.clone())),
        ),
        None => (None, None),
    }
}

/// Byte offset of `field` within the `[section]` table of `content`.
///
/// Top-level keys are searched from the start of the file. The search stops
/// at the next table header.
fn key_offset(content: &str, section: &[String], field: &str) -> Option<usize> {
    let body_start = if section.is_empty() {
        0
    } else {
        let header = format!("[{}]", section.join("."));
        content.find(&header)? + header.len()
    };

    let mut offset = body_start;
    for (i, line) in content[body_start..].split_inclusive('\n').enumerate() {
        let trimmed = line.trim_start();
        if i > 0 && trimmed.starts_with('[') {
            return None;
        }
        let is_key = trimmed
            .strip_prefix(field)
            .is_some_and(|rest| rest.trim_start().starts_with('='));
        if is_key {
            return Some(offset + (line.len() - trimmed.len()));
        }
        offset += line.len();
    }
    None
}

/// Closest valid key to `unknown`, if any is similar enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Render errors to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        match handler.render_report(&mut buf, error) {
            Ok(()) => eprint!("{buf}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn suggests_tracker_key() {
        let valid = &["ema_alpha", "recent_capacity"];
        assert_eq!(suggest_key("ema_alpah", valid), Some("ema_alpha".to_string()));
    }

    #[test]
    fn suggests_routing_key() {
        let valid = &[
            "near_tie_ratio",
            "graph_entity_boost",
            "document_entity_boost",
            "cache_entity_boost",
        ];
        assert_eq!(
            suggest_key("near_tie_ration", valid),
            Some("near_tie_ratio".to_string())
        );
    }

    #[test]
    fn no_suggestion_for_distant_key() {
        assert_eq!(suggest_key("zzzzzz", &["enabled"]), None);
    }

    #[test]
    fn key_offset_in_system_table() {
        let content = "[systems.cache]\nenabled = true\n\n[systems.graph]\nenabeld = false\n";
        let o = key_offset(content, &path(&["systems", "graph"]), "enabeld").unwrap();
        assert_eq!(&content[o..o + 7], "enabeld");
    }

    #[test]
    fn key_offset_stops_at_next_table() {
        let content = "[tracker]\nema_alpha = 0.1\n[audit]\npath = \"a.md\"\n";
        assert_eq!(key_offset(content, &path(&["tracker"]), "path"), None);
    }

    #[test]
    fn key_offset_ignores_longer_keys() {
        let content = "[audit]\npath_prefix = 1\npath = \"a.md\"\n";
        let o = key_offset(content, &path(&["audit"]), "path").unwrap();
        assert!(content[o..].starts_with("path = "));
    }

    #[test]
    fn invalid_type_names_the_dotted_key() {
        let errors = match crate::load_and_validate_str("[tracker]\nrecent_capacity = \"many\"\n") {
            Err(errors) => errors,
            Ok(_) => panic!("string capacity should not parse"),
        };
        assert!(
            errors.iter().any(|e| matches!(
                e,
                ConfigError::InvalidType { key, .. } if key == "tracker.recent_capacity"
            )),
            "got: {errors:?}"
        );
    }
}
