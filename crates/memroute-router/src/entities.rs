// SPDX-FileCopyrightText: 2026 Memroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lexical entity extraction.
//!
//! Pulls candidate named entities out of request text with fixed regex
//! heuristics. Overlapping matches are all kept: "Alice mentioned the Apollo
//! project" can yield several entities for the same words, and callers see
//! every one of them.

use std::sync::LazyLock;

use memroute_core::{EntityKind, ExtractedEntity, MemoryRequest};
use regex::Regex;
use serde_json::Value;

/// Confidence assigned to every lexical match.
pub const LEXICAL_CONFIDENCE: f64 = 0.8;

/// Candidates that are never entities on their own.
const STOP_WORDS: &[&str] = &["the", "and", "or", "but"];

/// Capitalized word sequence, e.g. `Apollo`, `Acme Labs`.
const PROPER_NAME: &str = r"[A-Z][a-zA-Z0-9]*(?:[ \t]+[A-Z][a-zA-Z0-9]*)*";

/// Extraction patterns in kind order. Capture group 1 is the entity name.
///
/// Capitalization is significant for name-shaped captures; the surrounding
/// keywords match in any case.
static ENTITY_PATTERNS: LazyLock<Vec<(EntityKind, Regex)>> = LazyLock::new(|| {
    let name = PROPER_NAME;
    vec![
        // Alice said / Bob Smith mentioned
        (
            EntityKind::Person,
            Regex::new(r"\b([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)*)[ \t]+(?i:said|mentioned|told|asked)\b")
                .unwrap(),
        ),
        (
            EntityKind::Person,
            Regex::new(r"(?i:\b(?:user|person|individual|someone)\s+named)\s+([A-Z][a-z]+)")
                .unwrap(),
        ),
        // @handle mentions
        (EntityKind::Person, Regex::new(r"@([a-zA-Z0-9_]+)\b").unwrap()),
        (
            EntityKind::Project,
            Regex::new(&format!(r"\b(?i:project|initiative)[ \t]+({name})")).unwrap(),
        ),
        (
            EntityKind::Project,
            Regex::new(&format!(r"\b({name})[ \t]+(?i:project)\b")).unwrap(),
        ),
        (
            EntityKind::Project,
            Regex::new(&format!(r"\b(?i:working\s+on)[ \t]+({name})")).unwrap(),
        ),
        (
            EntityKind::Document,
            Regex::new(r"(?i)\b(?:document|file|note|report)[ \t]+([a-z0-9\-_.]+)").unwrap(),
        ),
        // Bare filenames: notes.md, q3-report.pdf
        (
            EntityKind::Document,
            Regex::new(r"(?i)\b([a-z0-9\-_]+\.(?:md|txt|doc|pdf))\b").unwrap(),
        ),
        (
            EntityKind::Concept,
            Regex::new(
                r"(?i)\b(?:concept|idea|notion)[ \t]+(?:of[ \t]+)?([a-z0-9]+(?:[ \t]+[a-z0-9]+){0,2})",
            )
            .unwrap(),
        ),
        (
            EntityKind::Organization,
            Regex::new(&format!(
                r"\b({name})[ \t]+(?i:company|corp|inc|ltd|organization)\b"
            ))
            .unwrap(),
        ),
        (
            EntityKind::Organization,
            Regex::new(&format!(r"\b(?i:company)[ \t]+({name})")).unwrap(),
        ),
        (
            EntityKind::Organization,
            Regex::new(&format!(r"\b(?i:organization)[ \t]+({name})")).unwrap(),
        ),
    ]
});

/// Stateless lexical entity extractor.
#[derive(Debug, Default, Clone, Copy)]
pub struct EntityExtractor;

impl EntityExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract entities from the request content, then append any supplied
    /// through `context.entities`.
    ///
    /// Never fails: malformed context entries are skipped with a warning.
    pub fn extract(&self, request: &MemoryRequest) -> Vec<ExtractedEntity> {
        let mut entities = self.extract_text(&request.content);

        if let Some(supplied) = request
            .context
            .as_ref()
            .and_then(|c| c.get("entities"))
        {
            append_supplied(&mut entities, supplied);
        }

        entities
    }

    /// Lexical matches only, in kind order then pattern order then position.
    pub fn extract_text(&self, content: &str) -> Vec<ExtractedEntity> {
        let mut entities = Vec::new();

        for (kind, pattern) in ENTITY_PATTERNS.iter() {
            for caps in pattern.captures_iter(content) {
                let (Some(full), Some(name)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                let name = name.as_str().trim();
                if !is_candidate(name) {
                    continue;
                }
                entities.push(ExtractedEntity {
                    name: name.to_string(),
                    kind: *kind,
                    confidence: LEXICAL_CONFIDENCE,
                    span: Some(full.as_str().to_string()),
                });
            }
        }

        entities
    }
}

fn is_candidate(name: &str) -> bool {
    name.chars().count() >= 2 && !STOP_WORDS.contains(&name.to_lowercase().as_str())
}

fn append_supplied(entities: &mut Vec<ExtractedEntity>, supplied: &Value) {
    let Some(items) = supplied.as_array() else {
        tracing::warn!("context.entities is not an array, ignoring");
        return;
    };

    for item in items {
        match serde_json::from_value::<ExtractedEntity>(item.clone()) {
            Ok(mut entity) => {
                entity.confidence = entity.confidence.clamp(0.0, 1.0);
                entities.push(entity);
            }
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed context entity");
            }
        }
    }
}
