// SPDX-FileCopyrightText: 2026 Memroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Coarse keyword analysis (classifier tiers 2 and 3).
//!
//! Keywords are plain substrings of the lower-cased text, so `notebook`
//! matches `note` and `usernames` matches `user`. Embedded hits are part of
//! the cascade's behavior and are not filtered out.

use memroute_core::Context;
use serde::Serialize;
use strum::Display;

use crate::classifier::Intent;

/// Confidence of a tier-2 category match before bonuses.
pub const KEYWORD_BASE_CONFIDENCE: f64 = 0.4;

/// Bonus for explicit relationship language.
const RELATIONSHIP_LANGUAGE_BONUS: f64 = 0.1;

/// Bonus when an operation type is detected.
const OPERATION_BONUS: f64 = 0.1;

/// Bonus per detected entity kind.
const ENTITY_KIND_BONUS: f64 = 0.05;

/// Cap on the summed entity-kind bonus.
const ENTITY_KIND_BONUS_MAX: f64 = 0.15;

/// Confidence of a tier-3 hard-coded keyword match.
pub const FALLBACK_CONFIDENCE: f64 = 0.2;

const RELATIONSHIP_KEYWORDS: &[&str] = &[
    "relationship",
    "connection",
    "linked",
    "related",
    "connects",
    "graph",
    "network",
    "association",
];

const IDENTITY_KEYWORDS: &[&str] = &["identity", "profile", "who"];

const DOCUMENTATION_KEYWORDS: &[&str] = &[
    "document",
    "note",
    "write",
    "comprehensive",
    "detailed",
    "guide",
    "report",
    "structured",
];

const CONVERSATION_KEYWORDS: &[&str] = &[
    "conversation",
    "context",
    "semantic",
    "search",
    "remember",
    "previous",
    "history",
];

const RELATIONSHIP_LANGUAGE: &[&str] = &["between", "connected", "linked"];

/// Operation vocabularies, checked in order; first hit wins.
const OPERATION_KEYWORDS: &[(OperationKind, &[&str])] = &[
    (
        OperationKind::Create,
        &["create", "add", "new", "write", "store"],
    ),
    (OperationKind::Update, &["update", "modify", "change"]),
    (OperationKind::Delete, &["delete", "remove"]),
    (OperationKind::Search, &["search", "find", "query"]),
    (OperationKind::Analyze, &["analyze", "compare", "evaluate"]),
    (OperationKind::Read, &["read", "get", "show", "retrieve"]),
];

const ENTITY_KIND_KEYWORDS: &[&str] = &[
    "user",
    "project",
    "document",
    "relationship",
    "team",
    "conversation",
    "memory",
];

/// Last-resort keyword table, checked in order.
const FALLBACK_KEYWORDS: &[(&[&str], Intent)] = &[
    (&["remember", "recall"], Intent::ContextRetrieval),
    (&["relationship", "connect"], Intent::QueryRelation),
    (&["note", "document"], Intent::WriteDoc),
    (&["search", "find"], Intent::SemanticSearch),
    (&["store", "save"], Intent::WriteDoc),
    (&["get", "retrieve", "lookup"], Intent::MemoryLookup),
];

/// Coarse task category from the keyword analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskCategory {
    Relationship,
    UserIdentity,
    Documentation,
    Conversation,
}

impl TaskCategory {
    pub fn intent(self) -> Intent {
        match self {
            TaskCategory::Relationship => Intent::QueryRelation,
            TaskCategory::UserIdentity => Intent::MemoryLookup,
            TaskCategory::Documentation => Intent::WriteDoc,
            TaskCategory::Conversation => Intent::ContextRetrieval,
        }
    }
}

/// Detected operation type. Additive to confidence only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Create,
    Read,
    Update,
    Delete,
    Search,
    Analyze,
}

/// Output of the keyword analyzer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct KeywordAnalysis {
    pub category: Option<TaskCategory>,
    pub operation: Option<OperationKind>,
    pub entity_kinds: Vec<&'static str>,
    pub relationship_language: bool,
    /// Meaningful only when `category` is set.
    pub confidence: f64,
    /// Keywords (or context flags) that selected the category.
    pub matched: Vec<String>,
}

/// Tier-2 keyword analyzer.
#[derive(Debug, Clone, Default)]
pub struct KeywordAnalyzer;

impl KeywordAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Analyze text into a coarse category plus additive signals.
    pub fn analyze(&self, text: &str, context: Option<&Context>) -> KeywordAnalysis {
        let lowered = text.to_lowercase();

        let (category, matched) = match detect_category(&lowered) {
            Some(found) => (Some(found.0), found.1),
            None => match context.and_then(category_from_flags) {
                Some((category, flag)) => (Some(category), vec![flag.to_string()]),
                None => (None, Vec::new()),
            },
        };

        let relationship_language = contains_any(&lowered, RELATIONSHIP_LANGUAGE);
        let operation = OPERATION_KEYWORDS
            .iter()
            .find(|(_, vocab)| contains_any(&lowered, vocab))
            .map(|(kind, _)| *kind);
        let entity_kinds = matching(&lowered, ENTITY_KIND_KEYWORDS);

        let mut confidence = 0.0;
        if category.is_some() {
            confidence = KEYWORD_BASE_CONFIDENCE;
            if relationship_language {
                confidence += RELATIONSHIP_LANGUAGE_BONUS;
            }
            if operation.is_some() {
                confidence += OPERATION_BONUS;
            }
            confidence +=
                (entity_kinds.len() as f64 * ENTITY_KIND_BONUS).min(ENTITY_KIND_BONUS_MAX);
        }

        KeywordAnalysis {
            category,
            operation,
            entity_kinds,
            relationship_language,
            confidence: confidence.min(1.0),
            matched,
        }
    }
}

/// Tier 3: first hard-coded keyword hit, if any.
pub fn fallback_intent(text: &str) -> Option<(Intent, &'static str)> {
    let lowered = text.to_lowercase();
    FALLBACK_KEYWORDS.iter().find_map(|(vocab, intent)| {
        vocab
            .iter()
            .find(|kw| lowered.contains(*kw))
            .map(|kw| (*intent, *kw))
    })
}

fn contains_any(lowered: &str, vocab: &[&str]) -> bool {
    vocab.iter().any(|kw| lowered.contains(kw))
}

/// Vocabulary entries found in the text, in vocabulary order.
fn matching(lowered: &str, vocab: &[&'static str]) -> Vec<&'static str> {
    vocab
        .iter()
        .copied()
        .filter(|kw| lowered.contains(kw))
        .collect()
}

fn detect_category(lowered: &str) -> Option<(TaskCategory, Vec<String>)> {
    let hits = matching(lowered, RELATIONSHIP_KEYWORDS);
    if !hits.is_empty() {
        return Some((TaskCategory::Relationship, to_owned(hits)));
    }

    if lowered.contains("user") {
        let hits = matching(lowered, IDENTITY_KEYWORDS);
        if !hits.is_empty() {
            let mut matched = vec!["user".to_string()];
            matched.extend(to_owned(hits));
            return Some((TaskCategory::UserIdentity, matched));
        }
    }

    let hits = matching(lowered, DOCUMENTATION_KEYWORDS);
    if !hits.is_empty() {
        return Some((TaskCategory::Documentation, to_owned(hits)));
    }

    let hits = matching(lowered, CONVERSATION_KEYWORDS);
    if !hits.is_empty() {
        return Some((TaskCategory::Conversation, to_owned(hits)));
    }

    None
}

fn category_from_flags(context: &Context) -> Option<(TaskCategory, &'static str)> {
    let flag = |key: &str| context.get(key).and_then(|v| v.as_bool()).unwrap_or(false);

    if flag("needs_persistence") {
        Some((TaskCategory::Documentation, "needs_persistence"))
    } else if flag("is_relational") {
        Some((TaskCategory::Relationship, "is_relational"))
    } else if flag("is_temporary") {
        Some((TaskCategory::Conversation, "is_temporary"))
    } else {
        None
    }
}

fn to_owned(words: Vec<&'static str>) -> Vec<String> {
    words.into_iter().map(str::to_string).collect()
}
