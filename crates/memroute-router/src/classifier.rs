// SPDX-FileCopyrightText: 2026 Memroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lexical intent classification.
//!
//! Classifies request text into the memory-intent catalogue with a strict
//! three-tier cascade:
//!
//! 1. the rich pattern analyzer in this module,
//! 2. the coarse keyword analyzer ([`crate::keyword::KeywordAnalyzer`]) when
//!    tier 1 is below [`FALLBACK_THRESHOLD`],
//! 3. a hard-coded keyword table, then `unknown`.
//!
//! Deterministic, no network, no model calls.

use std::sync::LazyLock;

use memroute_core::Context;
use regex::Regex;
use serde::Serialize;
use strum::{Display, EnumString};

use crate::keyword::{self, KeywordAnalyzer};

/// Tier-1 confidence below which the keyword analyzer takes over.
pub const FALLBACK_THRESHOLD: f64 = 0.3;

/// Score contributed by the first pattern occurrence for an intent.
const FIRST_MATCH_SCORE: f64 = 0.3;

/// Score contributed by each further occurrence for the same intent.
const EXTRA_MATCH_SCORE: f64 = 0.2;

/// Confidence of a degenerate (`unknown`) classification.
pub const UNKNOWN_CONFIDENCE: f64 = 0.1;

/// Memory intents, in catalogue order.
///
/// Catalogue order breaks score ties.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum Intent {
    CreateRelation,
    QueryRelation,
    TraverseGraph,
    WriteDoc,
    ReadDoc,
    SemanticSearch,
    ContextRetrieval,
    MemoryLookup,
    ComprehensiveStore,
    Unknown,
}

impl Intent {
    /// Scored intents in catalogue order (`Unknown` is never scored).
    pub const CATALOGUE: [Intent; 9] = [
        Intent::CreateRelation,
        Intent::QueryRelation,
        Intent::TraverseGraph,
        Intent::WriteDoc,
        Intent::ReadDoc,
        Intent::SemanticSearch,
        Intent::ContextRetrieval,
        Intent::MemoryLookup,
        Intent::ComprehensiveStore,
    ];

    fn index(self) -> usize {
        Self::CATALOGUE
            .iter()
            .position(|i| *i == self)
            .unwrap_or(Self::CATALOGUE.len())
    }
}

/// Which tier of the cascade produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ClassifierTier {
    /// Rich pattern analyzer.
    Rich,
    /// Coarse keyword-category analyzer.
    Keyword,
    /// Hard-coded keyword table.
    Fallback,
    /// Nothing matched.
    Default,
}

/// Result of classifying a request's intent.
#[derive(Debug, Clone, Serialize)]
pub struct IntentResult {
    pub intent: Intent,
    /// Confidence in the classification (0.1-1.0).
    pub confidence: f64,
    pub tier: ClassifierTier,
    /// Human-readable reason for the classification.
    pub reason: &'static str,
    /// Patterns or keywords that supported the winning intent.
    pub patterns_matched: Vec<String>,
}

impl IntentResult {
    pub fn unknown() -> Self {
        Self {
            intent: Intent::Unknown,
            confidence: UNKNOWN_CONFIDENCE,
            tier: ClassifierTier::Default,
            reason: "no intent signal",
            patterns_matched: Vec::new(),
        }
    }

    /// True when the result carries no usable intent.
    pub fn is_degenerate(&self) -> bool {
        self.intent == Intent::Unknown
    }
}

impl std::fmt::Display for IntentResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({:.2}, {} tier: {})",
            self.intent, self.confidence, self.tier, self.reason
        )
    }
}

/// Ordered pattern lists per intent, matched against lower-cased text.
const INTENT_PATTERNS: &[(Intent, &[&str])] = &[
    (
        Intent::CreateRelation,
        &[
            r"\b(connect|link|associate|relate|tie)\b.*\b(to|with)\b",
            r"\b(create|establish|build)\b.*\b(relationship|connection|link)\b",
            r"\b(add|insert)\b.*\b(relationship|edge|connection)\b",
        ],
    ),
    (
        Intent::QueryRelation,
        &[
            r"\b(who|what|which).*\b(connected|linked|related|associated)\b",
            r"\b(find|show|get).*\b(relationships|connections|links)\b",
            r"\b(how.*related|connected.*to)\b",
        ],
    ),
    (
        Intent::TraverseGraph,
        &[
            r"\b(path|route|journey).*\b(from|to|between)\b",
            r"\b(traverse|walk|follow).*\b(graph|network|connections)\b",
            r"\b(degrees?.*separation|shortest.*path)\b",
        ],
    ),
    (
        Intent::WriteDoc,
        &[
            r"\b(write|create|compose|document|note)\b.*\b(about|on|regarding|documentation|doc|file)\b",
            r"\b(save|store|record).*\b(document|note|information)\b",
            r"\b(take.*notes?|make.*note)\b",
            r"\b(create|make).*\b(documentation|doc)\b",
        ],
    ),
    (
        Intent::ReadDoc,
        &[
            r"\b(read|show|display|get).*\b(document|note|file)\b",
            r"\b(open|view|access).*\b(note|document)\b",
            r"\b(what.*written|content.*of)\b",
            r"\bread.*\b(document|file|note)\b.*\babout\b",
        ],
    ),
    (
        Intent::SemanticSearch,
        &[
            r"\b(find|search|look.*for).*\b(similar|like|related)\b",
            r"\b(semantic|meaning|context).*\b(search|find)\b",
            r"\b(what.*means|similar.*to)\b",
            r"\b(search|find).*\b(information|documents?|data)\b",
        ],
    ),
    (
        Intent::ContextRetrieval,
        &[
            r"\b(remember|recall|what.*said)\b",
            r"\b(conversation.*about|discussed.*earlier)\b",
            r"\b(context|background|history)\b",
        ],
    ),
    (
        Intent::MemoryLookup,
        &[
            r"\b(retrieve|get|fetch).*\b(memory|information|data)\b",
            r"\b(lookup|check|find).*\b(stored|saved)\b",
            r"\bretrieve.*\b(stored|saved|user|preferences)\b",
        ],
    ),
    (
        Intent::ComprehensiveStore,
        &[
            r"\b(complete|full|comprehensive).*\b(profile|record|information)\b",
            r"\b(everything.*about|all.*information)\b",
            r"\b(store.*everywhere|save.*all.*systems)\b",
            r"\b(save|store).*\b(complete|comprehensive|full)\b",
            r"\b(get|retrieve).*\b(all.*information|everything.*about|complete.*profile)\b",
        ],
    ),
];

/// Compiled form of [`INTENT_PATTERNS`], same order.
static COMPILED_PATTERNS: LazyLock<Vec<(Intent, Vec<(&'static str, Regex)>)>> =
    LazyLock::new(|| {
        INTENT_PATTERNS
            .iter()
            .map(|(intent, patterns)| {
                let compiled = patterns
                    .iter()
                    .map(|p| (*p, Regex::new(p).unwrap()))
                    .collect();
                (*intent, compiled)
            })
            .collect()
    });

/// Fixed bonuses added when `context.operation` names an operation.
fn context_hints(operation: &str) -> &'static [(Intent, f64)] {
    match operation {
        "store" | "save" | "create" => {
            &[(Intent::WriteDoc, 0.5), (Intent::ComprehensiveStore, 0.3)]
        }
        "search" | "find" | "query" => {
            &[(Intent::SemanticSearch, 0.7), (Intent::MemoryLookup, 0.5)]
        }
        "retrieve" | "get" | "recall" => {
            &[(Intent::ContextRetrieval, 0.7), (Intent::MemoryLookup, 0.3)]
        }
        _ => &[],
    }
}

/// Three-tier intent classifier.
#[derive(Debug, Clone, Default)]
pub struct IntentClassifier {
    keyword: KeywordAnalyzer,
}

impl IntentClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify request text, optionally using the request context.
    ///
    /// Always returns a result with confidence in `[0.1, 1.0]`.
    pub fn classify(&self, text: &str, context: Option<&Context>) -> IntentResult {
        let rich = self.classify_rich(text, context);
        if rich.confidence >= FALLBACK_THRESHOLD {
            tracing::debug!(
                intent = %rich.intent,
                confidence = rich.confidence,
                "rich classification"
            );
            return rich;
        }

        let analysis = self.keyword.analyze(text, context);
        if let Some(category) = analysis.category {
            tracing::debug!(
                %category,
                confidence = analysis.confidence,
                "keyword classification"
            );
            return IntentResult {
                intent: category.intent(),
                confidence: analysis.confidence,
                tier: ClassifierTier::Keyword,
                reason: "keyword category match",
                patterns_matched: analysis.matched,
            };
        }

        if let Some((intent, word)) = keyword::fallback_intent(text) {
            tracing::debug!(%intent, keyword = word, "fallback keyword classification");
            return IntentResult {
                intent,
                confidence: keyword::FALLBACK_CONFIDENCE,
                tier: ClassifierTier::Fallback,
                reason: "fallback keyword match",
                patterns_matched: vec![word.to_string()],
            };
        }

        IntentResult::unknown()
    }

    /// Tier 1 only: pattern scores plus context hints.
    pub fn classify_rich(&self, text: &str, context: Option<&Context>) -> IntentResult {
        let lower = text.to_lowercase();
        let mut scores = [0.0_f64; Intent::CATALOGUE.len()];
        let mut matched: Vec<Vec<String>> = vec![Vec::new(); Intent::CATALOGUE.len()];

        for (intent, patterns) in COMPILED_PATTERNS.iter() {
            let idx = intent.index();
            for (source, regex) in patterns {
                let hits = regex.find_iter(&lower).count();
                if hits == 0 {
                    continue;
                }
                // Every occurrence counts: the intent's first hit earns the
                // full score, each later one (same pattern or not) the extra.
                let first = usize::from(matched[idx].is_empty());
                scores[idx] +=
                    first as f64 * FIRST_MATCH_SCORE + (hits - first) as f64 * EXTRA_MATCH_SCORE;
                matched[idx].push((*source).to_string());
            }
        }

        let operation = context
            .and_then(|c| c.get("operation"))
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_lowercase());
        let mut hinted = false;
        if let Some(op) = operation.as_deref() {
            for (intent, bonus) in context_hints(op) {
                scores[intent.index()] += bonus;
                hinted = true;
            }
        }

        // Strictly greater keeps the earliest intent on ties.
        let mut best: Option<usize> = None;
        for (idx, score) in scores.iter().enumerate() {
            if *score > 0.0 && best.is_none_or(|b| *score > scores[b]) {
                best = Some(idx);
            }
        }

        match best {
            Some(idx) => IntentResult {
                intent: Intent::CATALOGUE[idx],
                confidence: scores[idx].min(1.0),
                tier: ClassifierTier::Rich,
                reason: if matched[idx].is_empty() && hinted {
                    "context operation hint"
                } else {
                    "intent pattern match"
                },
                patterns_matched: std::mem::take(&mut matched[idx]),
            },
            None => IntentResult::unknown(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    fn ctx_op(op: &str) -> Context {
        let mut ctx = Context::new();
        ctx.insert("operation".into(), json!(op));
        ctx
    }

    #[test]
    fn relationship_query_scenario() {
        let c = IntentClassifier::new();
        let r = c.classify("Find relationships between user and projects", None);
        assert_eq!(r.intent, Intent::QueryRelation);
        assert!(r.confidence >= 0.3);
        assert_eq!(r.tier, ClassifierTier::Rich);
        assert_eq!(r.patterns_matched.len(), 1);
    }

    #[test]
    fn remember_conversation_scenario() {
        let c = IntentClassifier::new();
        let r = c.classify("Remember our previous conversation", None);
        assert_eq!(r.intent, Intent::ContextRetrieval);
        assert_eq!(r.tier, ClassifierTier::Rich);
    }

    #[test]
    fn extra_matches_add_diminishing_score() {
        let c = IntentClassifier::new();
        // "remember" + "history" + "conversation ... about"
        let r = c.classify_rich("remember the conversation about project history", None);
        assert_eq!(r.intent, Intent::ContextRetrieval);
        assert!((r.confidence - 0.7).abs() < 1e-9, "got {}", r.confidence);
        assert_eq!(r.patterns_matched.len(), 3);
    }

    #[test]
    fn confidence_is_capped() {
        let c = IntentClassifier::new();
        let ctx = ctx_op("retrieve");
        let r = c.classify_rich(
            "remember the conversation about project history",
            Some(&ctx),
        );
        assert_eq!(r.intent, Intent::ContextRetrieval);
        assert!((r.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn repeated_occurrences_outweigh_a_single_match() {
        let c = IntentClassifier::new();
        // semantic-search matches once; "remember" and "recall" are two hits
        // of one context-retrieval pattern.
        let r = c.classify_rich("find similar items, remember and recall", None);
        assert_eq!(r.intent, Intent::ContextRetrieval);
        assert!((r.confidence - 0.5).abs() < 1e-9, "got {}", r.confidence);
        assert_eq!(r.patterns_matched.len(), 1);
    }

    #[test]
    fn context_hint_alone_classifies() {
        let c = IntentClassifier::new();
        let r = c.classify("xyzzy", Some(&ctx_op("search")));
        assert_eq!(r.intent, Intent::SemanticSearch);
        assert!((r.confidence - 0.7).abs() < 1e-9);
        assert_eq!(r.reason, "context operation hint");
    }

    #[test]
    fn ties_break_by_catalogue_order() {
        let c = IntentClassifier::new();
        // create-relation and traverse-graph both score 0.3
        let r = c.classify_rich("connect a path to b", None);
        assert_eq!(r.intent, Intent::CreateRelation);
    }

    #[test]
    fn falls_through_to_keyword_tier() {
        let c = IntentClassifier::new();
        let r = c.classify("graph of the team network", None);
        assert_eq!(r.tier, ClassifierTier::Keyword);
        assert_eq!(r.intent, Intent::QueryRelation);
        assert!(r.confidence >= 0.4);
    }

    #[test]
    fn falls_through_to_fallback_tier() {
        let c = IntentClassifier::new();
        let r = c.classify("lookup", None);
        assert_eq!(r.tier, ClassifierTier::Fallback);
        assert_eq!(r.intent, Intent::MemoryLookup);
        assert!((r.confidence - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn keyword_tier_matches_embedded_substrings() {
        let c = IntentClassifier::new();
        let cases = [
            ("update my notebook entries", Intent::WriteDoc),
            ("semantically close items", Intent::ContextRetrieval),
            ("list usernames with profile", Intent::MemoryLookup),
        ];
        for (text, expected) in cases {
            let r = c.classify(text, None);
            assert_eq!(r.intent, expected, "{text}");
            assert_eq!(r.tier, ClassifierTier::Keyword, "{text}");
        }
    }

    #[test]
    fn degenerate_input_is_unknown() {
        let c = IntentClassifier::new();
        for text in ["", "   ", "qwerty asdf"] {
            let r = c.classify(text, None);
            assert_eq!(r.intent, Intent::Unknown);
            assert!((r.confidence - UNKNOWN_CONFIDENCE).abs() < f64::EPSILON);
            assert_eq!(r.tier, ClassifierTier::Default);
            assert!(r.is_degenerate());
        }
    }

    #[test]
    fn intent_names_are_kebab_case() {
        assert_eq!(Intent::QueryRelation.to_string(), "query-relation");
        assert_eq!(
            Intent::from_str("comprehensive-store").unwrap(),
            Intent::ComprehensiveStore
        );
        assert_eq!(
            serde_json::to_value(Intent::ContextRetrieval).unwrap(),
            json!("context-retrieval")
        );
    }

    #[test]
    fn all_patterns_compile() {
        let total: usize = COMPILED_PATTERNS.iter().map(|(_, p)| p.len()).sum();
        let declared: usize = INTENT_PATTERNS.iter().map(|(_, p)| p.len()).sum();
        assert_eq!(total, declared);
    }

    #[test]
    fn display_includes_tier_and_reason() {
        let r = IntentResult::unknown();
        assert_eq!(r.to_string(), "unknown (0.10, default tier: no intent signal)");
    }
}
