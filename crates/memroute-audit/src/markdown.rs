// SPDX-FileCopyrightText: 2026 Memroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only markdown audit trail.
//!
//! Each process run opens a session section on first write, then appends one
//! block per entry:
//!
//! ```text
//! **[HIGH]** Memory System Failure (at 2026-01-05 10:11:12)
//! - **Description**: graph failed during store operation
//! - **Context**: Operation took 12ms before failing
//! - **Metrics**: { ... }
//! ```

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use memroute_core::{AuditEntry, AuditSink};

const ENTRY_PREFIX: &str = "**[";

/// Writes audit entries to a markdown file.
///
/// IO errors are logged and swallowed.
#[derive(Debug)]
pub struct MarkdownAuditSink {
    path: PathBuf,
    session_id: String,
    /// Whether the session header has been written. Also serializes appends.
    started: Mutex<bool>,
}

/// Entries recorded in the file so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub session_id: String,
    /// Heading line of every entry in the file, oldest first.
    pub entries: Vec<String>,
}

impl SessionSummary {
    pub fn total(&self) -> usize {
        self.entries.len()
    }
}

impl MarkdownAuditSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            session_id: Utc::now().format("%Y%m%d_%H%M%S").to_string(),
            started: Mutex::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Entry headings currently in the file. A missing file has none.
    pub fn summary(&self) -> io::Result<SessionSummary> {
        let entries = match std::fs::read_to_string(&self.path) {
            Ok(text) => text
                .lines()
                .filter(|line| line.starts_with(ENTRY_PREFIX))
                .map(str::to_string)
                .collect(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e),
        };
        Ok(SessionSummary {
            session_id: self.session_id.clone(),
            entries,
        })
    }

    fn append(&self, entry: &AuditEntry) -> io::Result<()> {
        let mut started = self.started.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut block = String::new();
        if !*started {
            block.push_str(&format!(
                "\n\n## Audit Session - {}\nSession ID: {}\n\n",
                Utc::now().format("%Y-%m-%d %H:%M:%S"),
                self.session_id
            ));
        }
        block.push_str(&render_entry(entry));
        file.write_all(block.as_bytes())?;
        *started = true;
        Ok(())
    }
}

/// Render one entry as a markdown block, trailing blank line included.
pub fn render_entry(entry: &AuditEntry) -> String {
    let mut out = format!(
        "{ENTRY_PREFIX}{}]** {} (at {})\n- **Description**: {}\n",
        entry.severity,
        entry.category,
        Utc::now().format("%Y-%m-%d %H:%M:%S"),
        entry.description
    );
    if let Some(context) = &entry.context {
        out.push_str(&format!("- **Context**: {context}\n"));
    }
    if let Some(metrics) = &entry.metrics {
        let pretty = serde_json::to_string_pretty(metrics).unwrap_or_else(|_| metrics.to_string());
        out.push_str(&format!("- **Metrics**: {pretty}\n"));
    }
    out.push('\n');
    out
}

impl AuditSink for MarkdownAuditSink {
    fn record(&self, entry: AuditEntry) {
        if let Err(e) = self.append(&entry) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                category = %entry.category,
                "failed to write audit entry"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memroute_core::Severity;
    use serde_json::json;

    #[test]
    fn render_includes_optional_fields() {
        let entry = AuditEntry::new(
            "Fallback Success",
            "graph failed, cache served",
            Severity::Medium,
        )
        .with_context("Consider investigating primary system issue")
        .with_metrics(json!({"fallback_system": "cache"}));
        let text = render_entry(&entry);
        assert!(text.starts_with("**[MEDIUM]** Fallback Success (at "));
        assert!(text.contains("- **Description**: graph failed, cache served\n"));
        assert!(text.contains("- **Context**: Consider investigating primary system issue\n"));
        assert!(text.contains("- **Metrics**: {\n  \"fallback_system\": \"cache\"\n}\n"));
        assert!(text.ends_with("\n\n"));
    }

    #[test]
    fn render_omits_missing_fields() {
        let text = render_entry(&AuditEntry::new(
            "Automated Routing Decision",
            "routed",
            Severity::Low,
        ));
        assert!(!text.contains("**Context**"));
        assert!(!text.contains("**Metrics**"));
    }

    #[test]
    fn summary_of_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let sink = MarkdownAuditSink::new(dir.path().join("none.md"));
        assert_eq!(sink.summary().unwrap().total(), 0);
    }
}
