// Statement filter: decides which candidates are replayed
use crate::types::StatementCandidate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

/// Why a candidate is not executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Starts with `--`
    Comment,
    /// `SET @...` session variable assignment
    SessionVariable,
    /// `CREATE SCHEMA`; the importer creates the schema itself
    CreateSchema,
    /// `USE`; the importer binds the schema itself
    UseSchema,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::Comment => "comment",
            SkipReason::SessionVariable => "session variable",
            SkipReason::CreateSchema => "schema creation",
            SkipReason::UseSchema => "schema selection",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "reason", rename_all = "snake_case")]
pub enum Classification {
    Execute,
    Skip(SkipReason),
}

impl Classification {
    pub fn is_skip(&self) -> bool {
        matches!(self, Classification::Skip(_))
    }
}

// Matched case-insensitively against the trimmed start of the statement.
static SKIP_RULES: Lazy<Vec<(Regex, SkipReason)>> = Lazy::new(|| {
    [
        (r"^--", SkipReason::Comment),
        (r"(?i)^SET\s+@", SkipReason::SessionVariable),
        (r"(?i)^CREATE\s+SCHEMA\b", SkipReason::CreateSchema),
        (r"(?i)^USE\b", SkipReason::UseSchema),
    ]
    .into_iter()
    .map(|(pattern, reason)| (Regex::new(pattern).expect("skip rule pattern is valid"), reason))
    .collect()
});

/// Classify a statement's text.
pub fn classify_text(text: &str) -> Classification {
    let head = text.trim_start();
    SKIP_RULES
        .iter()
        .find(|(pattern, _)| pattern.is_match(head))
        .map_or(Classification::Execute, |(_, reason)| Classification::Skip(*reason))
}

pub fn classify(candidate: &StatementCandidate) -> Classification {
    classify_text(&candidate.text)
}

pub fn is_skippable(candidate: &StatementCandidate) -> bool {
    classify(candidate).is_skip()
}
