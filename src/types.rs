use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of characters kept from a failing statement for diagnostics.
pub const PREVIEW_CHARS: usize = 50;

/// The full contents of a dump. Never blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawScript {
    text: String,
}

impl RawScript {
    /// Wrap dump text, returning `None` when it has no meaningful content.
    pub fn from_text(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            None
        } else {
            Some(Self { text })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Size of the dump in bytes.
    pub fn byte_len(&self) -> usize {
        self.text.len()
    }
}

/// A trimmed, delimiter-bounded slice of the dump, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementCandidate {
    /// 1-based position among the candidates of the dump
    pub ordinal: usize,
    /// Statement text without the terminator
    pub text: String,
}

impl StatementCandidate {
    pub fn new(ordinal: usize, text: impl Into<String>) -> Self {
        Self { ordinal, text: text.into() }
    }

    /// The first [`PREVIEW_CHARS`] characters of the statement.
    pub fn preview(&self) -> String {
        preview(&self.text)
    }
}

/// A candidate that passed the statement filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutableStatement {
    pub ordinal: usize,
    pub text: String,
}

impl From<&StatementCandidate> for ExecutableStatement {
    fn from(candidate: &StatementCandidate) -> Self {
        Self {
            ordinal: candidate.ordinal,
            text: candidate.text.clone(),
        }
    }
}

/// Result of running one executable statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    Succeeded {
        ordinal: usize,
    },
    Failed {
        ordinal: usize,
        message: String,
        preview: String,
    },
}

impl ExecutionOutcome {
    pub fn failed(statement: &ExecutableStatement, message: impl Into<String>) -> Self {
        Self::Failed {
            ordinal: statement.ordinal,
            message: message.into(),
            preview: preview(&statement.text),
        }
    }

    pub fn ordinal(&self) -> usize {
        match self {
            Self::Succeeded { ordinal } | Self::Failed { ordinal, .. } => *ordinal,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Failure text in the form `<server error> (Query: <preview>...)`.
    pub fn failure_message(&self) -> Option<String> {
        match self {
            Self::Succeeded { .. } => None,
            Self::Failed { message, preview, .. } => {
                Some(format!("{} (Query: {}...)", message, preview))
            }
        }
    }
}

/// Database flavour a session talks to. Also selects the tokenizer dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    MySql,
    Postgres,
}

impl Backend {
    pub fn default_port(&self) -> u16 {
        match self {
            Backend::MySql => 3306,
            Backend::Postgres => 5432,
        }
    }

    /// Quote an identifier, doubling any embedded quote character.
    pub fn quote_identifier(&self, name: &str) -> String {
        let quote = match self {
            Backend::MySql => '`',
            Backend::Postgres => '"',
        };
        let mut quoted = String::with_capacity(name.len() + 2);
        quoted.push(quote);
        for ch in name.chars() {
            if ch == quote {
                quoted.push(quote);
            }
            quoted.push(ch);
        }
        quoted.push(quote);
        quoted
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::MySql => write!(f, "mysql"),
            Backend::Postgres => write!(f, "postgres"),
        }
    }
}

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}
