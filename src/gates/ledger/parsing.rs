//! Line grammar for the status ledger.
//!
//! A record line looks like `- [STATUS] ID description`. Only lines starting
//! with the record sigil are candidates; every candidate either parses into a
//! [`StatusRecord`] or is kept as a [`MalformedLine`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::config::LedgerConfig;
use crate::error::Result;

/// Prefix that makes a line a record candidate.
pub const RECORD_SIGIL: &str = "- [";

/// Status: one or more uppercase ASCII letters.
pub const STATUS_PATTERN: &str = r"[A-Z]+";

/// ID: one uppercase letter followed by exactly four digits.
pub const RECORD_ID_PATTERN: &str = r"[A-Z][0-9]{4}";

/// Full grammar of a record line.
#[must_use]
pub fn record_line_pattern() -> String {
    format!(
        r"^- \[(?P<status>{})\] (?P<id>{}) (?P<desc>.+)$",
        STATUS_PATTERN, RECORD_ID_PATTERN
    )
}

// ============================================================================
// Parsed line types
// ============================================================================

/// One valid ledger record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    /// 1-based line number in the ledger.
    pub line: usize,
    pub status: String,
    pub id: String,
    pub description: String,
}

impl StatusRecord {
    /// Render as `[STATUS] ID description`.
    #[must_use]
    pub fn preview(&self) -> String {
        format!("[{}] {} {}", self.status, self.id, self.description)
    }
}

/// A candidate line that failed the grammar or the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedLine {
    /// 1-based line number in the ledger.
    pub line: usize,
    /// The line exactly as written.
    pub text: String,
}

/// Parse result for a record candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerLine {
    Record(StatusRecord),
    Malformed(MalformedLine),
}

/// Statuses a record may carry, and the one that counts as finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusVocabulary {
    allowed: BTreeSet<String>,
    terminal: String,
}

impl StatusVocabulary {
    pub fn new(
        statuses: impl IntoIterator<Item = impl Into<String>>,
        terminal: impl Into<String>,
    ) -> Self {
        Self {
            allowed: statuses.into_iter().map(Into::into).collect(),
            terminal: terminal.into(),
        }
    }

    /// Build the vocabulary from ledger configuration.
    #[must_use]
    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(config.statuses.iter().cloned(), config.terminal_status.clone())
    }

    #[must_use]
    pub fn contains(&self, status: &str) -> bool {
        self.allowed.contains(status)
    }

    #[must_use]
    pub fn is_terminal(&self, status: &str) -> bool {
        self.terminal == status
    }

    #[must_use]
    pub fn terminal(&self) -> &str {
        &self.terminal
    }
}

impl Default for StatusVocabulary {
    fn default() -> Self {
        Self::from_config(&LedgerConfig::default())
    }
}

// ============================================================================
// Parser
// ============================================================================

/// All candidates of a ledger, split by outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLedger {
    pub records: Vec<StatusRecord>,
    pub malformed: Vec<MalformedLine>,
}

/// Parses ledger text against a status vocabulary.
#[derive(Debug, Clone)]
pub struct LedgerParser {
    grammar: Regex,
    vocabulary: StatusVocabulary,
}

impl LedgerParser {
    /// Create a parser for the given vocabulary.
    ///
    /// # Errors
    ///
    /// Returns an error if the record grammar fails to compile.
    pub fn new(vocabulary: StatusVocabulary) -> Result<Self> {
        Ok(Self {
            grammar: Regex::new(&record_line_pattern())?,
            vocabulary,
        })
    }

    /// The vocabulary this parser validates statuses against.
    #[must_use]
    pub fn vocabulary(&self) -> &StatusVocabulary {
        &self.vocabulary
    }

    /// Parse one line. Returns `None` for lines that are not record candidates.
    #[must_use]
    pub fn parse_line(&self, line_no: usize, line: &str) -> Option<LedgerLine> {
        if !line.starts_with(RECORD_SIGIL) {
            return None;
        }

        let malformed = || {
            LedgerLine::Malformed(MalformedLine {
                line: line_no,
                text: line.to_string(),
            })
        };

        let Some(caps) = self.grammar.captures(line) else {
            return Some(malformed());
        };

        let status = &caps["status"];
        if !self.vocabulary.contains(status) {
            return Some(malformed());
        }

        Some(LedgerLine::Record(StatusRecord {
            line: line_no,
            status: status.to_string(),
            id: caps["id"].to_string(),
            description: caps["desc"].to_string(),
        }))
    }

    /// Parse every line of a ledger.
    #[must_use]
    pub fn parse(&self, content: &str) -> ParsedLedger {
        let mut parsed = ParsedLedger::default();
        // Only `\n` and `\r\n` end a line; form feeds and Unicode separators stay in the text.
        for (idx, line) in content.lines().enumerate() {
            match self.parse_line(idx + 1, line) {
                Some(LedgerLine::Record(record)) => parsed.records.push(record),
                Some(LedgerLine::Malformed(bad)) => parsed.malformed.push(bad),
                None => {}
            }
        }
        parsed
    }
}
