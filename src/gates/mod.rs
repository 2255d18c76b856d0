//! Gate contract shared by every repository check.
//!
//! A gate inspects the repository, records every violation it finds, and
//! only then reports. The full violation list is kept in a [`GateReport`];
//! display caps are applied at render time so programmatic consumers always
//! see everything.
//!
//! # Available Gates
//!
//! - [`InventoryGate`] - Required artifacts exist, are non-trivial, and hold no placeholders
//! - [`EncodingGate`] - Scanned text is BOM-free, valid UTF-8, and free of mojibake
//! - [`LedgerGate`] - The status ledger parses and, in strict mode, is fully done
//!
//! # Example
//!
//! ```rust,ignore
//! use repogate::gates::{execute, InventoryGate};
//! use repogate::{GateConfig, Mode};
//!
//! let config = GateConfig::default();
//! let gate = InventoryGate::from_config(&config.inventory)?;
//! let code = execute(&gate, Path::new("."), Mode::from_env());
//! ```

pub mod encoding;
pub mod inventory;
pub mod ledger;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;

use crate::error::{GateError, IoResultExt, Result};
use crate::mode::Mode;

pub use encoding::{EncodingGate, MojibakeDetector};
pub use inventory::InventoryGate;
pub use ledger::{LedgerGate, LedgerLine, MalformedLine, StatusRecord, StatusVocabulary};

/// Default number of entries shown per violation kind.
pub const DEFAULT_DISPLAY_LIMIT: usize = 50;

/// Number of malformed ledger lines shown.
pub const MALFORMED_DISPLAY_LIMIT: usize = 30;

// ============================================================================
// Violation Types
// ============================================================================

/// Category of a violation. Declaration order is reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    MissingArtifact,
    UndersizedArtifact,
    PlaceholderFound,
    UncheckedItem,
    BomPresent,
    InvalidEncoding,
    MojibakeMatch,
    MalformedLine,
    NoRecords,
    DuplicateId,
    IncompleteRecord,
}

impl ViolationKind {
    /// Stable identifier used in diagnostics.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingArtifact => "missing-artifact",
            Self::UndersizedArtifact => "undersized-artifact",
            Self::PlaceholderFound => "placeholder-found",
            Self::UncheckedItem => "unchecked-item",
            Self::BomPresent => "bom-present",
            Self::InvalidEncoding => "invalid-encoding",
            Self::MojibakeMatch => "mojibake-match",
            Self::MalformedLine => "malformed-line",
            Self::NoRecords => "no-records",
            Self::DuplicateId => "duplicate-id",
            Self::IncompleteRecord => "incomplete-record",
        }
    }

    /// One-line description used in the `GATE FAIL` header.
    #[must_use]
    pub fn headline(&self) -> &'static str {
        match self {
            Self::MissingArtifact => "missing required files",
            Self::UndersizedArtifact => "required files look empty/suspiciously small",
            Self::PlaceholderFound => "placeholder markers found",
            Self::UncheckedItem => "release gate requires all checklist items checked",
            Self::BomPresent => "UTF-8 BOM found",
            Self::InvalidEncoding => "non UTF-8 file",
            Self::MojibakeMatch => "suspicious mojibake fragments",
            Self::MalformedLine => "invalid ledger lines",
            Self::NoRecords => "no records found",
            Self::DuplicateId => "duplicate record ids",
            Self::IncompleteRecord => "release gate requires all records done",
        }
    }

    /// Maximum number of entries rendered for this kind; `None` means all.
    #[must_use]
    pub fn display_limit(&self) -> Option<usize> {
        match self {
            Self::MalformedLine => Some(MALFORMED_DISPLAY_LIMIT),
            Self::BomPresent | Self::InvalidEncoding | Self::MojibakeMatch => None,
            _ => Some(DEFAULT_DISPLAY_LIMIT),
        }
    }

    /// Setup violations mean nothing downstream could be checked.
    #[must_use]
    pub fn is_setup(&self) -> bool {
        matches!(self, Self::MissingArtifact | Self::NoRecords)
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A single violation found by a gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Category of the violation.
    pub kind: ViolationKind,
    /// What the violation is about: a path, a raw line, or a record.
    pub subject: String,
    /// 1-based line number (if applicable).
    pub line: Option<usize>,
    /// Extra context, e.g. the matching pattern.
    pub detail: Option<String>,
}

impl Violation {
    /// Create a new violation.
    pub fn new(kind: ViolationKind, subject: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            line: None,
            detail: None,
        }
    }

    /// Create a violation about a path.
    pub fn at_path(kind: ViolationKind, path: impl AsRef<Path>) -> Self {
        Self::new(kind, path.as_ref().display().to_string())
    }

    /// Add a line number.
    #[must_use]
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Add detail text.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Format as a diagnostic entry.
    #[must_use]
    pub fn format(&self) -> String {
        let mut entry = match self.line {
            Some(line) => format!("L{}: {}", line, self.subject),
            None => self.subject.clone(),
        };
        if let Some(ref detail) = self.detail {
            entry.push_str(&format!(" ({})", detail));
        }
        entry
    }
}

// ============================================================================
// Gate Report
// ============================================================================

/// Everything a gate found during one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateReport {
    /// Name of the gate that was run.
    pub gate_name: String,
    /// All violations, untruncated, in discovery order.
    pub violations: Vec<Violation>,
}

impl GateReport {
    /// Create an empty report.
    pub fn new(gate_name: impl Into<String>) -> Self {
        Self {
            gate_name: gate_name.into(),
            violations: Vec::new(),
        }
    }

    /// Record a violation.
    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Record several violations.
    pub fn extend(&mut self, violations: impl IntoIterator<Item = Violation>) {
        self.violations.extend(violations);
    }

    /// Whether the gate passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Whether any violation is a setup failure.
    #[must_use]
    pub fn has_setup_failure(&self) -> bool {
        self.violations.iter().any(|v| v.kind.is_setup())
    }

    /// All violations of one kind.
    #[must_use]
    pub fn violations_of(&self, kind: ViolationKind) -> Vec<&Violation> {
        self.violations.iter().filter(|v| v.kind == kind).collect()
    }

    /// Violations grouped by kind, in kind order.
    #[must_use]
    pub fn by_kind(&self) -> BTreeMap<ViolationKind, Vec<&Violation>> {
        let mut grouped: BTreeMap<ViolationKind, Vec<&Violation>> = BTreeMap::new();
        for violation in &self.violations {
            grouped.entry(violation.kind).or_default().push(violation);
        }
        grouped
    }

    /// Success line printed to stdout.
    #[must_use]
    pub fn render_success(&self) -> String {
        format!("{}: OK", self.gate_name)
    }

    /// Failure text printed to stderr, with display caps applied.
    #[must_use]
    pub fn render_failure(&self) -> String {
        let grouped = self.by_kind();
        let headlines: Vec<&str> = grouped.keys().map(|k| k.headline()).collect();

        let mut lines = vec![format!("GATE FAIL: {}", headlines.join("; "))];
        for (kind, violations) in &grouped {
            lines.push(format!("{}:", kind.code()));
            let shown = kind.display_limit().unwrap_or(violations.len());
            lines.extend(
                violations
                    .iter()
                    .take(shown)
                    .map(|v| format!("  - {}", v.format())),
            );
        }
        lines.join("\n")
    }

    /// Exit code for this report.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        if self.passed() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

// ============================================================================
// Gate Trait
// ============================================================================

/// A repository check.
///
/// `run` records violations instead of returning early on them; it only
/// returns `Err` when the gate cannot continue at all (an unreadable or
/// undecodable file it depends on).
pub trait Gate {
    /// Name printed in `<name>: OK`.
    fn name(&self) -> &str;

    /// Run every check of this gate against the project.
    ///
    /// # Errors
    ///
    /// Returns an error if the gate fails to execute (not if checks fail).
    fn run(&self, project_dir: &Path, mode: Mode) -> Result<GateReport>;
}

/// Run a gate and report its outcome on stdout/stderr.
///
/// This is the only place gate output is printed; nothing propagates past it.
pub fn execute(gate: &dyn Gate, project_dir: &Path, mode: Mode) -> ExitCode {
    debug!(gate = gate.name(), %mode, "running gate");
    match gate.run(project_dir, mode) {
        Ok(report) if report.passed() => {
            println!("{}", report.render_success());
            ExitCode::SUCCESS
        }
        Ok(report) => {
            debug!(
                gate = gate.name(),
                violations = report.violations.len(),
                setup = report.has_setup_failure(),
                "gate failed"
            );
            eprintln!("{}", report.render_failure());
            report.exit_code()
        }
        Err(e) => {
            eprintln!("GATE FAIL: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

/// Read a file that must be strict UTF-8.
pub(crate) fn read_utf8(project_dir: &Path, path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_path(path)?;
    String::from_utf8(bytes).map_err(|_| GateError::Undecodable {
        path: PathBuf::from(display_path(project_dir, path)),
    })
}

/// Path relative to the project root, for diagnostics.
pub(crate) fn display_path(project_dir: &Path, path: &Path) -> String {
    path.strip_prefix(project_dir)
        .unwrap_or(path)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_kind_ordering() {
        assert!(ViolationKind::MissingArtifact < ViolationKind::UndersizedArtifact);
        assert!(ViolationKind::BomPresent < ViolationKind::InvalidEncoding);
        assert!(ViolationKind::InvalidEncoding < ViolationKind::MojibakeMatch);
    }

    #[test]
    fn test_violation_kind_codes() {
        assert_eq!(ViolationKind::BomPresent.code(), "bom-present");
        assert_eq!(ViolationKind::InvalidEncoding.code(), "invalid-encoding");
        assert_eq!(ViolationKind::MojibakeMatch.to_string(), "mojibake-match");
    }

    #[test]
    fn test_display_limits() {
        assert_eq!(ViolationKind::MalformedLine.display_limit(), Some(30));
        assert_eq!(ViolationKind::IncompleteRecord.display_limit(), Some(50));
        assert_eq!(ViolationKind::BomPresent.display_limit(), None);
    }

    #[test]
    fn test_violation_format() {
        let v = Violation::new(ViolationKind::MalformedLine, "- [todo] T1 desc").with_line(3);
        assert_eq!(v.format(), "L3: - [todo] T1 desc");

        let v = Violation::at_path(ViolationKind::PlaceholderFound, "docs/agent/product.md")
            .with_detail("pattern '\\bTBD\\b'");
        assert_eq!(v.format(), "docs/agent/product.md (pattern '\\bTBD\\b')");
    }

    #[test]
    fn test_empty_report_passes() {
        let report = GateReport::new("demo_gate");
        assert!(report.passed());
        assert_eq!(report.render_success(), "demo_gate: OK");
        assert_eq!(report.exit_code(), ExitCode::SUCCESS);
    }

    #[test]
    fn test_render_failure_groups_by_kind() {
        let mut report = GateReport::new("demo_gate");
        report.push(Violation::at_path(ViolationKind::MojibakeMatch, "src/b.ts"));
        report.push(Violation::at_path(ViolationKind::BomPresent, "src/a.ts"));
        report.push(Violation::at_path(ViolationKind::BomPresent, "src/c.ts"));

        let text = report.render_failure();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "GATE FAIL: UTF-8 BOM found; suspicious mojibake fragments",
                "bom-present:",
                "  - src/a.ts",
                "  - src/c.ts",
                "mojibake-match:",
                "  - src/b.ts",
            ]
        );
        assert!(!report.passed());
        assert_eq!(report.exit_code(), ExitCode::FAILURE);
    }

    #[test]
    fn test_render_failure_caps_but_report_keeps_everything() {
        let mut report = GateReport::new("demo_gate");
        for i in 0..80 {
            report.push(
                Violation::new(ViolationKind::MalformedLine, format!("- [x] {}", i)).with_line(i),
            );
        }

        let text = report.render_failure();
        // header + kind line + 30 entries
        assert_eq!(text.lines().count(), 32);
        assert_eq!(report.violations_of(ViolationKind::MalformedLine).len(), 80);
    }

    #[test]
    fn test_uncapped_kinds_render_all() {
        let mut report = GateReport::new("encoding_gate");
        for i in 0..120 {
            report.push(Violation::at_path(
                ViolationKind::InvalidEncoding,
                format!("src/f{}.md", i),
            ));
        }
        assert_eq!(report.render_failure().lines().count(), 122);
    }

    #[test]
    fn test_setup_classification() {
        let mut report = GateReport::new("ledger_gate");
        report.push(Violation::new(ViolationKind::IncompleteRecord, "[TODO] T0001 a"));
        assert!(!report.has_setup_failure());
        report.push(Violation::new(ViolationKind::NoRecords, "tasks.md"));
        assert!(report.has_setup_failure());
    }

    #[test]
    fn test_display_path_strips_project_root() {
        let root = Path::new("/repo");
        assert_eq!(
            display_path(root, Path::new("/repo/docs/agent/tasks.md")),
            "docs/agent/tasks.md"
        );
        assert_eq!(display_path(root, Path::new("/elsewhere/x")), "/elsewhere/x");
    }
}
