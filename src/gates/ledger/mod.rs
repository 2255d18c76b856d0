//! Status ledger gate.
//!
//! The ledger is a text file of status-tagged records. Validation runs in
//! order, and the first three steps end the run when they fail:
//!
//! 1. the ledger must exist;
//! 2. every record candidate must parse (both modes);
//! 3. at least one record must be present (both modes);
//! 4. optionally, record IDs must be unique;
//! 5. in strict mode, every record must carry the terminal status.
//!
//! Status transitions are not tracked between runs; only the current snapshot
//! is checked.

pub mod parsing;

use std::collections::hash_map::{Entry, HashMap};
use std::path::{Path, PathBuf};
use tracing::debug;

pub use parsing::{
    LedgerLine, LedgerParser, MalformedLine, ParsedLedger, StatusRecord, StatusVocabulary,
};

use super::{read_utf8, Gate, GateReport, Violation, ViolationKind};
use crate::config::LedgerConfig;
use crate::error::Result;
use crate::mode::Mode;

/// Quality gate for the status ledger.
pub struct LedgerGate {
    path: PathBuf,
    parser: LedgerParser,
    require_unique_ids: bool,
}

impl LedgerGate {
    /// Build the gate from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the record grammar fails to compile.
    pub fn from_config(config: &LedgerConfig) -> Result<Self> {
        Ok(Self {
            path: config.path.clone(),
            parser: LedgerParser::new(StatusVocabulary::from_config(config))?,
            require_unique_ids: config.require_unique_ids,
        })
    }

    /// Records that reuse an ID seen earlier in the ledger.
    fn duplicate_ids(records: &[StatusRecord]) -> Vec<Violation> {
        let mut first_seen: HashMap<&str, usize> = HashMap::new();
        let mut duplicates = Vec::new();
        for record in records {
            match first_seen.entry(record.id.as_str()) {
                Entry::Occupied(first) => duplicates.push(
                    Violation::new(ViolationKind::DuplicateId, record.preview())
                        .with_line(record.line)
                        .with_detail(format!("first seen on L{}", first.get())),
                ),
                Entry::Vacant(slot) => {
                    slot.insert(record.line);
                }
            }
        }
        duplicates
    }
}

impl Gate for LedgerGate {
    fn name(&self) -> &str {
        "ledger_gate"
    }

    fn run(&self, project_dir: &Path, mode: Mode) -> Result<GateReport> {
        let mut report = GateReport::new(self.name());
        let ledger_path = project_dir.join(&self.path);

        if !ledger_path.is_file() {
            report.push(
                Violation::at_path(ViolationKind::MissingArtifact, &self.path)
                    .with_detail("ledger not found"),
            );
            return Ok(report);
        }

        let content = read_utf8(project_dir, &ledger_path)?;
        let parsed = self.parser.parse(&content);
        debug!(
            records = parsed.records.len(),
            malformed = parsed.malformed.len(),
            "ledger parsed"
        );

        if !parsed.malformed.is_empty() {
            report.extend(parsed.malformed.into_iter().map(|bad| {
                Violation::new(ViolationKind::MalformedLine, bad.text).with_line(bad.line)
            }));
            return Ok(report);
        }

        if parsed.records.is_empty() {
            report.push(
                Violation::at_path(ViolationKind::NoRecords, &self.path)
                    .with_detail("expected at least one record"),
            );
            return Ok(report);
        }

        if self.require_unique_ids {
            report.extend(Self::duplicate_ids(&parsed.records));
        }

        if mode.is_strict() {
            let vocabulary = self.parser.vocabulary();
            report.extend(
                parsed
                    .records
                    .iter()
                    .filter(|r| !vocabulary.is_terminal(&r.status))
                    .map(|r| Violation::new(ViolationKind::IncompleteRecord, r.preview())),
            );
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestFixture;

    const LEDGER: &str = "docs/agent/tasks.md";

    fn gate() -> LedgerGate {
        LedgerGate::from_config(&LedgerConfig::default()).unwrap()
    }

    fn run(content: &str, mode: Mode) -> GateReport {
        let fixture = TestFixture::empty();
        fixture.write_file(LEDGER, content).unwrap();
        gate().run(fixture.path(), mode).unwrap()
    }

    #[test]
    fn test_single_done_record_passes_strict() {
        let report = run("- [DONE] T0001 a\n", Mode::Strict);
        assert!(report.passed());
        assert_eq!(report.render_success(), "ledger_gate: OK");
    }

    #[test]
    fn test_open_record_fails_only_strict() {
        let content = "- [DONE] T0001 a\n- [TODO] T0002 b\n";
        assert!(run(content, Mode::Normal).passed());

        let report = run(content, Mode::Strict);
        let open = report.violations_of(ViolationKind::IncompleteRecord);
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].subject, "[TODO] T0002 b");
        assert!(report.render_failure().contains("T0002"));
    }

    #[test]
    fn test_blocked_and_doing_are_not_terminal() {
        let report = run(
            "- [DOING] T0001 a\n- [BLOCKED] T0002 b\n- [DONE] T0003 c\n",
            Mode::Strict,
        );
        assert_eq!(report.violations_of(ViolationKind::IncompleteRecord).len(), 2);
    }

    #[test]
    fn test_malformed_lines_fail_both_modes() {
        let content = "# Tasks\n- [DONE] T0001 a\n- [todo] T1 desc\n- [TODO] T12 desc\n";
        for mode in [Mode::Normal, Mode::Strict] {
            let report = run(content, mode);
            let bad = report.violations_of(ViolationKind::MalformedLine);
            assert_eq!(bad.len(), 2);
            assert_eq!(bad[0].format(), "L3: - [todo] T1 desc");
            assert_eq!(bad[1].line, Some(4));
            assert!(report.violations_of(ViolationKind::IncompleteRecord).is_empty());
        }
    }

    #[test]
    fn test_malformed_preview_is_capped_at_thirty() {
        let content: String = (1..=45).map(|i| format!("- [bad] line {}\n", i)).collect();
        let report = run(&content, Mode::Normal);
        assert_eq!(report.violations.len(), 45);
        // header + kind line + 30 entries
        assert_eq!(report.render_failure().lines().count(), 32);
    }

    #[test]
    fn test_empty_ledger_fails_both_modes() {
        for mode in [Mode::Normal, Mode::Strict] {
            let report = run("# Tasks\n\nNothing here yet.\n", mode);
            assert_eq!(report.violations_of(ViolationKind::NoRecords).len(), 1);
            assert!(report.has_setup_failure());
            assert!(report.render_failure().contains("no records found"));
        }
    }

    #[test]
    fn test_missing_ledger_is_setup_failure() {
        let fixture = TestFixture::empty();
        let report = gate().run(fixture.path(), Mode::Normal).unwrap();
        let missing = report.violations_of(ViolationKind::MissingArtifact);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].subject, LEDGER);
    }

    #[test]
    fn test_duplicate_ids_allowed_by_default() {
        let content = "- [DONE] T0001 a\n- [DONE] T0001 again\n";
        assert!(run(content, Mode::Strict).passed());
    }

    #[test]
    fn test_duplicate_ids_reported_when_required() {
        let fixture = TestFixture::empty();
        fixture
            .write_file(LEDGER, "- [DONE] T0001 a\n- [DONE] T0002 b\n- [DONE] T0001 again\n")
            .unwrap();
        let config = LedgerConfig {
            require_unique_ids: true,
            ..LedgerConfig::default()
        };
        let report = LedgerGate::from_config(&config)
            .unwrap()
            .run(fixture.path(), Mode::Normal)
            .unwrap();
        let dups = report.violations_of(ViolationKind::DuplicateId);
        assert_eq!(dups.len(), 1);
        assert_eq!(dups[0].format(), "L3: [DONE] T0001 again (first seen on L1)");
    }

    #[test]
    fn test_strict_pass_implies_normal_pass() {
        let ledgers = [
            "- [DONE] T0001 a\n",
            "- [DONE] T0001 a\n- [TODO] T0002 b\n",
            "- [nope]\n",
            "",
        ];
        for content in ledgers {
            if run(content, Mode::Strict).passed() {
                assert!(run(content, Mode::Normal).passed());
            }
        }
    }
}
