//! Inventory gate: required artifacts exist, carry content, and are finished.
//!
//! Passes run in a fixed order:
//!
//! 1. Existence - any missing artifact ends the run immediately, since
//!    nothing after it can read the file.
//! 2. Size - every artifact shorter than its threshold is reported.
//! 3. Placeholders - each key artifact is decoded as strict UTF-8 and
//!    searched; the first matching pattern per file is reported.
//! 4. Checklist (strict mode only) - every unchecked `- [ ] item` line is
//!    reported verbatim.
//!
//! Passes 2-4 all run before the report is returned.

use regex::{Regex, RegexBuilder};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{read_utf8, Gate, GateReport, Violation, ViolationKind};
use crate::config::{InventoryConfig, RequiredArtifact};
use crate::error::{IoResultExt, Result};
use crate::mode::Mode;

/// A checklist line with an empty box followed by item text.
pub const UNCHECKED_ITEM_PATTERN: &str = r"^- \[ \] .+$";

/// Quality gate for the required document inventory.
pub struct InventoryGate {
    required: Vec<RequiredArtifact>,
    key_artifacts: Vec<PathBuf>,
    placeholders: Vec<Regex>,
    checklist: PathBuf,
    unchecked_item: Regex,
}

impl InventoryGate {
    /// Build the gate from configuration, compiling its patterns.
    ///
    /// # Errors
    ///
    /// Returns an error if a placeholder pattern is not a valid regex.
    pub fn from_config(config: &InventoryConfig) -> Result<Self> {
        let placeholders = config
            .placeholder_patterns
            .iter()
            .map(|p| RegexBuilder::new(p).case_insensitive(true).build())
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            required: config.required.clone(),
            key_artifacts: config.key_artifacts.clone(),
            placeholders,
            checklist: config.checklist.clone(),
            unchecked_item: Regex::new(UNCHECKED_ITEM_PATTERN)?,
        })
    }

    fn missing_artifacts(&self, project_dir: &Path) -> Vec<Violation> {
        self.required
            .iter()
            .filter(|a| !project_dir.join(&a.path).exists())
            .map(|a| Violation::at_path(ViolationKind::MissingArtifact, &a.path))
            .collect()
    }

    fn undersized_artifacts(&self, project_dir: &Path) -> Result<Vec<Violation>> {
        let mut violations = Vec::new();
        for artifact in &self.required {
            let path = project_dir.join(&artifact.path);
            let len = std::fs::metadata(&path).with_path(&path)?.len();
            if len < artifact.min_size_bytes {
                violations.push(
                    Violation::at_path(ViolationKind::UndersizedArtifact, &artifact.path)
                        .with_detail(format!("{} bytes < {}", len, artifact.min_size_bytes)),
                );
            }
        }
        Ok(violations)
    }

    fn placeholder_hits(&self, project_dir: &Path) -> Result<Vec<Violation>> {
        let mut violations = Vec::new();
        for key in &self.key_artifacts {
            let text = read_utf8(project_dir, &project_dir.join(key))?;
            if let Some(pattern) = self.placeholders.iter().find(|re| re.is_match(&text)) {
                violations.push(
                    Violation::at_path(ViolationKind::PlaceholderFound, key)
                        .with_detail(format!("pattern '{}'", pattern.as_str())),
                );
            }
        }
        Ok(violations)
    }

    fn unchecked_items(&self, project_dir: &Path) -> Result<Vec<Violation>> {
        let text = read_utf8(project_dir, &project_dir.join(&self.checklist))?;
        Ok(text
            .lines()
            .filter(|line| self.unchecked_item.is_match(line))
            .map(|line| Violation::new(ViolationKind::UncheckedItem, line))
            .collect())
    }
}

impl Gate for InventoryGate {
    fn name(&self) -> &str {
        "inventory_gate"
    }

    fn run(&self, project_dir: &Path, mode: Mode) -> Result<GateReport> {
        let mut report = GateReport::new(self.name());

        let missing = self.missing_artifacts(project_dir);
        if !missing.is_empty() {
            debug!(count = missing.len(), "required artifacts missing");
            report.extend(missing);
            return Ok(report);
        }

        report.extend(self.undersized_artifacts(project_dir)?);
        report.extend(self.placeholder_hits(project_dir)?);

        if mode.is_strict() {
            report.extend(self.unchecked_items(project_dir)?);
        }

        debug!(
            artifacts = self.required.len(),
            violations = report.violations.len(),
            "inventory checked"
        );
        Ok(report)
    }
}
