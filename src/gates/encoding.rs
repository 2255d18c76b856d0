//! Encoding gate: scanned text files are BOM-free UTF-8 without mojibake.
//!
//! Files are collected from every configured scan root, pruned by directory
//! name, filtered by extension, then deduplicated and sorted so diagnostics
//! come out in the same order on every run. Each file gets three independent
//! checks; only the mojibake check depends on the file decoding.

use regex::RegexSet;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use super::{display_path, Gate, GateReport, Violation, ViolationKind};
use crate::config::{EncodingConfig, MojibakeSignature, ScanRoot};
use crate::error::{IoResultExt, Result};
use crate::mode::Mode;

/// The UTF-8 byte-order mark.
pub const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

// ============================================================================
// Mojibake Detection
// ============================================================================

/// Matches decoded text against a set of named corruption signatures.
#[derive(Debug, Clone)]
pub struct MojibakeDetector {
    names: Vec<String>,
    set: RegexSet,
}

impl MojibakeDetector {
    /// Compile the given signatures.
    ///
    /// # Errors
    ///
    /// Returns an error if any signature pattern is not a valid regex.
    pub fn new(signatures: &[MojibakeSignature]) -> Result<Self> {
        let set = RegexSet::new(signatures.iter().map(|s| s.pattern.as_str()))?;
        Ok(Self {
            names: signatures.iter().map(|s| s.name.clone()).collect(),
            set,
        })
    }

    /// Name of the first signature (in declaration order) found in `text`.
    #[must_use]
    pub fn first_match(&self, text: &str) -> Option<&str> {
        self.set
            .matches(text)
            .iter()
            .next()
            .map(|idx| self.names[idx].as_str())
    }

    /// Number of signatures in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the detector has no signatures.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

// ============================================================================
// Encoding Gate
// ============================================================================

/// Quality gate for text encoding hygiene.
pub struct EncodingGate {
    roots: Vec<ScanRoot>,
    ignore_dirs: BTreeSet<String>,
    detector: MojibakeDetector,
}

impl EncodingGate {
    /// Build the gate from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a mojibake signature is not a valid regex.
    pub fn from_config(config: &EncodingConfig) -> Result<Self> {
        Ok(Self {
            roots: config.roots.clone(),
            ignore_dirs: config.ignore_dirs.clone(),
            detector: MojibakeDetector::new(&config.mojibake_signatures)?,
        })
    }

    fn is_pruned(&self, relative: &Path) -> bool {
        relative.components().any(|c| match c {
            Component::Normal(name) => name
                .to_str()
                .is_some_and(|name| self.ignore_dirs.contains(name)),
            _ => false,
        })
    }

    /// Collect every eligible file under the scan roots, sorted and deduplicated.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be traversed.
    pub fn collect_files(&self, project_dir: &Path) -> Result<BTreeSet<PathBuf>> {
        let mut files = BTreeSet::new();

        for root in &self.roots {
            let root_dir = project_dir.join(&root.path);
            if !root_dir.is_dir() {
                debug!(root = %root.path.display(), "scan root absent, skipping");
                continue;
            }

            let walker = WalkDir::new(&root_dir)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|entry| {
                    entry.depth() == 0
                        || !entry.file_type().is_dir()
                        || !entry
                            .file_name()
                            .to_str()
                            .is_some_and(|name| self.ignore_dirs.contains(name))
                });

            for entry in walker {
                let entry = entry?;
                // Symlinked files are checked through their target; dangling links are skipped.
                if !entry.path().is_file() {
                    continue;
                }
                let path = entry.path();
                let relative = path.strip_prefix(project_dir).unwrap_or(path);
                if self.is_pruned(relative) || !root.accepts(path) {
                    continue;
                }
                files.insert(path.to_path_buf());
            }
        }

        Ok(files)
    }

    /// Run the three content checks on one file's bytes.
    ///
    /// Returns each violated kind with optional detail.
    #[must_use]
    pub fn inspect(&self, bytes: &[u8]) -> Vec<(ViolationKind, Option<String>)> {
        let mut found = Vec::new();

        if bytes.starts_with(UTF8_BOM) {
            found.push((ViolationKind::BomPresent, None));
        }

        match std::str::from_utf8(bytes) {
            Ok(text) => {
                if let Some(signature) = self.detector.first_match(text) {
                    found.push((
                        ViolationKind::MojibakeMatch,
                        Some(format!("signature {}", signature)),
                    ));
                }
            }
            Err(_) => found.push((ViolationKind::InvalidEncoding, None)),
        }

        found
    }
}

impl Gate for EncodingGate {
    fn name(&self) -> &str {
        "encoding_gate"
    }

    fn run(&self, project_dir: &Path, _mode: Mode) -> Result<GateReport> {
        let mut report = GateReport::new(self.name());
        let files = self.collect_files(project_dir)?;
        debug!(files = files.len(), "scanning files for encoding issues");

        for path in &files {
            let bytes = std::fs::read(path).with_path(path)?;
            let shown = display_path(project_dir, path);
            for (kind, detail) in self.inspect(&bytes) {
                let violation = Violation::new(kind, shown.clone());
                report.push(match detail {
                    Some(detail) => violation.with_detail(detail),
                    None => violation,
                });
            }
        }

        Ok(report)
    }
}
