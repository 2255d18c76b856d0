//! Configuration management for repogate.
//!
//! Every gate is driven by a fixed, declarative description of the state the
//! repository must be in. The description lives in an optional
//! `repogate.json` at the project root; anything it leaves out falls back to
//! the defaults below.
//!
//! # Example repogate.json
//!
//! ```json
//! {
//!   "inventory": {
//!     "required": [
//!       { "path": "README.md", "minSizeBytes": 200 },
//!       { "path": "docs/checklist.md" }
//!     ],
//!     "keyArtifacts": ["README.md"],
//!     "checklist": "docs/checklist.md"
//!   },
//!   "ledger": { "requireUniqueIds": true }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use crate::error::{GateError, IoResultExt, Result};

/// Name of the configuration file looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "repogate.json";

/// Size below which a required artifact is considered suspiciously small.
pub const DEFAULT_MIN_SIZE_BYTES: u64 = 40;

/// Default directories pruned from encoding scans
pub fn default_ignore_dirs() -> BTreeSet<String> {
    [".git", ".next", "node_modules", "dist", "coverage", ".serena"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// File extension categories
pub mod extensions {
    pub const CODE: &[&str] = &[".ts", ".tsx", ".js", ".jsx", ".mjs", ".cjs", ".sql"];

    pub const CONFIG: &[&str] = &[".json", ".yml", ".yaml"];

    pub const DOCS: &[&str] = &[".md", ".txt"];

    pub const WEB: &[&str] = &[".html", ".css"];

    pub const SCRIPT: &[&str] = &[".ps1"];

    /// Get all text extensions checked by the encoding gate
    pub fn text() -> Vec<&'static str> {
        let mut all = Vec::new();
        all.extend_from_slice(CODE);
        all.extend_from_slice(CONFIG);
        all.extend_from_slice(DOCS);
        all.extend_from_slice(WEB);
        all.extend_from_slice(SCRIPT);
        all
    }
}

// ============================================================================
// Inventory
// ============================================================================

/// A path that must exist and carry real content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredArtifact {
    /// Path relative to the project root.
    pub path: PathBuf,

    /// Files shorter than this are reported as suspiciously small.
    #[serde(default = "default_min_size_bytes")]
    pub min_size_bytes: u64,
}

impl RequiredArtifact {
    /// Create a required artifact with the default size threshold.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            min_size_bytes: DEFAULT_MIN_SIZE_BYTES,
        }
    }

    /// Override the size threshold.
    #[must_use]
    pub fn with_min_size(mut self, min_size_bytes: u64) -> Self {
        self.min_size_bytes = min_size_bytes;
        self
    }
}

fn default_min_size_bytes() -> u64 {
    DEFAULT_MIN_SIZE_BYTES
}

/// Configuration for the inventory gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryConfig {
    /// Artifacts that must exist, in reporting order.
    #[serde(default = "default_required")]
    pub required: Vec<RequiredArtifact>,

    /// Artifacts searched for placeholder markers.
    #[serde(default = "default_key_artifacts")]
    pub key_artifacts: Vec<PathBuf>,

    /// Case-insensitive regexes that must not occur in key artifacts.
    #[serde(default = "default_placeholder_patterns")]
    pub placeholder_patterns: Vec<String>,

    /// Checklist whose items must all be ticked in strict mode.
    #[serde(default = "default_checklist")]
    pub checklist: PathBuf,
}

fn default_required() -> Vec<RequiredArtifact> {
    [
        "Agents.md",
        "docs/agent/product.md",
        "docs/agent/architecture.md",
        "docs/agent/tasks.md",
        "docs/agent/checklist.md",
        "docs/agent/changelog_agent.md",
        "docs/agent/sources.md",
        "scripts/qa_gate.ps1",
        "scripts/checklist_gate.py",
        "scripts/task_gate.py",
    ]
    .into_iter()
    .map(RequiredArtifact::new)
    .collect()
}

fn default_key_artifacts() -> Vec<PathBuf> {
    vec![
        PathBuf::from("docs/agent/product.md"),
        PathBuf::from("docs/agent/architecture.md"),
    ]
}

fn default_placeholder_patterns() -> Vec<String> {
    vec![r"\bTBD\b".to_string(), r"\bTODO: FILL\b".to_string()]
}

fn default_checklist() -> PathBuf {
    PathBuf::from("docs/agent/checklist.md")
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            required: default_required(),
            key_artifacts: default_key_artifacts(),
            placeholder_patterns: default_placeholder_patterns(),
            checklist: default_checklist(),
        }
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// A directory scanned by the encoding gate, with the extensions it checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRoot {
    /// Directory relative to the project root.
    pub path: PathBuf,

    /// Extensions including the leading dot, e.g. `.md`. Matched case-insensitively.
    #[serde(default = "default_text_extensions")]
    pub extensions: Vec<String>,
}

impl ScanRoot {
    /// Create a scan root allowing the default text extensions.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            extensions: default_text_extensions(),
        }
    }

    /// Check whether a file's extension is on this root's allow-list.
    #[must_use]
    pub fn accepts(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let suffix = format!(".{}", ext.to_lowercase());
        self.extensions
            .iter()
            .any(|allowed| allowed.to_lowercase() == suffix)
    }
}

fn default_text_extensions() -> Vec<String> {
    extensions::text().into_iter().map(String::from).collect()
}

/// A named text fragment characteristic of mis-decoded UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MojibakeSignature {
    /// Short identifier shown next to matching files.
    pub name: String,
    /// Regex matched against the decoded text.
    pub pattern: String,
}

impl MojibakeSignature {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
        }
    }
}

/// Fragments seen when UTF-8 text is decoded as cp1251 or cp1252.
pub fn default_mojibake_signatures() -> Vec<MojibakeSignature> {
    vec![
        MojibakeSignature::new("cp1251-cyrillic-pair", "[РС][ЃЌЋЏђѓєѕіїјљњћќўџ]"),
        MojibakeSignature::new("cp1251-punctuation", "вЂ"),
        MojibakeSignature::new("cp1251-emoji", "рџ"),
        MojibakeSignature::new("cp1252-punctuation", "â€"),
    ]
}

/// Configuration for the encoding gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodingConfig {
    /// Roots scanned in order.
    #[serde(default = "default_scan_roots")]
    pub roots: Vec<ScanRoot>,

    /// Directory names pruned anywhere below the project root.
    #[serde(default = "default_ignore_dirs")]
    pub ignore_dirs: BTreeSet<String>,

    /// Mojibake signatures, matched as a disjunction.
    #[serde(default = "default_mojibake_signatures")]
    pub mojibake_signatures: Vec<MojibakeSignature>,
}

fn default_scan_roots() -> Vec<ScanRoot> {
    ["src", "supabase", "scripts"]
        .into_iter()
        .map(ScanRoot::new)
        .collect()
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            roots: default_scan_roots(),
            ignore_dirs: default_ignore_dirs(),
            mojibake_signatures: default_mojibake_signatures(),
        }
    }
}

// ============================================================================
// Ledger
// ============================================================================

/// Configuration for the status ledger gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerConfig {
    /// Ledger file relative to the project root.
    #[serde(default = "default_ledger_path")]
    pub path: PathBuf,

    /// Allowed status vocabulary.
    #[serde(default = "default_statuses")]
    pub statuses: Vec<String>,

    /// Status every record must carry in strict mode.
    #[serde(default = "default_terminal_status")]
    pub terminal_status: String,

    /// Report records that reuse an ID already seen in the ledger.
    #[serde(default)]
    pub require_unique_ids: bool,
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("docs/agent/tasks.md")
}

fn default_statuses() -> Vec<String> {
    ["TODO", "DOING", "DONE", "BLOCKED"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_terminal_status() -> String {
    "DONE".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: default_ledger_path(),
            statuses: default_statuses(),
            terminal_status: default_terminal_status(),
            require_unique_ids: false,
        }
    }
}

// ============================================================================
// Top-level configuration
// ============================================================================

/// Gate configuration loaded from `repogate.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(default)]
    pub inventory: InventoryConfig,

    #[serde(default)]
    pub encoding: EncodingConfig,

    #[serde(default)]
    pub ledger: LedgerConfig,
}

impl GateConfig {
    /// Load configuration for a project.
    ///
    /// An explicit path must exist; the implicit `repogate.json` is optional
    /// and its absence yields the defaults.
    pub fn load(project_dir: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(GateError::config_with_path(
                        "configuration file not found",
                        path.to_path_buf(),
                    ));
                }
                path.to_path_buf()
            }
            None => {
                let path = Self::config_path(project_dir);
                if !path.exists() {
                    return Ok(Self::default());
                }
                path
            }
        };

        let content = std::fs::read_to_string(&path).with_path(&path)?;
        serde_json::from_str(&content)
            .map_err(|e| GateError::config_with_path(e.to_string(), path.clone()))
    }

    /// Get the default configuration path for a project
    pub fn config_path(project_dir: &Path) -> PathBuf {
        project_dir.join(CONFIG_FILE_NAME)
    }

    /// Check every section for values the gates cannot work with.
    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        let mut report = self.inventory.validate();
        report.merge(self.encoding.validate());
        report.merge(self.ledger.validate());
        report
    }
}

impl InventoryConfig {
    /// Check the inventory section.
    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        let required: HashSet<&Path> = self.required.iter().map(|a| a.path.as_path()).collect();
        for key in &self.key_artifacts {
            if !required.contains(key.as_path()) {
                report.errors.push(format!(
                    "inventory.keyArtifacts: {} is not a required artifact",
                    key.display()
                ));
            }
        }
        for pattern in &self.placeholder_patterns {
            if let Err(e) = regex::RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
            {
                report.errors.push(format!(
                    "inventory.placeholderPatterns: invalid regex '{}': {}",
                    pattern, e
                ));
            }
        }

        report
    }
}

impl EncodingConfig {
    /// Check the encoding section.
    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        let mut seen_roots = HashSet::new();
        for root in &self.roots {
            if !seen_roots.insert(&root.path) {
                report.warnings.push(format!(
                    "encoding.roots: {} is listed more than once",
                    root.path.display()
                ));
            }
            for ext in &root.extensions {
                if !ext.starts_with('.') || ext.len() < 2 {
                    report.errors.push(format!(
                        "encoding.roots: extension '{}' for {} must start with a dot",
                        ext,
                        root.path.display()
                    ));
                }
            }
        }
        for signature in &self.mojibake_signatures {
            if let Err(e) = regex::Regex::new(&signature.pattern) {
                report.errors.push(format!(
                    "encoding.mojibakeSignatures: invalid regex for '{}': {}",
                    signature.name, e
                ));
            }
        }

        report
    }
}

impl LedgerConfig {
    /// Check the ledger section.
    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        if self.statuses.is_empty() {
            report
                .errors
                .push("ledger.statuses: vocabulary must not be empty".to_string());
        }
        for status in &self.statuses {
            if status.is_empty() || !status.chars().all(|c| c.is_ascii_uppercase()) {
                report.errors.push(format!(
                    "ledger.statuses: '{}' must be one or more uppercase letters",
                    status
                ));
            }
        }
        if !self.statuses.contains(&self.terminal_status) {
            report.errors.push(format!(
                "ledger.terminalStatus: '{}' is not in the status vocabulary",
                self.terminal_status
            ));
        }

        report
    }
}

/// Result of configuration validation.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Errors that prevent the gates from running.
    pub errors: Vec<String>,
    /// Warnings that don't prevent validity but indicate potential issues.
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// Create a new empty validation report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append another report's findings.
    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Check if the configuration is valid (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Convert the first error into a [`GateError`], if any.
    pub fn into_result(self) -> Result<()> {
        match self.errors.into_iter().next() {
            Some(reason) => {
                let (field, reason) = reason
                    .split_once(": ")
                    .map(|(f, r)| (f.to_string(), r.to_string()))
                    .unwrap_or_else(|| ("config".to_string(), reason.clone()));
                Err(GateError::invalid_config(field, reason))
            }
            None => Ok(()),
        }
    }
}
