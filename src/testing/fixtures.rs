//! Test fixtures for creating reproducible repository trees.
//!
//! Provides pre-built repository layouts matching the default gate
//! configuration, so each test only has to describe what it breaks.

use std::path::Path;
use tempfile::TempDir;

use crate::config::GateConfig;

/// A test fixture representing a temporary repository.
///
/// Automatically cleans up when dropped.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::healthy_repo();
/// fixture.write_file("docs/agent/product.md", "TBD").unwrap();
/// // Directory is cleaned up when fixture goes out of scope
/// ```
pub struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    /// Create an empty repository.
    ///
    /// # Panics
    ///
    /// Panics if temporary directory creation fails.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Create a repository that passes every gate in strict mode under the
    /// default configuration.
    ///
    /// # Panics
    ///
    /// Panics if file creation fails.
    #[must_use]
    pub fn healthy_repo() -> Self {
        let fixture = Self::empty();

        for artifact in GateConfig::default().inventory.required {
            let content = match artifact.path.to_str() {
                Some("docs/agent/tasks.md") => Self::done_ledger_content(),
                Some("docs/agent/checklist.md") => Self::checked_checklist_content(),
                _ => Self::document_content(),
            };
            fixture
                .write_file(&artifact.path.to_string_lossy(), content)
                .expect("Failed to write required artifact");
        }

        fixture
            .write_file("src/app/page.tsx", "export const greeting = \"it’s fine\";\n")
            .expect("Failed to write page.tsx");

        fixture
    }

    /// Get the path to the fixture directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a text file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_file(&self, relative_path: &str, content: &str) -> std::io::Result<()> {
        self.write_bytes(relative_path, content.as_bytes())
    }

    /// Write raw bytes, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_bytes(&self, relative_path: &str, content: &[u8]) -> std::io::Result<()> {
        let path = self.temp_dir.path().join(relative_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
    }

    /// Remove a file from the fixture directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be removed.
    pub fn remove_file(&self, relative_path: &str) -> std::io::Result<()> {
        std::fs::remove_file(self.temp_dir.path().join(relative_path))
    }

    // =========================================================================
    // Content templates
    // =========================================================================

    /// A document comfortably above the default size threshold.
    #[must_use]
    pub fn document_content() -> &'static str {
        "# Document\n\nThis document describes the agreed behaviour in enough detail.\n"
    }

    /// A ledger whose every record is done.
    #[must_use]
    pub fn done_ledger_content() -> &'static str {
        r#"# Tasks

- [DONE] T0001 Set up repository layout
- [DONE] T0002 Write product description
"#
    }

    /// A checklist whose every item is ticked.
    #[must_use]
    pub fn checked_checklist_content() -> &'static str {
        r#"# Release checklist

- [x] Docs reviewed
- [x] Encoding gate green
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_healthy_repo_has_required_files() {
        let fixture = TestFixture::healthy_repo();
        for artifact in GateConfig::default().inventory.required {
            let path = fixture.path().join(&artifact.path);
            assert!(path.exists(), "missing {}", artifact.path.display());
            assert!(std::fs::metadata(&path).unwrap().len() >= 40);
        }
    }

    #[test]
    fn test_write_bytes_creates_parents() {
        let fixture = TestFixture::empty();
        fixture.write_bytes("a/b/c.md", b"\xff").unwrap();
        assert_eq!(std::fs::read(fixture.path().join("a/b/c.md")).unwrap(), b"\xff");
        fixture.remove_file("a/b/c.md").unwrap();
        assert!(!fixture.path().join("a/b/c.md").exists());
    }
}
