//! repogate - repository hygiene gates
//!
//! A set of independent, read-only checks a build pipeline runs before
//! letting a change through. Each gate collects every violation it can find,
//! prints a bounded diagnostic, and exits non-zero on failure.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`config`] - Declarative description of the required repository state
//! - [`error`] - Errors that stop a gate from completing
//! - [`gates`] - The gate contract and the inventory, encoding and ledger gates
//! - [`mode`] - Normal vs. strict (release) mode
//!
//! # Example
//!
//! ```rust,ignore
//! use repogate::gates::{execute, LedgerGate};
//! use repogate::{GateConfig, Mode};
//!
//! let config = GateConfig::load(Path::new("."), None)?;
//! let gate = LedgerGate::from_config(&config.ledger)?;
//! std::process::exit(match gate.run(Path::new("."), Mode::from_env())? {
//!     report if report.passed() => 0,
//!     report => {
//!         eprintln!("{}", report.render_failure());
//!         1
//!     }
//! });
//! ```

pub mod config;
pub mod error;
pub mod gates;
pub mod mode;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use error::{GateError, Result};

pub use config::{
    EncodingConfig, GateConfig, InventoryConfig, LedgerConfig, MojibakeSignature,
    RequiredArtifact, ScanRoot, ValidationReport,
};

pub use gates::{
    execute, EncodingGate, Gate, GateReport, InventoryGate, LedgerGate, Violation, ViolationKind,
};

pub use mode::{Mode, RELEASE_GATE_ENV};
