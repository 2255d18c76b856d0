//! Testing infrastructure for repogate.
//!
//! - **Fixtures**: temporary repository trees laid out like the default
//!   gate configuration expects

pub mod fixtures;

pub use fixtures::*;
