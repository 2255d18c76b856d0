//! Gate strictness.
//!
//! The mode is resolved once per process (see [`Mode::from_env`]) and then
//! threaded into every [`Gate::run`](crate::gates::Gate::run) call.

use serde::{Deserialize, Serialize};

/// Environment variable that switches gates into release (strict) mode.
pub const RELEASE_GATE_ENV: &str = "RELEASE_GATE";

/// Strictness a gate run operates under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Ordinary pass mode.
    #[default]
    Normal,
    /// Release mode: adds completion checks on top of normal mode.
    Strict,
}

impl Mode {
    /// Resolve the mode from the raw value of the release toggle.
    ///
    /// Only the literal `"1"` selects strict mode.
    #[must_use]
    pub fn from_toggle(value: Option<&str>) -> Self {
        match value {
            Some("1") => Self::Strict,
            _ => Self::Normal,
        }
    }

    /// Resolve the mode from [`RELEASE_GATE_ENV`].
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_toggle(std::env::var(RELEASE_GATE_ENV).ok().as_deref())
    }

    /// Check if this is strict mode.
    #[must_use]
    pub fn is_strict(self) -> bool {
        self == Self::Strict
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Strict => write!(f, "strict"),
        }
    }
}
