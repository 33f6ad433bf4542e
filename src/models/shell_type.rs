//! Shell type definitions
//!
//! Canonical classification of the shells the bridge knows how to hook.
//! Anything else is `Unknown` and runs as a markerless passthrough.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Kind of shell resolved for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ShellType {
    /// Bourne Again Shell
    Bash,
    /// Z Shell
    Zsh,
    /// Fish Shell
    Fish,
    /// Unrecognized shell; no hooks are injected
    #[default]
    Unknown,
}

impl ShellType {
    /// Get a string representation of the shell type
    pub fn as_str(&self) -> &'static str {
        match self {
            ShellType::Bash => "bash",
            ShellType::Zsh => "zsh",
            ShellType::Fish => "fish",
            ShellType::Unknown => "unknown",
        }
    }

    /// Classify a shell executable by the final component of its path.
    ///
    /// Matching is case-sensitive: `bash` classifies, `Bash` does not.
    /// Shell binaries are lowercase on every platform this runs on, and a
    /// loose match would misclassify lookalike wrappers.
    pub fn from_path(path: &Path) -> Self {
        match path.file_name().and_then(|n| n.to_str()) {
            Some("bash") => ShellType::Bash,
            Some("zsh") => ShellType::Zsh,
            Some("fish") => ShellType::Fish,
            _ => ShellType::Unknown,
        }
    }

    /// Whether a boundary-marker hook recipe exists for this shell
    pub fn supports_hooks(&self) -> bool {
        matches!(self, ShellType::Bash | ShellType::Zsh | ShellType::Fish)
    }
}

impl fmt::Display for ShellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
