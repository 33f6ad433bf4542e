//! Configuration
//!
//! User-facing knobs for a bridge session. Kept deliberately small: the
//! shell override and banner, the effects master switch, and the safety
//! gate opt-out. Loading is resilient; see [`loader`].

pub mod loader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use loader::{config_file_path, load};

/// Top-level configuration, one section per concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub shell: ShellConfig,
    pub effects: EffectsConfig,
    pub safety: SafetyConfig,
}

/// Which shell runs and how the session introduces itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Absolute path of the shell to launch, overriding detection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_path: Option<PathBuf>,

    /// Print the one-line banner before the session starts.
    pub startup_banner: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            override_path: None,
            startup_banner: true,
        }
    }
}

/// Master switch for boundary event consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    /// When false no consumers are registered; the session is a plain
    /// passthrough with markers still stripped.
    pub enabled: bool,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Safety gate tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SafetyConfig {
    /// Disable the echo probe entirely; boundary events are then never
    /// suppressed, including during password entry.
    pub no_echo_detection: bool,
}
