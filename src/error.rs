//! Error types for prismshell
//!
//! Fatal errors abort session startup before any child process exists;
//! steady-state anomalies (marker scanning, safety detection, consumer
//! failures) are absorbed where they arise and never interrupt the
//! interactive session.

use std::fmt;
use std::path::PathBuf;

/// Result type used throughout prismshell
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for prismshell operations
#[derive(Debug)]
pub enum Error {
    // === Shell resolution errors ===
    /// No shell candidate resolved to a valid executable
    ShellNotFound { candidates: Vec<PathBuf> },

    // === PTY lifecycle errors ===
    /// The OS denied allocation of a PTY master/slave pair
    PtyAllocationFailed { reason: String },

    /// Spawning the shell onto the PTY slave failed
    ChildSpawnFailed { shell: PathBuf, reason: String },

    /// Plumbing the PTY reader/writer endpoints failed
    TerminalSetupFailed { reason: String },

    /// Forwarding a signal to the child process group failed
    SignalForwardFailed { signal: String, reason: String },

    // === Steady-state anomalies (absorbed, never fatal) ===
    /// Shell type has no hook recipe; session degrades to passthrough
    HookInjectionUnsupported { shell: String },

    /// A byte run resembled a marker but did not scan as one
    MarkerScanAnomaly { detail: String },

    /// Terminal echo state could not be queried
    SafetyDetectionUnavailable { reason: String },

    /// A registered event consumer failed or panicked
    ConsumerCallbackFailure { consumer: String, reason: String },

    // === Configuration errors ===
    /// Failed to load configuration
    ConfigLoadFailed { path: PathBuf, reason: String },

    /// Failed to save configuration
    ConfigSaveFailed { path: PathBuf, reason: String },

    // === Wrapped errors ===
    /// IO error
    Io(std::io::Error),

    /// JSON serialization error
    Serde(serde_json::Error),

    /// TOML parsing error
    Toml(toml::de::Error),

    /// Generic error with message
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Shell resolution errors
            Error::ShellNotFound { candidates } => {
                write!(
                    f,
                    "no usable shell found (tried: {})",
                    candidates
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }

            // PTY lifecycle errors
            Error::PtyAllocationFailed { reason } => {
                write!(f, "failed to allocate PTY: {}", reason)
            }
            Error::ChildSpawnFailed { shell, reason } => {
                write!(f, "failed to spawn shell '{}': {}", shell.display(), reason)
            }
            Error::TerminalSetupFailed { reason } => {
                write!(f, "failed to set up terminal streams: {}", reason)
            }
            Error::SignalForwardFailed { signal, reason } => {
                write!(f, "failed to forward {} to child: {}", signal, reason)
            }

            // Steady-state anomalies
            Error::HookInjectionUnsupported { shell } => {
                write!(f, "shell '{}' has no hook support, running passthrough", shell)
            }
            Error::MarkerScanAnomaly { detail } => {
                write!(f, "marker scan anomaly: {}", detail)
            }
            Error::SafetyDetectionUnavailable { reason } => {
                write!(f, "terminal echo state unavailable: {}", reason)
            }
            Error::ConsumerCallbackFailure { consumer, reason } => {
                write!(f, "event consumer '{}' failed: {}", consumer, reason)
            }

            // Configuration errors
            Error::ConfigLoadFailed { path, reason } => {
                write!(f, "failed to load config from '{}': {}", path.display(), reason)
            }
            Error::ConfigSaveFailed { path, reason } => {
                write!(f, "failed to save config to '{}': {}", path.display(), reason)
            }

            // Wrapped errors
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Serde(e) => write!(f, "serialization error: {}", e),
            Error::Toml(e) => write!(f, "TOML error: {}", e),
            Error::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serde(e)
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Toml(e)
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Other(e.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}
