//! Shell Session Model
//!
//! Metadata record for one wrapped shell: what was spawned, its
//! lifecycle, and how it ended. The OS handles (PTY pair, child) are
//! owned by the bridge; this record tracks everything about them worth
//! reporting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use super::shell_type::ShellType;

/// Lifecycle state of a wrapped shell session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SessionState {
    /// Session has been created but the shell is not yet spawned
    #[default]
    Created,
    /// The shell is running on its PTY
    Running,
    /// The shell has exited
    Terminated,
}

/// How the child shell ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionExit {
    /// Normal exit with the shell's own status code
    Exited(i32),
    /// Killed by a signal, identified by the name the OS reported
    Signaled(String),
}

impl SessionExit {
    /// Collapse to a process exit code: the child's code verbatim, or
    /// `128 + signum` for signal deaths. A shell killed by SIGINT
    /// yields 130, matching what a bare shell's parent would see.
    pub fn code(&self) -> i32 {
        match self {
            SessionExit::Exited(code) => *code,
            SessionExit::Signaled(name) => 128 + signal_number(name),
        }
    }

    /// True only for a clean zero exit
    pub fn is_success(&self) -> bool {
        matches!(self, SessionExit::Exited(0))
    }
}

impl std::fmt::Display for SessionExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionExit::Exited(code) => write!(f, "exited with status {}", code),
            SessionExit::Signaled(name) => write!(f, "killed by {}", name),
        }
    }
}

/// Map a reported signal name to its number.
///
/// The PTY layer reports signal deaths as strings, which arrive in one
/// of three shapes depending on the platform's C library: a decimal
/// number, a "SIGTERM"-style name, or a strsignal() description like
/// "Terminated". Unknown shapes map to 0, which still lands the exit
/// code in the signal-death range.
fn signal_number(name: &str) -> i32 {
    let trimmed = name.trim();
    if let Ok(n) = trimmed.parse::<i32>() {
        return n;
    }
    let prefixed;
    let candidate = if trimmed.starts_with("SIG") {
        trimmed
    } else {
        prefixed = format!("SIG{}", trimmed);
        prefixed.as_str()
    };
    if let Ok(sig) = candidate.parse::<nix::sys::signal::Signal>() {
        return sig as i32;
    }
    match trimmed {
        "Hangup" => 1,
        "Interrupt" => 2,
        "Quit" => 3,
        "Illegal instruction" => 4,
        "Aborted" | "Abort trap" => 6,
        "Killed" => 9,
        "Segmentation fault" => 11,
        "Broken pipe" => 13,
        "Alarm clock" => 14,
        "Terminated" => 15,
        _ => 0,
    }
}

/// Metadata for one wrapped shell session
#[derive(Debug, Clone)]
pub struct ShellSession {
    /// Unique session identifier
    pub id: Uuid,

    /// Path of the spawned shell executable
    pub shell_path: PathBuf,

    /// Classified shell type
    pub shell_type: ShellType,

    /// Child process identifier, once spawned
    pub pid: Option<u32>,

    /// Current lifecycle state
    pub state: SessionState,

    /// Current terminal window size (rows, cols)
    pub rows: u16,
    pub cols: u16,

    /// When the shell was spawned
    pub started_at: Option<DateTime<Utc>>,

    /// When the shell exited
    pub ended_at: Option<DateTime<Utc>>,

    /// How the shell ended, once terminated
    pub exit: Option<SessionExit>,
}

impl ShellSession {
    /// Create a session record in the Created state
    pub fn new(shell_path: PathBuf, shell_type: ShellType) -> Self {
        Self {
            id: Uuid::new_v4(),
            shell_path,
            shell_type,
            pid: None,
            state: SessionState::Created,
            rows: 24,
            cols: 80,
            started_at: None,
            ended_at: None,
            exit: None,
        }
    }

    /// Mark the shell as spawned with the given PID
    pub fn mark_started(&mut self, pid: u32) {
        self.pid = Some(pid);
        self.state = SessionState::Running;
        self.started_at = Some(Utc::now());
    }

    /// Record a window size change
    pub fn mark_resized(&mut self, rows: u16, cols: u16) {
        self.rows = rows;
        self.cols = cols;
    }

    /// Mark the shell as terminated with its exit outcome
    pub fn mark_terminated(&mut self, exit: SessionExit) {
        self.state = SessionState::Terminated;
        self.ended_at = Some(Utc::now());
        self.exit = Some(exit);
    }

    /// Check if the shell is currently running
    pub fn is_running(&self) -> bool {
        matches!(self.state, SessionState::Running)
    }

    /// Check if the shell has terminated
    pub fn is_terminated(&self) -> bool {
        matches!(self.state, SessionState::Terminated)
    }

    /// Session duration, once terminated
    pub fn duration(&self) -> Option<std::time::Duration> {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => {
                Some(end.signed_duration_since(start).to_std().unwrap_or_default())
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for ShellSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pid = self.pid.map_or("-".to_string(), |p| p.to_string());
        write!(
            f,
            "{} [{}] {}x{} {:?}",
            self.shell_path.display(),
            pid,
            self.cols,
            self.rows,
            self.state
        )
    }
}
