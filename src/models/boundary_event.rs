//! Boundary Event Model
//!
//! Events produced by the marker scanner at command and prompt
//! boundaries. Events for one session are strictly ordered by sequence
//! number and alternate so that a command is never reentered: a
//! CommandStart is always closed by a CommandEnd before the next
//! CommandStart appears.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of boundary a marker signalled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryKind {
    /// The shell is about to execute a command
    CommandStart,
    /// A command finished; carries its exit status when the hook supplied one
    CommandEnd { exit_code: Option<i32> },
    /// The shell is about to render its prompt
    PromptStart,
    /// The prompt has been rendered and the shell is waiting for input
    PromptEnd,
}

impl BoundaryKind {
    /// Stable name used in logs and serialized event lines
    pub fn name(&self) -> &'static str {
        match self {
            BoundaryKind::CommandStart => "command_start",
            BoundaryKind::CommandEnd { .. } => "command_end",
            BoundaryKind::PromptStart => "prompt_start",
            BoundaryKind::PromptEnd => "prompt_end",
        }
    }

    /// Exit status carried by a CommandEnd, if any
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            BoundaryKind::CommandEnd { exit_code } => *exit_code,
            _ => None,
        }
    }
}

/// One boundary observed in a session's output stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryEvent {
    /// What kind of boundary this is
    pub kind: BoundaryKind,

    /// Position in the session's event stream, starting at 0
    pub seq: u64,

    /// When the scanner recognized the marker
    pub timestamp: DateTime<Utc>,
}

impl BoundaryEvent {
    /// Create an event stamped with the current time
    pub fn new(kind: BoundaryKind, seq: u64) -> Self {
        Self {
            kind,
            seq,
            timestamp: Utc::now(),
        }
    }
}
