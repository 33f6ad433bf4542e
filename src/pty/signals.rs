//! Session Signal Forwarding
//!
//! Relays lifecycle signals received by the bridge process to the child
//! shell's process group, so an outside `kill` of the bridge tears the
//! whole session down the way a terminal hangup would. Window change is
//! handled separately by the bridge as a resize, never forwarded as a
//! signal; the PTY driver raises SIGWINCH in the child on its own.

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::signal::unix::{signal, Signal as SignalStream, SignalKind};

use crate::error::{Error, Result};

/// Listeners for the signals a bridge session reacts to.
///
/// Installing a listener replaces the default disposition, so receiving
/// SIGINT or SIGTERM no longer kills the bridge outright; the bridge
/// forwards it and lets the child's exit end the session.
pub struct SignalStreams {
    pub sigint: SignalStream,
    pub sigterm: SignalStream,
    pub sighup: SignalStream,
    pub sigtstp: SignalStream,
    pub sigwinch: SignalStream,
}

impl SignalStreams {
    /// Install handlers for the session's signal set.
    pub fn install() -> Result<Self> {
        Ok(Self {
            sigint: stream(SignalKind::interrupt())?,
            sigterm: stream(SignalKind::terminate())?,
            sighup: stream(SignalKind::hangup())?,
            sigtstp: stream(SignalKind::from_raw(nix::libc::SIGTSTP))?,
            sigwinch: stream(SignalKind::window_change())?,
        })
    }
}

fn stream(kind: SignalKind) -> Result<SignalStream> {
    signal(kind).map_err(|e| Error::SignalForwardFailed {
        signal: format!("{:?}", kind),
        reason: format!("failed to install handler: {}", e),
    })
}

/// Forwards received signals to the child's process group.
#[derive(Debug, Clone, Copy)]
pub struct SignalForwarder {
    pgid: Pid,
}

impl SignalForwarder {
    /// Target the process group led by `child_pid`.
    ///
    /// The child is made a session leader when it is spawned inside the
    /// PTY, so its pid doubles as the process group id.
    pub fn for_child(child_pid: u32) -> Self {
        Self {
            pgid: Pid::from_raw(child_pid as i32),
        }
    }

    /// Send `sig` to every process in the child's group.
    pub fn forward(&self, sig: Signal) -> Result<()> {
        debug!("Forwarding {} to process group {}", sig, self.pgid);
        kill(Pid::from_raw(-self.pgid.as_raw()), sig).map_err(|e| Error::SignalForwardFailed {
            signal: sig.to_string(),
            reason: e.to_string(),
        })
    }
}
