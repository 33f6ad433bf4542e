//! Raw Mode Guard
//!
//! Switches the user's terminal into raw mode for the lifetime of a
//! bridge session and restores the saved settings on drop. With stdin in
//! raw mode every keystroke, including control characters, flows through
//! to the PTY where the child shell's own line discipline handles it.

use std::os::fd::{BorrowedFd, RawFd};

use nix::errno::Errno;
use nix::sys::termios::{cfmakeraw, tcgetattr, tcsetattr, SetArg, Termios};

use crate::error::{Error, Result};

/// RAII handle over a terminal mode switch.
///
/// When the descriptor is not a terminal the guard is inert: nothing is
/// changed and drop does nothing. This keeps the bridge usable under
/// pipes and test harnesses.
pub struct RawModeGuard {
    fd: RawFd,
    saved: Option<Termios>,
}

impl RawModeGuard {
    /// Put `fd` into raw mode, remembering the prior settings.
    pub fn enable(fd: RawFd) -> Result<Self> {
        // SAFETY: callers keep the descriptor open for the guard's lifetime.
        let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };
        let saved = match tcgetattr(borrowed) {
            Ok(termios) => termios,
            Err(Errno::ENOTTY) => {
                debug!("fd {} is not a terminal; raw mode skipped", fd);
                return Ok(Self { fd, saved: None });
            }
            Err(e) => {
                return Err(Error::TerminalSetupFailed {
                    reason: format!("tcgetattr on fd {}: {}", fd, e),
                })
            }
        };

        let mut raw = saved.clone();
        cfmakeraw(&mut raw);
        tcsetattr(borrowed, SetArg::TCSANOW, &raw).map_err(|e| Error::TerminalSetupFailed {
            reason: format!("tcsetattr on fd {}: {}", fd, e),
        })?;

        debug!("Raw mode enabled on fd {}", fd);
        Ok(Self {
            fd,
            saved: Some(saved),
        })
    }

    /// Whether the guard actually changed the terminal.
    pub fn is_active(&self) -> bool {
        self.saved.is_some()
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Some(saved) = &self.saved {
            // SAFETY: the fd outlives the guard per the enable() contract.
            let borrowed = unsafe { BorrowedFd::borrow_raw(self.fd) };
            // TCSADRAIN lets pending output finish before the switch back.
            match tcsetattr(borrowed, SetArg::TCSADRAIN, saved) {
                Ok(()) => debug!("Terminal settings restored on fd {}", self.fd),
                Err(e) => warn!("Failed to restore terminal settings: {}", e),
            }
        }
    }
}

impl std::fmt::Debug for RawModeGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawModeGuard")
            .field("fd", &self.fd)
            .field("active", &self.is_active())
            .finish()
    }
}
