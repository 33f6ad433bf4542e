//! Terminal State Probes
//!
//! Point-in-time queries against terminal file descriptors: the echo flag
//! of a PTY's line discipline, and the window size of the controlling
//! terminal. Both are polled by the bridge rather than watched, so each
//! call reflects the state at the moment it runs.

use std::os::fd::{BorrowedFd, RawFd};

use nix::sys::termios::{tcgetattr, LocalFlags};
use portable_pty::PtySize;

use crate::error::{Error, Result};

nix::ioctl_read_bad!(tiocgwinsz, nix::libc::TIOCGWINSZ, nix::libc::winsize);

/// Columns used when the window size cannot be determined.
pub const FALLBACK_COLS: u16 = 80;
/// Rows used when the window size cannot be determined.
pub const FALLBACK_ROWS: u16 = 24;

/// Read the ECHO flag of the line discipline behind `fd`.
///
/// For a PTY master this reflects the slave side's termios, so it answers
/// "is the program in the PTY currently echoing input" without touching
/// the child process. Returns [`Error::SafetyDetectionUnavailable`] when
/// `fd` does not support termios queries.
pub fn query_echo(fd: RawFd) -> Result<bool> {
    // SAFETY: callers keep the descriptor open for the duration of the call.
    let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };
    let termios = tcgetattr(borrowed).map_err(|e| Error::SafetyDetectionUnavailable {
        reason: format!("tcgetattr on fd {}: {}", fd, e),
    })?;
    Ok(termios.local_flags.contains(LocalFlags::ECHO))
}

/// Ask the terminal behind `fd` for its current dimensions.
///
/// Falls back to 80x24 when `fd` is not a terminal or reports a zero
/// size, so the bridge still runs under pipes and CI harnesses.
pub fn query_winsize(fd: RawFd) -> PtySize {
    let mut ws = nix::libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    // SAFETY: ws is a valid out-parameter for TIOCGWINSZ on this fd.
    match unsafe { tiocgwinsz(fd, &mut ws) } {
        Ok(_) if ws.ws_row > 0 && ws.ws_col > 0 => PtySize {
            rows: ws.ws_row,
            cols: ws.ws_col,
            pixel_width: ws.ws_xpixel,
            pixel_height: ws.ws_ypixel,
        },
        Ok(_) => {
            debug!("Window size query on fd {} returned zero; using fallback", fd);
            fallback_size()
        }
        Err(e) => {
            debug!("Window size query on fd {} failed ({}); using fallback", fd, e);
            fallback_size()
        }
    }
}

fn fallback_size() -> PtySize {
    PtySize {
        rows: FALLBACK_ROWS,
        cols: FALLBACK_COLS,
        pixel_width: 0,
        pixel_height: 0,
    }
}
