//! Terminal-Side Plumbing
//!
//! Everything that touches terminal state directly: the OSC 133 marker
//! scanner that splits child output into passthrough bytes and boundary
//! events, termios probes for echo detection and window size, and the
//! raw mode guard for the user's terminal.

pub mod markers;
pub mod probe;
pub mod raw_mode;

pub use markers::{MarkerParser, ScanStats};
pub use probe::{query_echo, query_winsize};
pub use raw_mode::RawModeGuard;
