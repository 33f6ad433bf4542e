//! PTY Session Management
//!
//! Spawning the shell on a pseudoterminal, the bridge loop that owns a
//! session from first byte to exit status, and signal relay to the
//! child's process group.

pub mod bridge;
pub mod signals;
pub mod spawn;

pub use bridge::{BridgeIo, PtyBridge, SessionSummary};
pub use signals::{SignalForwarder, SignalStreams};
pub use spawn::{spawn_session, SpawnedSession};
