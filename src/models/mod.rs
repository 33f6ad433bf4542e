//! Core data models for prismshell
//!
//! This module contains the core data structures that represent the
//! domain entities in prismshell: shell classification, boundary
//! events, and session lifecycle records.

pub mod boundary_event;
pub mod shell_session;
pub mod shell_type;

// Re-exports for convenience
pub use boundary_event::{BoundaryEvent, BoundaryKind};
pub use shell_session::{SessionExit, SessionState, ShellSession};
pub use shell_type::ShellType;
