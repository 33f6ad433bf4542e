//! Shell Resolution and Hook Generation
//!
//! Everything that happens before a PTY exists: picking the shell to
//! wrap and building the startup script that makes it emit boundary
//! markers.

pub mod hooks;
pub mod resolver;

// Re-exports for convenience
pub use hooks::{zdotdir_zshenv, HookScript, InjectionMethod};
pub use resolver::{resolve, validate_shell, ResolvedShell};
