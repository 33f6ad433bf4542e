//! Prismshell - a transparent PTY bridge with command boundary events
//!
//! This library provides the core functionality for prismshell, a
//! wrapper that runs the user's own shell on a pseudoterminal and
//! watches the byte stream for command boundaries without changing
//! what the terminal shows.
//!
//! ## Features
//!
//! - **Transparent Bridging:** Input and output pass through unmodified
//! - **Boundary Markers:** Shell hooks emit OSC 133 sequences at prompt,
//!   command start, and command end
//! - **Marker Stripping:** Sequences are removed from output before it
//!   reaches the terminal, even when split across reads
//! - **Event Dispatch:** Registered consumers receive each boundary as a
//!   typed event
//! - **Safety Suppression:** Events are withheld while terminal echo is
//!   off, so hidden input never leaks through consumers
//! - **Configuration:** TOML-based configuration files
//!
//! ## Module Organization
//!
//! ### Core Functionality
//!
//! - [`pty`] - Session spawning, the bridge loop, signal forwarding
//! - [`terminal`] - Marker scanning, termios probes, raw mode
//! - [`shell`] - Shell resolution and hook script generation
//! - [`events`] - Boundary event consumers and dispatch
//! - [`safety`] - Echo-state gate behind event suppression
//! - [`models`] - Data structures (BoundaryEvent, ShellSession, ShellType)
//! - [`config`] - Configuration loading and defaults
//! - [`mod@error`] - Error types and Result aliases
//!
//! ## Quick Start
//!
//! ```no_run
//! use prismshell::{BridgeIo, HookScript, PtyBridge};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Wrap the user's shell on the current terminal
//!     let shell = prismshell::shell::resolve(None)?;
//!     let hooks = HookScript::for_shell(shell.shell_type);
//!     let bridge = PtyBridge::new(shell, hooks, BridgeIo::stdio());
//!
//!     let summary = bridge.run().await?;
//!     std::process::exit(summary.exit.code());
//! }
//! ```
//!
//! ## Architecture
//!
//! Prismshell uses a hybrid threading model:
//!
//! - **Input Thread:** Reads host stdin and hands bytes to the writer
//! - **PTY Writer Thread:** Writes input to the PTY (blocking I/O)
//! - **PTY Reader Thread:** Reads output from the PTY (blocking I/O)
//! - **Bridge Task:** Async loop that scans output for markers, gates
//!   and dispatches events, forwards signals, and tracks child exit
//! - **Host Output Thread:** Writes cleaned bytes to the host terminal
//!
//! Output crosses from the reader thread into the bridge task over a
//! `tokio::mpsc` channel; the input path never touches the async loop.
//!
//! ## Platform Support
//!
//! - Linux and macOS. The bridge leans on Unix PTY and termios
//!   semantics throughout; there is no Windows port.
//!
//! ## Safety and Reliability
//!
//! - **No Panics:** All fallible operations return `Result`
//! - **Graceful Degradation:** Falls back to defaults when config
//!   loading fails, and to a plain passthrough when a shell has no hook
//!   recipe
//! - **Fail-Closed Suppression:** When the echo state cannot be read,
//!   events are withheld rather than guessed at

#[macro_use]
extern crate tracing;

pub mod config;
pub mod error;
pub mod events;
pub mod models;

// Core modules
pub mod pty;
pub mod safety;
pub mod shell;
pub mod terminal;

// Re-exports for core functionality
pub use error::{Error, Result};
pub use pty::{BridgeIo, PtyBridge, SessionSummary};

// Convenience re-exports for common types
pub use config::Config;
pub use events::{EventConsumer, EventDispatcher, EventLogger};
pub use models::{BoundaryEvent, BoundaryKind, SessionExit, ShellSession, ShellType};
pub use safety::SafetyGate;
pub use shell::{HookScript, ResolvedShell};
pub use terminal::MarkerParser;

// Version information
/// The current version of prismshell from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The application name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// The application description from Cargo.toml
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
