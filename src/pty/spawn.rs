//! Shell Session Spawning
//!
//! Opens the PTY pair, builds the child command with its shell-specific
//! hook delivery, and bridges the master's blocking reader and writer to
//! channels the async bridge loop can drive.

use std::io::{Read, Write};
use std::sync::mpsc;
use std::thread;

use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use tempfile::TempDir;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

use crate::error::{Error, Result};
use crate::models::{ShellSession, ShellType};
use crate::shell::{zdotdir_zshenv, HookScript, InjectionMethod, ResolvedShell};

/// A live shell session plus the endpoints the bridge drives.
pub struct SpawnedSession {
    /// Session bookkeeping: pid, dimensions, lifecycle timestamps.
    pub session: ShellSession,
    /// PTY master handle, kept for resize and termios queries.
    pub master: Box<dyn MasterPty + Send>,
    /// Child handle for exit polling and the final wait.
    pub child: Box<dyn Child + Send + Sync>,
    /// Chunks read from the PTY master by the reader thread.
    pub output_rx: UnboundedReceiver<Vec<u8>>,
    /// Bytes for the writer thread to push into the PTY master.
    pub input_tx: mpsc::Sender<Vec<u8>>,
    /// Keeps the transient zsh startup directory alive for the session.
    _zdotdir: Option<TempDir>,
}

impl std::fmt::Debug for SpawnedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpawnedSession")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// Spawn the resolved shell inside a fresh PTY sized to `size`.
///
/// The slave side is dropped after the fork so the parent holds only the
/// master; an open slave here would mask the child's EOF.
pub fn spawn_session(
    shell: &ResolvedShell,
    hooks: &HookScript,
    size: PtySize,
) -> Result<SpawnedSession> {
    let pty_system = native_pty_system();
    let pair = pty_system
        .openpty(size)
        .map_err(|e| Error::PtyAllocationFailed {
            reason: e.to_string(),
        })?;

    let (cmd, zdotdir) = build_command(shell, hooks)?;
    debug!(
        "Spawning {} ({}) at {}x{}",
        shell.path.display(),
        shell.shell_type,
        size.cols,
        size.rows
    );

    let child = pair
        .slave
        .spawn_command(cmd)
        .map_err(|e| Error::ChildSpawnFailed {
            shell: shell.path.clone(),
            reason: e.to_string(),
        })?;
    drop(pair.slave);

    let pid = child.process_id().unwrap_or(0);
    let mut session = ShellSession::new(shell.path.clone(), shell.shell_type);
    session.mark_started(pid);
    session.mark_resized(size.rows, size.cols);

    let output_rx = spawn_reader_thread(pair.master.as_ref())?;
    let input_tx = spawn_writer_thread(pair.master.as_ref())?;

    Ok(SpawnedSession {
        session,
        master: pair.master,
        child,
        output_rx,
        input_tx,
        _zdotdir: zdotdir,
    })
}

/// Build the child command line and environment for the shell's hook
/// delivery method. Zsh delivery materializes a transient `ZDOTDIR`; the
/// returned guard keeps that directory on disk for the session.
fn build_command(
    shell: &ResolvedShell,
    hooks: &HookScript,
) -> Result<(CommandBuilder, Option<TempDir>)> {
    let mut cmd = CommandBuilder::new(&shell.path);

    match hooks.method {
        InjectionMethod::None => {}
        InjectionMethod::EnvironmentVariable => {
            // bash: evaluate the bootstrap line, then replace the wrapper
            // with the interactive shell. `$0` carries the shell path so
            // the re-exec survives spaces in it.
            cmd.arg("-c");
            cmd.arg(format!("{}; exec \"$0\"", hooks.script));
            cmd.arg(&shell.path);
        }
        InjectionMethod::FunctionDefinition => match shell.shell_type {
            ShellType::Fish => {
                cmd.arg("-C");
                cmd.arg(&hooks.script);
            }
            ShellType::Zsh => {
                let dir = materialize_zdotdir(hooks)?;
                if let Some(user_zdotdir) = std::env::var_os("ZDOTDIR") {
                    cmd.env("_PRISMSHELL_USER_ZDOTDIR", user_zdotdir);
                }
                cmd.env("ZDOTDIR", dir.path());
                return Ok((cmd, Some(dir)));
            }
            other => {
                return Err(Error::HookInjectionUnsupported {
                    shell: other.to_string(),
                })
            }
        },
    }

    Ok((cmd, None))
}

/// Write the transient `.zshenv` and `.zshrc` that chain to the user's
/// own rc files and register the hooks after them.
fn materialize_zdotdir(hooks: &HookScript) -> Result<TempDir> {
    let dir = tempfile::Builder::new()
        .prefix("prismshell-zsh-")
        .tempdir()?;

    std::fs::write(dir.path().join(".zshenv"), zdotdir_zshenv())?;
    let zshrc = hooks
        .zdotdir_zshrc()
        .ok_or_else(|| Error::Other("zsh hook script missing".to_string()))?;
    std::fs::write(dir.path().join(".zshrc"), zshrc)?;

    debug!("Materialized zsh startup files in {}", dir.path().display());
    Ok(dir)
}

/// Reader thread: blocking reads on the PTY master, forwarded as owned
/// chunks to the async side. The channel closing is how the bridge learns
/// the child hung up.
fn spawn_reader_thread(master: &(dyn MasterPty + Send)) -> Result<UnboundedReceiver<Vec<u8>>> {
    let mut reader = master
        .try_clone_reader()
        .map_err(|e| Error::PtyAllocationFailed {
            reason: format!("clone reader: {}", e),
        })?;

    let (tx, rx) = unbounded_channel::<Vec<u8>>();
    thread::spawn(move || {
        let mut buf = [0u8; 4096];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => {
                    debug!("PTY read EOF - child closed its terminal");
                    break;
                }
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).is_err() {
                        debug!("PTY output receiver dropped, stopping reader thread");
                        break;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(std::time::Duration::from_millis(10));
                }
                Err(e) => {
                    // Linux reports the slave side closing as EIO.
                    debug!("PTY read ended: {}", e);
                    break;
                }
            }
        }
        debug!("PTY reader thread exiting");
    });

    Ok(rx)
}

/// Writer thread: drains the input channel into the PTY master with
/// blocking writes.
fn spawn_writer_thread(master: &(dyn MasterPty + Send)) -> Result<mpsc::Sender<Vec<u8>>> {
    let mut writer = master
        .take_writer()
        .map_err(|e| Error::PtyAllocationFailed {
            reason: format!("take writer: {}", e),
        })?;

    let (tx, rx) = mpsc::channel::<Vec<u8>>();
    thread::spawn(move || {
        while let Ok(data) = rx.recv() {
            if let Err(e) = writer.write_all(&data) {
                warn!("PTY write failed: {}", e);
                break;
            }
            if let Err(e) = writer.flush() {
                debug!("PTY flush error: {}", e);
            }
        }
        debug!("PTY writer thread exiting");
    });

    Ok(tx)
}
