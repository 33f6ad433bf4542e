//! PTY Bridge
//!
//! The session orchestrator: spawns the shell on a PTY, switches the
//! user's terminal to raw mode, and runs both forwarding directions
//! until the child exits. Host input bytes flow to the PTY untouched on
//! dedicated threads; PTY output passes through the marker scanner so
//! boundary events can be dispatched while clean bytes go to the host
//! terminal. Resize and lifecycle signals are handled on the async loop
//! between output chunks.

use std::io::{Read, Write};
use std::os::fd::RawFd;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use nix::sys::signal::Signal;
use portable_pty::{ExitStatus, MasterPty};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::error::{Error, Result};
use crate::events::{DispatchStats, EventConsumer, EventDispatcher};
use crate::models::{BoundaryEvent, SessionExit, ShellSession};
use crate::safety::SafetyGate;
use crate::shell::{HookScript, ResolvedShell};
use crate::terminal::markers::ScanStats;
use crate::terminal::{query_echo, query_winsize, MarkerParser, RawModeGuard};

use super::signals::{SignalForwarder, SignalStreams};
use super::spawn::spawn_session;

/// How often the child is polled for exit while output flows.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long to wait for straggler output after the child has exited.
/// Covers the window where a backgrounded descendant still holds the
/// slave side open.
const DRAIN_TIMEOUT: Duration = Duration::from_millis(200);

/// The bridge's endpoints toward the user.
///
/// Production sessions use process stdio with raw mode; tests substitute
/// in-memory readers and writers and skip the mode switch.
pub struct BridgeIo {
    pub input: Box<dyn Read + Send>,
    pub output: Box<dyn Write + Send>,
    pub raw_mode: bool,
}

impl BridgeIo {
    /// Process stdin/stdout with the terminal switched to raw mode.
    pub fn stdio() -> Self {
        Self {
            input: Box::new(std::io::stdin()),
            output: Box::new(std::io::stdout()),
            raw_mode: true,
        }
    }

    /// Arbitrary endpoints, no terminal mode change.
    pub fn piped(input: Box<dyn Read + Send>, output: Box<dyn Write + Send>) -> Self {
        Self {
            input,
            output,
            raw_mode: false,
        }
    }
}

/// Everything a finished session reports back.
#[derive(Debug)]
pub struct SessionSummary {
    /// Final session record, including pid and timestamps.
    pub session: ShellSession,
    /// How the child ended.
    pub exit: SessionExit,
    /// Marker scanner counters.
    pub scan: ScanStats,
    /// Event dispatch counters.
    pub dispatch: DispatchStats,
}

/// One wrapped shell session, configured and ready to run.
pub struct PtyBridge {
    shell: ResolvedShell,
    hooks: HookScript,
    io: BridgeIo,
    echo_detection: bool,
    dispatcher: EventDispatcher,
}

impl PtyBridge {
    pub fn new(shell: ResolvedShell, hooks: HookScript, io: BridgeIo) -> Self {
        Self {
            shell,
            hooks,
            io,
            echo_detection: true,
            dispatcher: EventDispatcher::new(),
        }
    }

    /// Enable or disable the echo probe behind event suppression.
    pub fn set_echo_detection(&mut self, enabled: bool) {
        self.echo_detection = enabled;
    }

    /// Attach a boundary event consumer. Order of registration is order
    /// of delivery.
    pub fn register_consumer(&mut self, consumer: Box<dyn EventConsumer>) {
        self.dispatcher.register(consumer);
    }

    /// Run the session to completion and report how it ended.
    ///
    /// Blocks (asynchronously) until the child exits or the PTY master
    /// reaches end-of-stream. Host-input EOF does not end the session;
    /// an interactive shell outlives a closed input pipe until told to
    /// exit.
    pub async fn run(self) -> Result<SessionSummary> {
        let BridgeIo {
            input,
            output,
            raw_mode,
        } = self.io;

        let host_size = query_winsize(nix::libc::STDIN_FILENO);
        let mut spawned = spawn_session(&self.shell, &self.hooks, host_size)?;
        info!(
            "Session {} started: {} (pid {})",
            spawned.session.id,
            self.shell.path.display(),
            spawned.session.pid.unwrap_or(0)
        );

        // Raw mode comes after the spawn so a spawn failure still prints
        // on a sane terminal. The guard restores settings when run exits.
        let _raw_guard = if raw_mode {
            Some(RawModeGuard::enable(nix::libc::STDIN_FILENO)?)
        } else {
            None
        };

        spawn_input_thread(input, spawned.input_tx.clone());
        let (host_tx, output_thread) = spawn_output_thread(output);

        let probe = if self.echo_detection {
            match spawned.master.as_raw_fd() {
                Some(fd) => EchoProbe::Fd(fd),
                None => {
                    warn!(
                        "{}",
                        Error::SafetyDetectionUnavailable {
                            reason: "PTY master exposes no file descriptor".to_string(),
                        }
                    );
                    EchoProbe::Unavailable
                }
            }
        } else {
            debug!("Echo detection disabled by configuration");
            EchoProbe::Disabled
        };

        let mut pipeline = OutputPipeline {
            parser: MarkerParser::new(),
            gate: SafetyGate::new(),
            dispatcher: self.dispatcher,
            host_tx,
            probe,
        };

        let mut signals = SignalStreams::install()?;
        let forwarder = spawned.child.process_id().map(SignalForwarder::for_child);
        let mut poll = tokio::time::interval(EXIT_POLL_INTERVAL);

        let mut exit: Option<SessionExit> = None;
        let mut output_open = true;

        loop {
            tokio::select! {
                chunk = spawned.output_rx.recv() => match chunk {
                    Some(bytes) => pipeline.process(&bytes),
                    None => {
                        debug!("PTY output stream closed");
                        output_open = false;
                        break;
                    }
                },
                _ = signals.sigwinch.recv() => {
                    resize_to_host(spawned.master.as_ref(), &mut spawned.session);
                }
                _ = signals.sigint.recv() => forward_signal(&forwarder, Signal::SIGINT),
                _ = signals.sigterm.recv() => forward_signal(&forwarder, Signal::SIGTERM),
                _ = signals.sighup.recv() => forward_signal(&forwarder, Signal::SIGHUP),
                _ = signals.sigtstp.recv() => forward_signal(&forwarder, Signal::SIGTSTP),
                _ = poll.tick() => {
                    match spawned.child.try_wait() {
                        Ok(Some(status)) => {
                            debug!("Child exited, draining remaining output");
                            exit = Some(session_exit(&status));
                            break;
                        }
                        Ok(None) => {}
                        Err(e) => warn!("Exit poll failed: {}", e),
                    }
                }
            }
        }

        if output_open && exit.is_some() {
            drain_output(&mut spawned.output_rx, &mut pipeline).await;
        }
        pipeline.finish();

        let exit = match exit {
            Some(exit) => exit,
            None => {
                // Stream closed before the poll saw the exit; collect the
                // status with a blocking wait off the async loop.
                let mut child = spawned.child;
                let status = tokio::task::spawn_blocking(move || child.wait())
                    .await
                    .map_err(|e| Error::Other(format!("exit wait task failed: {}", e)))??;
                session_exit(&status)
            }
        };

        spawned.session.mark_terminated(exit.clone());
        let scan = pipeline.parser.stats();
        let dispatch = pipeline.dispatcher.stats();

        // Closing the channel lets the writer drain its queue and exit;
        // the join keeps the tail of the session's output off the floor
        // when the caller exits right after us.
        drop(pipeline);
        if let Ok(Err(_)) = tokio::task::spawn_blocking(move || output_thread.join()).await {
            warn!("Host output thread panicked during shutdown");
        }

        info!(
            "Session {} ended: {} ({} events delivered, {} suppressed)",
            spawned.session.id, exit, dispatch.delivered, dispatch.suppressed
        );

        Ok(SessionSummary {
            session: spawned.session,
            exit,
            scan,
            dispatch,
        })
    }
}

/// Where the output pipeline reads echo state from, if anywhere.
enum EchoProbe {
    /// Probing switched off by configuration; events are never gated.
    Disabled,
    /// Probe this descriptor before each event.
    Fd(RawFd),
    /// Probing wanted but impossible; every event is suppressed.
    Unavailable,
}

/// The master-to-host half of the bridge: scan, gate, dispatch, forward.
struct OutputPipeline {
    parser: MarkerParser,
    gate: SafetyGate,
    dispatcher: EventDispatcher,
    host_tx: mpsc::Sender<Vec<u8>>,
    probe: EchoProbe,
}

impl OutputPipeline {
    fn process(&mut self, bytes: &[u8]) {
        let (clean, events) = self.parser.feed(bytes);
        for event in &events {
            self.gate_event(event);
        }
        if !clean.is_empty() && self.host_tx.send(clean).is_err() {
            debug!("Host output channel closed");
        }
    }

    fn gate_event(&mut self, event: &BoundaryEvent) {
        match self.probe {
            EchoProbe::Disabled => {}
            EchoProbe::Fd(fd) => match query_echo(fd) {
                Ok(echo) => self.gate.observe(Some(echo)),
                Err(e) => {
                    debug!("{}", e);
                    self.gate.observe(None);
                }
            },
            EchoProbe::Unavailable => self.gate.observe(None),
        }

        if self.gate.should_suppress() {
            self.dispatcher.drop_suppressed(event);
        } else {
            self.dispatcher.dispatch(event);
        }
    }

    /// Flush bytes still held back as a potential marker prefix.
    fn finish(&mut self) {
        let remainder = self.parser.finish();
        if !remainder.is_empty() && self.host_tx.send(remainder).is_err() {
            debug!("Host output channel closed at session end");
        }
    }
}

fn session_exit(status: &ExitStatus) -> SessionExit {
    match status.signal() {
        Some(name) => SessionExit::Signaled(name.to_string()),
        None => SessionExit::Exited(status.exit_code() as i32),
    }
}

fn forward_signal(forwarder: &Option<SignalForwarder>, sig: Signal) {
    match forwarder {
        Some(f) => {
            if let Err(e) = f.forward(sig) {
                warn!("{}", e);
            }
        }
        None => debug!("No child pid recorded; {} not forwarded", sig),
    }
}

fn resize_to_host(master: &dyn MasterPty, session: &mut ShellSession) {
    let size = query_winsize(nix::libc::STDIN_FILENO);
    match master.resize(size) {
        Ok(()) => {
            session.mark_resized(size.rows, size.cols);
            debug!("PTY resized to {}x{}", size.cols, size.rows);
        }
        Err(e) => warn!("PTY resize failed: {}", e),
    }
}

/// Host input thread: verbatim copy into the PTY writer channel. EOF
/// here leaves the session running; the shell decides when it is done.
fn spawn_input_thread(mut input: Box<dyn Read + Send>, tx: mpsc::Sender<Vec<u8>>) {
    thread::spawn(move || {
        let mut buf = [0u8; 1024];
        loop {
            match input.read(&mut buf) {
                Ok(0) => {
                    debug!("Host input EOF");
                    break;
                }
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).is_err() {
                        debug!("PTY input channel closed, stopping input thread");
                        break;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!("Host input read ended: {}", e);
                    break;
                }
            }
        }
    });
}

/// Host output thread: drains cleaned chunks to the user's terminal,
/// flushing per chunk so interactive output stays snappy. The thread
/// exits once every sender is dropped and the queue is empty; the
/// bridge joins it before reporting the session done.
fn spawn_output_thread(
    mut output: Box<dyn Write + Send>,
) -> (mpsc::Sender<Vec<u8>>, thread::JoinHandle<()>) {
    let (tx, rx) = mpsc::channel::<Vec<u8>>();
    let handle = thread::spawn(move || {
        while let Ok(data) = rx.recv() {
            if let Err(e) = output.write_all(&data) {
                warn!("Host output write failed: {}", e);
                break;
            }
            if let Err(e) = output.flush() {
                debug!("Host output flush error: {}", e);
            }
        }
        debug!("Host output thread exiting");
    });
    (tx, handle)
}

async fn drain_output(rx: &mut UnboundedReceiver<Vec<u8>>, pipeline: &mut OutputPipeline) {
    loop {
        match tokio::time::timeout(DRAIN_TIMEOUT, rx.recv()).await {
            Ok(Some(bytes)) => pipeline.process(&bytes),
            Ok(None) => break,
            Err(_) => {
                debug!("Output drain timed out; a descendant may still hold the PTY");
                break;
            }
        }
    }
}
