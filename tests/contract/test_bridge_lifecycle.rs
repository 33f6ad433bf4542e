//! Contract tests for the PTY bridge session lifecycle
//!
//! Every test runs a real shell on a real PTY, with the host side
//! replaced by in-memory pipes. `/bin/sh` classifies as `Unknown`, so
//! these sessions get no hooks and behave as plain passthroughs.

use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use nix::sys::signal::{raise, Signal};
use portable_pty::PtySize;
use tokio::sync::mpsc::UnboundedReceiver;

use prismshell::models::{SessionExit, ShellType};
use prismshell::pty::spawn_session;
use prismshell::shell::{HookScript, ResolvedShell};
use prismshell::{BridgeIo, PtyBridge};

#[tokio::test]
async fn test_exit_code_passes_through_unchanged() {
    // Arrange
    let (bridge, _collected) = bridge_for_input("exit 3\n");

    // Act
    let summary = bridge.run().await.expect("bridge run");

    // Assert
    assert_eq!(summary.exit, SessionExit::Exited(3));
    assert_eq!(summary.exit.code(), 3);
    assert!(!summary.exit.is_success());
}

#[tokio::test]
async fn test_clean_exit_reports_success() {
    // Arrange
    let (bridge, _collected) = bridge_for_input("exit 0\n");

    // Act
    let summary = bridge.run().await.expect("bridge run");

    // Assert
    assert!(summary.exit.is_success());
    assert!(summary.session.is_terminated());
    assert!(summary.session.pid.is_some());
    assert!(summary.session.duration().is_some());
}

#[tokio::test]
async fn test_output_reaches_the_host_writer() {
    // Arrange
    let (bridge, collected) = bridge_for_input("echo bridge-echo-check\nexit 0\n");

    // Act
    let summary = bridge.run().await.expect("bridge run");

    // Assert: run() joins the host writer, so the transcript is complete
    assert!(summary.exit.is_success());
    let output = transcript(&collected);
    assert!(
        output.contains("bridge-echo-check"),
        "host transcript missing command output: {:?}",
        output
    );
}

#[tokio::test]
async fn test_signal_death_maps_into_exit_code() {
    // Arrange
    let (bridge, _collected) = bridge_for_input("kill -9 $$\n");

    // Act
    let summary = bridge.run().await.expect("bridge run");

    // Assert: SIGKILL lands as 128 + 9, the way a wrapping shell reports it
    assert!(
        matches!(summary.exit, SessionExit::Signaled(_)),
        "expected signal death, got {:?}",
        summary.exit
    );
    assert_eq!(summary.exit.code(), 137);
    assert!(!summary.exit.is_success());
}

#[tokio::test]
async fn test_session_outlives_host_input_eof() {
    // Arrange: the in-memory input hits EOF as soon as both lines are
    // consumed, long before the first command finishes.
    let (bridge, collected) = bridge_for_input("sleep 0.2; echo after-eof\nexit 0\n");

    // Act
    let summary = bridge.run().await.expect("bridge run");

    // Assert: the shell decided when the session was over, not the EOF
    assert!(summary.exit.is_success());
    let output = transcript(&collected);
    assert!(
        output.contains("after-eof"),
        "session ended early on input EOF: {:?}",
        output
    );
}

#[tokio::test]
async fn test_resize_is_visible_to_the_child() {
    // Arrange: drive the spawned session directly, no bridge loop in
    // the way, so the size the child reports is unambiguous.
    let shell = ResolvedShell {
        path: PathBuf::from("/bin/sh"),
        shell_type: ShellType::Unknown,
    };
    let hooks = HookScript::for_shell(ShellType::Unknown);
    let mut spawned = spawn_session(&shell, &hooks, size(24, 80)).expect("spawn session");

    // Act: ask the child for its size, resize the master, ask again
    spawned.input_tx.send(b"stty size\n".to_vec()).expect("send");
    read_until(&mut spawned.output_rx, "24 80").await;

    spawned.master.resize(size(40, 120)).expect("resize master");
    spawned.input_tx.send(b"stty size\n".to_vec()).expect("send");

    // Assert: the child sees the new dimensions through its own tty
    read_until(&mut spawned.output_rx, "40 120").await;

    spawned.input_tx.send(b"exit\n".to_vec()).expect("send");
    spawned.child.wait().expect("wait");
}

#[tokio::test]
async fn test_resize_signal_leaves_the_session_intact() {
    // Arrange
    let (bridge, collected) = bridge_for_input("sleep 0.3; echo resize-survivor\nexit 0\n");

    // Act: hit the bridge with a window change mid-command
    let kicker = tokio::spawn(async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        raise(Signal::SIGWINCH).expect("raise SIGWINCH");
    });
    let summary = bridge.run().await.expect("bridge run");
    kicker.await.expect("kicker task");

    // Assert: the resize was absorbed, not treated as a reason to die
    assert!(summary.exit.is_success());
    let output = transcript(&collected);
    assert!(
        output.contains("resize-survivor"),
        "session lost output around the resize: {:?}",
        output
    );
}

#[tokio::test]
async fn test_unhooked_shell_produces_no_events() {
    // Arrange
    let (bridge, _collected) = bridge_for_input("echo plain\nexit 0\n");

    // Act
    let summary = bridge.run().await.expect("bridge run");

    // Assert
    assert_eq!(summary.scan.markers_matched, 0);
    assert_eq!(summary.dispatch.delivered, 0);
    assert_eq!(summary.dispatch.suppressed, 0);
}

#[tokio::test]
async fn test_spawn_failure_surfaces_as_error() {
    // Arrange
    let shell = ResolvedShell {
        path: PathBuf::from("/nonexistent/prismshell-missing-shell"),
        shell_type: ShellType::Unknown,
    };
    let hooks = HookScript::for_shell(ShellType::Unknown);
    let collected = Arc::new(Mutex::new(Vec::new()));
    let io = BridgeIo::piped(
        Box::new(Cursor::new(Vec::new())),
        Box::new(SharedWriter(Arc::clone(&collected))),
    );
    let bridge = PtyBridge::new(shell, hooks, io);

    // Act
    let err = bridge.run().await.expect_err("missing shell must not start");

    // Assert
    assert!(
        err.to_string().contains("prismshell-missing-shell"),
        "error does not name the shell: {}",
        err
    );
}

// === Helpers ===

/// Host-side output sink shared between the bridge and the test.
struct SharedWriter(Arc<Mutex<Vec<u8>>>);

impl Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Bridge wrapping `/bin/sh` with `input` queued as host keystrokes,
/// plus a handle on everything the session writes back to the host.
fn bridge_for_input(input: &str) -> (PtyBridge, Arc<Mutex<Vec<u8>>>) {
    let shell = ResolvedShell {
        path: PathBuf::from("/bin/sh"),
        shell_type: ShellType::Unknown,
    };
    let hooks = HookScript::for_shell(ShellType::Unknown);
    let collected = Arc::new(Mutex::new(Vec::new()));
    let io = BridgeIo::piped(
        Box::new(Cursor::new(input.as_bytes().to_vec())),
        Box::new(SharedWriter(Arc::clone(&collected))),
    );
    (PtyBridge::new(shell, hooks, io), collected)
}

fn transcript(collected: &Arc<Mutex<Vec<u8>>>) -> String {
    String::from_utf8_lossy(&collected.lock().unwrap()).into_owned()
}

fn size(rows: u16, cols: u16) -> PtySize {
    PtySize {
        rows,
        cols,
        pixel_width: 0,
        pixel_height: 0,
    }
}

/// Accumulate PTY output until `needle` appears, panicking after a
/// deadline so a wedged session fails loudly instead of hanging.
async fn read_until(rx: &mut UnboundedReceiver<Vec<u8>>, needle: &str) -> String {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    let mut seen = Vec::new();
    loop {
        let chunk = match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => panic!(
                "PTY closed while waiting for {:?}; saw {:?}",
                needle,
                String::from_utf8_lossy(&seen)
            ),
            Err(_) => panic!(
                "timed out waiting for {:?}; saw {:?}",
                needle,
                String::from_utf8_lossy(&seen)
            ),
        };
        seen.extend(chunk);
        let text = String::from_utf8_lossy(&seen);
        if text.contains(needle) {
            return text.into_owned();
        }
    }
}
