//! Test Fixtures
//!
//! Marker byte-stream builders and a recording consumer for scanner and
//! dispatch tests.

use std::sync::{Arc, Mutex};

use prismshell::error::Result;
use prismshell::events::{EventConsumer, EventDispatcher};
use prismshell::models::{BoundaryEvent, BoundaryKind};
use prismshell::terminal::MarkerParser;

/// Raw command-start marker bytes
pub fn command_start() -> Vec<u8> {
    b"\x1b]133;A\x07".to_vec()
}

/// Raw command-end marker bytes carrying an exit code
pub fn command_end(exit_code: i32) -> Vec<u8> {
    format!("\x1b]133;B;{}\x07", exit_code).into_bytes()
}

/// Raw prompt-start marker bytes
pub fn prompt_start() -> Vec<u8> {
    b"\x1b]133;P\x07".to_vec()
}

/// Raw prompt-end marker bytes
pub fn prompt_end() -> Vec<u8> {
    b"\x1b]133;Q\x07".to_vec()
}

/// One full cycle: the prompt renders, a command starts, its output
/// appears, and the command ends with `exit_code`
pub fn command_cycle(output: &str, exit_code: i32) -> Vec<u8> {
    let mut stream = Vec::new();
    stream.extend(prompt_start());
    stream.extend(prompt_end());
    stream.extend(command_start());
    stream.extend_from_slice(output.as_bytes());
    stream.extend(command_end(exit_code));
    stream
}

/// Consumer that records every delivered event
pub struct RecordingConsumer {
    events: Arc<Mutex<Vec<BoundaryEvent>>>,
}

impl RecordingConsumer {
    /// The consumer plus a handle that stays readable after the
    /// consumer has been boxed into a dispatcher
    pub fn with_handle() -> (Self, Arc<Mutex<Vec<BoundaryEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let consumer = Self {
            events: Arc::clone(&events),
        };
        (consumer, events)
    }
}

impl EventConsumer for RecordingConsumer {
    fn name(&self) -> &str {
        "recording"
    }

    fn on_event(&mut self, event: &BoundaryEvent) -> Result<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Kinds observed through a recording handle, in delivery order
pub fn recorded_kinds(events: &Arc<Mutex<Vec<BoundaryEvent>>>) -> Vec<BoundaryKind> {
    events.lock().unwrap().iter().map(|e| e.kind).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_markers_scan_back() {
        let mut parser = MarkerParser::new();
        let (out, events) = parser.feed(&command_start());
        assert!(out.is_empty());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, BoundaryKind::CommandStart);
    }

    #[test]
    fn test_command_end_carries_its_code() {
        let mut parser = MarkerParser::new();
        let mut stream = command_start();
        stream.extend(command_end(42));

        let (_, events) = parser.feed(&stream);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].kind, BoundaryKind::CommandEnd { exit_code: Some(42) });
    }

    #[test]
    fn test_command_cycle_scans_clean() {
        let mut parser = MarkerParser::new();
        let (out, events) = parser.feed(&command_cycle("ls output\n", 0));

        assert_eq!(out, b"ls output\n");
        let kinds: Vec<BoundaryKind> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                BoundaryKind::PromptStart,
                BoundaryKind::PromptEnd,
                BoundaryKind::CommandStart,
                BoundaryKind::CommandEnd { exit_code: Some(0) },
            ]
        );
    }

    #[test]
    fn test_recording_consumer_captures_events() {
        let (consumer, handle) = RecordingConsumer::with_handle();
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(Box::new(consumer));

        dispatcher.dispatch(&BoundaryEvent::new(BoundaryKind::CommandStart, 0));
        dispatcher.dispatch(&BoundaryEvent::new(
            BoundaryKind::CommandEnd { exit_code: Some(1) },
            1,
        ));

        assert_eq!(handle.lock().unwrap().len(), 2);
        assert_eq!(
            recorded_kinds(&handle),
            vec![
                BoundaryKind::CommandStart,
                BoundaryKind::CommandEnd { exit_code: Some(1) },
            ]
        );
    }
}
