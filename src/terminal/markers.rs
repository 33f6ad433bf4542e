//! Boundary Marker Scanning
//!
//! Strips OSC 133 boundary markers out of the shell's output stream and
//! turns them into ordered [`BoundaryEvent`]s. Everything that is not an
//! exact marker passes through byte-identical, including sequences that
//! merely resemble one. The scanner is stateful so a marker cut in half
//! by a read boundary is held back and completed on the next feed
//! instead of leaking garbage to the terminal.
//!
//! Wire format: `ESC ] 1 3 3 ; <letter> [; <digits>] <terminator>` where
//! the letter is `A` (command start), `B` (command end, optionally with
//! exit-status digits), `P` (prompt start) or `Q` (prompt end), and the
//! terminator is BEL or `ESC \`.

use crate::error::Error;
use crate::models::{BoundaryEvent, BoundaryKind};

/// Shared OSC prefix of every boundary marker: `ESC ] 1 3 3 ;`
pub const MARKER_OSC_PREFIX: &[u8] = b"\x1b]133;";

const ESC: u8 = 0x1b;
const BEL: u8 = 0x07;

/// Exit statuses are small; anything past nine digits is not a marker.
/// Nine also keeps the status safely inside `i32` when parsed.
const MAX_STATUS_DIGITS: usize = 9;

/// Position of the status digits inside a held candidate
/// (prefix + letter + `;`).
const STATUS_OFFSET: usize = MARKER_OSC_PREFIX.len() + 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Not inside a candidate marker
    Ground,
    /// Matched `matched` bytes of the OSC prefix
    Prefix { matched: usize },
    /// Prefix complete, expecting a boundary letter
    Letter,
    /// Letter consumed, expecting a terminator or (for `B`) a `;`
    Terminator,
    /// Inside the status parameter of a `B` marker
    Status { digits: usize },
    /// Saw ESC where a terminator may appear, expecting `\`
    TerminatorEsc,
}

/// Counters describing what the scanner has seen for one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Complete markers recognized and stripped
    pub markers_matched: u64,
    /// Events actually emitted (matched minus coalesced/discarded)
    pub events_emitted: u64,
    /// Sequences that carried the full OSC prefix but were not markers
    pub lookalikes: u64,
    /// Repeated command-start markers folded into an open command
    pub coalesced: u64,
    /// Command-end markers seen with no command open
    pub discarded: u64,
}

/// Stateful scanner for one session's output stream.
///
/// Feed it chunks in arrival order; it returns the chunk with markers
/// removed plus any boundary events they encoded. Call [`finish`] when
/// the stream ends to recover bytes held back as a possible marker.
///
/// [`finish`]: MarkerParser::finish
#[derive(Debug)]
pub struct MarkerParser {
    state: ScanState,
    /// Candidate bytes withheld from output until they match or diverge
    pending: Vec<u8>,
    /// Boundary letter of the current candidate
    letter: u8,
    /// Command-alternation flag: a command is open until its end marker
    in_command: bool,
    next_seq: u64,
    stats: ScanStats,
}

impl Default for MarkerParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkerParser {
    /// Create a scanner at the start of a session
    pub fn new() -> Self {
        Self {
            state: ScanState::Ground,
            pending: Vec::with_capacity(32),
            letter: 0,
            in_command: false,
            next_seq: 0,
            stats: ScanStats::default(),
        }
    }

    /// Scan one chunk of shell output.
    ///
    /// Returns the chunk with recognized markers removed, in original
    /// byte order, and the events those markers encoded, in the order
    /// they appeared.
    pub fn feed(&mut self, input: &[u8]) -> (Vec<u8>, Vec<BoundaryEvent>) {
        let mut out = Vec::with_capacity(input.len());
        let mut events = Vec::new();
        for &byte in input {
            let mut b = byte;
            // A rejected byte is re-examined at most twice: once against
            // a candidate begun by a held terminator ESC, once from the
            // ground state. Each rejection empties held state, so this
            // terminates.
            loop {
                match self.step(b, &mut out, &mut events) {
                    None => break,
                    Some(retry) => b = retry,
                }
            }
        }
        (out, events)
    }

    /// Flush bytes held back as a possible marker.
    ///
    /// Call at end of stream; a marker cut off by session end was never
    /// a marker and belongs to the terminal verbatim.
    pub fn finish(&mut self) -> Vec<u8> {
        let mut out = std::mem::take(&mut self.pending);
        if self.state == ScanState::TerminatorEsc {
            // the terminator ESC is held implicitly, not in the buffer
            out.push(ESC);
        }
        self.state = ScanState::Ground;
        out
    }

    /// Counters for this session so far
    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    /// Advance the state machine by one byte.
    ///
    /// `Some(byte)` means the byte diverged from the current candidate:
    /// held bytes have been flushed and the byte must be examined again.
    fn step(
        &mut self,
        byte: u8,
        out: &mut Vec<u8>,
        events: &mut Vec<BoundaryEvent>,
    ) -> Option<u8> {
        match self.state {
            ScanState::Ground => {
                if byte == ESC {
                    self.pending.push(byte);
                    self.state = ScanState::Prefix { matched: 1 };
                } else {
                    out.push(byte);
                }
                None
            }
            ScanState::Prefix { matched } => {
                if byte == MARKER_OSC_PREFIX[matched] {
                    self.pending.push(byte);
                    self.state = if matched + 1 == MARKER_OSC_PREFIX.len() {
                        ScanState::Letter
                    } else {
                        ScanState::Prefix { matched: matched + 1 }
                    };
                    None
                } else {
                    self.reject(out);
                    Some(byte)
                }
            }
            ScanState::Letter => match byte {
                b'A' | b'B' | b'P' | b'Q' => {
                    self.letter = byte;
                    self.pending.push(byte);
                    self.state = ScanState::Terminator;
                    None
                }
                _ => {
                    self.note_lookalike(byte);
                    self.reject(out);
                    Some(byte)
                }
            },
            ScanState::Terminator => match byte {
                BEL => {
                    self.complete(out, events);
                    None
                }
                ESC => {
                    self.state = ScanState::TerminatorEsc;
                    None
                }
                b';' if self.letter == b'B' => {
                    self.pending.push(byte);
                    self.state = ScanState::Status { digits: 0 };
                    None
                }
                _ => {
                    self.note_lookalike(byte);
                    self.reject(out);
                    Some(byte)
                }
            },
            ScanState::Status { digits } => match byte {
                b'0'..=b'9' if digits < MAX_STATUS_DIGITS => {
                    self.pending.push(byte);
                    self.state = ScanState::Status { digits: digits + 1 };
                    None
                }
                BEL if digits > 0 => {
                    self.complete(out, events);
                    None
                }
                ESC if digits > 0 => {
                    self.state = ScanState::TerminatorEsc;
                    None
                }
                _ => {
                    self.note_lookalike(byte);
                    self.reject(out);
                    Some(byte)
                }
            },
            ScanState::TerminatorEsc => {
                if byte == b'\\' {
                    self.complete(out, events);
                    None
                } else {
                    // flush the candidate but keep the ESC: it may begin
                    // a marker of its own
                    self.note_lookalike(byte);
                    out.append(&mut self.pending);
                    self.pending.push(ESC);
                    self.state = ScanState::Prefix { matched: 1 };
                    Some(byte)
                }
            }
        }
    }

    /// The candidate diverged: return its bytes to the output verbatim.
    fn reject(&mut self, out: &mut Vec<u8>) {
        out.append(&mut self.pending);
        self.state = ScanState::Ground;
    }

    fn note_lookalike(&mut self, byte: u8) {
        self.stats.lookalikes += 1;
        debug!(
            "{}",
            Error::MarkerScanAnomaly {
                detail: format!(
                    "diverged at 0x{:02x} after {} bytes, passed through",
                    byte,
                    self.pending.len()
                ),
            }
        );
    }

    /// A full marker matched: strip it and emit its event, subject to
    /// the command-alternation rule.
    fn complete(&mut self, out: &mut Vec<u8>, events: &mut Vec<BoundaryEvent>) {
        let exit_code = self.parse_status();
        let kind = match self.letter {
            b'A' => Some(BoundaryKind::CommandStart),
            b'B' => Some(BoundaryKind::CommandEnd { exit_code }),
            b'P' => Some(BoundaryKind::PromptStart),
            b'Q' => Some(BoundaryKind::PromptEnd),
            _ => None,
        };
        match kind {
            Some(BoundaryKind::CommandStart) if self.in_command => {
                // bash fires its pre-command trap once per pipeline
                // segment; only the first opens the command
                self.stats.markers_matched += 1;
                self.stats.coalesced += 1;
                debug!("coalesced repeated command-start marker");
            }
            Some(BoundaryKind::CommandEnd { .. }) if !self.in_command => {
                // shells emit a command-end before their very first prompt
                self.stats.markers_matched += 1;
                self.stats.discarded += 1;
                debug!("discarded command-end marker with no open command");
            }
            Some(kind) => {
                self.stats.markers_matched += 1;
                self.in_command = match kind {
                    BoundaryKind::CommandStart => true,
                    BoundaryKind::CommandEnd { .. } => false,
                    _ => self.in_command,
                };
                events.push(BoundaryEvent::new(kind, self.next_seq));
                self.next_seq += 1;
                self.stats.events_emitted += 1;
            }
            None => {
                // letters are validated on entry, but a miss must never
                // eat bytes
                out.append(&mut self.pending);
            }
        }
        self.pending.clear();
        self.state = ScanState::Ground;
    }

    /// Status digits of the current candidate, if it carried any
    fn parse_status(&self) -> Option<i32> {
        if self.pending.len() > STATUS_OFFSET {
            std::str::from_utf8(&self.pending[STATUS_OFFSET..])
                .ok()
                .and_then(|s| s.parse::<i32>().ok())
        } else {
            None
        }
    }
}
