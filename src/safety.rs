//! Password-Entry Safety Gate
//!
//! Tracks whether the wrapped terminal is in a no-echo state, which is
//! how password prompts read input. While echo is off, boundary events
//! are withheld from consumers so nothing cosmetic reacts to secret
//! input. Raw byte forwarding is never affected.
//!
//! An unreadable echo state counts as no-echo: when in doubt, stay
//! quiet.

/// Session-scoped suppression state fed by terminal echo observations
#[derive(Debug, Default)]
pub struct SafetyGate {
    suppressed: bool,
}

impl SafetyGate {
    /// Create a gate in the delivering state
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an observation of the terminal's echo attribute.
    ///
    /// `Some(true)` means echo is on (normal input), `Some(false)` means
    /// echo is off (password-style input), `None` means the state could
    /// not be read and suppression is the safe default.
    pub fn observe(&mut self, echo: Option<bool>) {
        let suppress = match echo {
            Some(echo_on) => !echo_on,
            None => true,
        };
        if suppress != self.suppressed {
            if suppress {
                debug!("terminal echo is off, suppressing boundary events");
            } else {
                debug!("terminal echo restored, resuming boundary events");
            }
        }
        self.suppressed = suppress;
    }

    /// Whether event delivery is currently withheld
    pub fn should_suppress(&self) -> bool {
        self.suppressed
    }
}
