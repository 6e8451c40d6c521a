//! Key press debouncer.
//!
//! Mechanical contacts bounce, so a single press shows up as a burst of
//! on/off readings. The debouncer consumes one scan result per cycle and
//! reports a key only after the *same* key has been seen on `threshold`
//! consecutive cycles.
//!
//! # States
//!
//! - `Idle`: no key held
//! - `Confirming`: a key is held, counting consecutive observations
//! - `Confirmed`: threshold reached, event fires on the next step
//! - `Releasing`: event fired, waiting for the key to be released
//!
//! # Transitions
//!
//! - Idle → Confirming (key seen)
//! - Confirming → Confirming (same key, or a different key restarts the count)
//! - Confirming → Confirmed (count reached threshold)
//! - Confirming → Idle (key released before threshold)
//! - Confirmed → Releasing (fires the event)
//! - Releasing → Idle (key released)
//!
//! A key held past the threshold never fires twice: the debouncer stays in
//! `Releasing` until the keypad reads empty.
//!
//! # Examples
//!
//! ```
//! use lockbox_core::KeyCode;
//! use lockbox_keypad::Debouncer;
//!
//! let mut debouncer = Debouncer::new(3);
//! let key = Some(KeyCode::Submit);
//!
//! assert_eq!(debouncer.step(key), None);
//! assert_eq!(debouncer.step(key), None);
//! assert_eq!(debouncer.step(key), None); // threshold reached
//! assert_eq!(debouncer.step(key), Some(KeyCode::Submit));
//! assert_eq!(debouncer.step(key), None); // still held, no repeat
//! ```

use std::fmt;

use lockbox_core::KeyCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Debouncer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebounceState {
    /// No key held.
    Idle,
    /// Counting consecutive observations of one key.
    Confirming,
    /// Threshold reached; the event fires on the next step.
    Confirmed,
    /// Event fired; waiting for release.
    Releasing,
}

impl fmt::Display for DebounceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            DebounceState::Idle => "Idle",
            DebounceState::Confirming => "Confirming",
            DebounceState::Confirmed => "Confirmed",
            DebounceState::Releasing => "Releasing",
        };
        write!(f, "{}", state_str)
    }
}

/// Consecutive-sample key debouncer.
#[derive(Debug, Clone)]
pub struct Debouncer {
    state: DebounceState,
    candidate: Option<KeyCode>,
    count: u32,
    threshold: u32,
}

impl Debouncer {
    /// Create a debouncer that confirms after `threshold` identical scans.
    ///
    /// A threshold of zero behaves like one.
    pub fn new(threshold: u32) -> Self {
        Self {
            state: DebounceState::Idle,
            candidate: None,
            count: 0,
            threshold: threshold.max(1),
        }
    }

    /// Current state.
    pub fn state(&self) -> DebounceState {
        self.state
    }

    /// Consecutive observations of the candidate key.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Key being confirmed or released, if any.
    pub fn candidate(&self) -> Option<KeyCode> {
        self.candidate
    }

    /// Feed one scan result; returns a key exactly once per confirmed press.
    pub fn step(&mut self, scanned: Option<KeyCode>) -> Option<KeyCode> {
        match self.state {
            DebounceState::Idle => {
                if let Some(key) = scanned {
                    self.start(key);
                }
                None
            }
            DebounceState::Confirming => {
                match scanned {
                    Some(key) if Some(key) == self.candidate => {
                        self.count += 1;
                        self.check_threshold();
                    }
                    Some(key) => self.start(key),
                    None => self.reset(),
                }
                None
            }
            DebounceState::Confirmed => {
                self.state = DebounceState::Releasing;
                debug!(key = ?self.candidate, scans = self.count, "key confirmed");
                self.candidate
            }
            DebounceState::Releasing => {
                if scanned.is_none() {
                    self.reset();
                }
                None
            }
        }
    }

    fn start(&mut self, key: KeyCode) {
        self.state = DebounceState::Confirming;
        self.candidate = Some(key);
        self.count = 1;
        self.check_threshold();
    }

    fn check_threshold(&mut self) {
        if self.count >= self.threshold {
            self.state = DebounceState::Confirmed;
        }
    }

    fn reset(&mut self) {
        self.state = DebounceState::Idle;
        self.candidate = None;
        self.count = 0;
    }
}
