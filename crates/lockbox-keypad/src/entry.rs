//! Rolling four-digit entry buffer.
//!
//! The buffer is a shift register: every confirmed digit moves the existing
//! slots one position toward the oldest end and lands in slot 0. After any
//! number of digits the buffer holds the last four, most recent first.

use lockbox_core::constants::DIGIT_COUNT;
use lockbox_core::{Code, Digit, KeyCode};

/// Last four confirmed digits, most recent first.
///
/// Slots that have not received a digit since the last [`clear`](Self::clear)
/// are blank (`None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryBuffer {
    slots: [Option<Digit>; DIGIT_COUNT],
}

impl EntryBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shift in a digit.
    pub fn push(&mut self, digit: Digit) {
        self.slots.copy_within(0..DIGIT_COUNT - 1, 1);
        self.slots[0] = Some(digit);
    }

    /// Apply a confirmed key; only digits are written.
    ///
    /// Returns `true` if the key was a digit and the buffer shifted.
    pub fn accept(&mut self, key: KeyCode) -> bool {
        match key.as_digit() {
            Some(digit) => {
                self.push(digit);
                true
            }
            None => false,
        }
    }

    /// Blank every slot.
    pub fn clear(&mut self) {
        self.slots = [None; DIGIT_COUNT];
    }

    /// Slots, most recent first.
    pub fn slots(&self) -> &[Option<Digit>; DIGIT_COUNT] {
        &self.slots
    }

    /// Check if no digit has been entered since the last clear.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Copy the buffer into a code.
    pub fn to_code(&self) -> Code {
        Code::new(self.slots)
    }
}
