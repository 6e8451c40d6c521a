//! Display renderer for the four-digit LED panel.
//!
//! Rendering is pure: it turns a [`Code`] (or the entry buffer) and a
//! background [`Screen`] into the [`Frame`] the scanner writes on its next
//! cycle. Nothing here touches the hardware, so rendering the same input
//! twice always yields the same frame.
//!
//! Slot 0 is the rightmost digit. Text representations read left to right,
//! so slot 3 comes first.
//!
//! # Named Screens
//!
//! | Screen      | Text   | Shown while                         |
//! |-------------|--------|-------------------------------------|
//! | `Zeros`     | `0000` | idle, no secret set                 |
//! | `Blank`     | `____` | background while typing a new PIN   |
//! | `Locked`    | `LOC_` | locked, background for attempts     |
//! | `LockedOut` | `Ld__` | lockout                             |
//!
//! # Examples
//!
//! ```
//! use lockbox_core::Code;
//! use lockbox_emulator::display::{Screen, describe, render_over};
//!
//! let typed = Code::from_typed(&[4, 2]).unwrap();
//! let frame = render_over(&typed, Screen::Locked);
//!
//! // Blank slots keep the background glyph
//! assert_eq!(describe(frame.raw()), "L042");
//! ```

use std::fmt;

use lockbox_core::constants::{
    DIGIT_COUNT, HEX_SEGMENTS, SEGMENT_C, SEGMENT_D, SEGMENT_L, SEGMENT_O, SEGMENT_OFF,
    SEGMENT_UNDERSCORE,
};
use lockbox_core::{Code, Frame, SegmentPattern};
use lockbox_keypad::EntryBuffer;
use serde::{Deserialize, Serialize};

/// Only segment lines a-g are wired.
const SEGMENT_MASK: u8 = 0x7F;

/// Named full-panel screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    /// `0000`
    Zeros,
    /// `____`
    Blank,
    /// `LOC_`
    Locked,
    /// `Ld__`
    LockedOut,
}

impl Screen {
    /// Segment patterns for this screen, slot 0 rightmost.
    pub fn frame(&self) -> Frame {
        let raw = match self {
            Screen::Zeros => [HEX_SEGMENTS[0]; DIGIT_COUNT],
            Screen::Blank => [SEGMENT_UNDERSCORE; DIGIT_COUNT],
            Screen::Locked => [SEGMENT_UNDERSCORE, SEGMENT_C, SEGMENT_O, SEGMENT_L],
            Screen::LockedOut => [SEGMENT_UNDERSCORE, SEGMENT_UNDERSCORE, SEGMENT_D, SEGMENT_L],
        };
        Frame(raw.map(SegmentPattern::from_raw))
    }

    /// Text shown on the panel.
    pub fn text(&self) -> &'static str {
        match self {
            Screen::Zeros => "0000",
            Screen::Blank => "____",
            Screen::Locked => "LOC_",
            Screen::LockedOut => "Ld__",
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Render a named screen.
pub fn render_screen(screen: Screen) -> Frame {
    screen.frame()
}

/// Render the entry buffer over the blank (`____`) screen.
pub fn render(buffer: &EntryBuffer) -> Frame {
    render_over(&buffer.to_code(), Screen::Blank)
}

/// Render a code, filling blank slots from `background`.
pub fn render_over(code: &Code, background: Screen) -> Frame {
    let mut frame = background.frame();
    for (slot, digit) in code.slots().iter().enumerate() {
        if let Some(digit) = digit {
            frame.0[slot] = SegmentPattern::hex(digit.value());
        }
    }
    frame
}

/// Read segment bytes back as text, leftmost digit first.
///
/// `O` and `0` share a glyph and read as `0`. Unknown patterns read as `?`.
pub fn describe(raw: [u8; DIGIT_COUNT]) -> String {
    raw.iter().rev().map(|&bits| glyph(bits)).collect()
}

fn glyph(bits: u8) -> char {
    let bits = bits & SEGMENT_MASK;
    if bits == SEGMENT_UNDERSCORE & SEGMENT_MASK {
        return '_';
    }
    if bits == SEGMENT_OFF {
        return ' ';
    }
    if bits == SEGMENT_L {
        return 'L';
    }
    if bits == SEGMENT_D {
        return 'd';
    }
    HEX_SEGMENTS
        .iter()
        .position(|&pattern| pattern == bits)
        .and_then(|value| char::from_digit(value as u32, 16))
        .map_or('?', |c| c.to_ascii_uppercase())
}
