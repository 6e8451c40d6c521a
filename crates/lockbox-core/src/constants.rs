//! Panel geometry, glyph tables and timing defaults for the lockbox.
//!
//! This module defines the fixed tables shared by the scanner, the display
//! renderer and the lock controller, plus the default values used by
//! [`LockboxConfig`](crate::LockboxConfig).
//!
//! # Panel Layout
//!
//! The keypad and the display share four select lines. Select line `n`
//! drives keypad row `n` and display digit `n` at the same time:
//!
//! ```text
//!             col 0   col 1   col 2   col 3
//!   row 0       1       2       3       A
//!   row 1       4       5       6       B
//!   row 2       7       8       9       C
//!   row 3       *       0       #       D
//! ```
//!
//! # Usage
//!
//! ```
//! use lockbox_core::constants::*;
//!
//! // Row 3, column 1 is the zero key
//! assert_eq!(KEY_MATRIX[3][1], 0);
//!
//! // Segment byte for the digit 8 lights every segment (active low)
//! assert_eq!(HEX_SEGMENTS[8], 0x00);
//! ```

// ============================================================================
// Panel Geometry
// ============================================================================

/// Number of display digits, keypad rows and shared select lines.
pub const DIGIT_COUNT: usize = 4;

/// Number of keypad rows (one per select line).
pub const KEYPAD_ROWS: usize = DIGIT_COUNT;

/// Number of keypad column inputs.
pub const KEYPAD_COLUMNS: usize = 4;

/// Number of segment output lines (a-g, no decimal point).
pub const SEGMENT_LINES: u8 = 7;

/// Physical keypad position to logical key code.
///
/// Codes 0-9 are digits, 10 is `A` (submit), 11 is `B` (unlock submit),
/// 12 is `C`, 13 is `D`, 14 is `*` and 15 is `#`.
pub const KEY_MATRIX: [[u8; KEYPAD_COLUMNS]; KEYPAD_ROWS] = [
    [1, 2, 3, 10],
    [4, 5, 6, 11],
    [7, 8, 9, 12],
    [14, 0, 15, 13],
];

// ============================================================================
// Segment Glyphs
// ============================================================================

/// Active-low 7-segment bytes for hex glyphs `0`-`F`.
///
/// Bit `n` drives segment `n` (`a` = bit 0 ... `g` = bit 6). A cleared bit
/// lights the segment.
pub const HEX_SEGMENTS: [u8; 16] = [
    0x40, 0x79, 0x24, 0x30, 0x19, 0x12, 0x02, 0x78, // 0-7
    0x00, 0x18, 0x08, 0x03, 0x46, 0x21, 0x06, 0x0E, // 8-F
];

/// Underscore glyph (segment `d` only).
pub const SEGMENT_UNDERSCORE: u8 = 0xF7;

/// Capital `L` glyph.
pub const SEGMENT_L: u8 = 0x47;

/// Capital `O` glyph (same lit segments as `0`).
pub const SEGMENT_O: u8 = 0x40;

/// Capital `C` glyph.
pub const SEGMENT_C: u8 = 0x46;

/// Lowercase `d` glyph.
pub const SEGMENT_D: u8 = 0x21;

/// All segments dark.
pub const SEGMENT_OFF: u8 = 0x7F;

// ============================================================================
// Timing Defaults
// ============================================================================

/// Default settle delay after driving one display digit, in microseconds.
///
/// One full scan cycle visits all four digits, so the default cycle period
/// is 1 ms.
pub const DEFAULT_SCAN_SETTLE_US: u64 = 250;

/// Default number of consecutive identical scans before a key is confirmed.
pub const DEFAULT_DEBOUNCE_THRESHOLD: u32 = 20;

/// Default number of failed attempts that triggers a lockout.
pub const DEFAULT_MAX_TRIES: u32 = 3;

/// Default time the user has to type a new PIN, in milliseconds.
pub const DEFAULT_PIN_ENTRY_WINDOW_MS: u64 = 8_000;

/// Default time the actuator stays asserted after a successful unlock, in milliseconds.
pub const DEFAULT_UNLOCK_WINDOW_MS: u64 = 10_000;

/// Default lockout duration, in milliseconds (three minutes).
pub const DEFAULT_LOCKOUT_WINDOW_MS: u64 = 180_000;
