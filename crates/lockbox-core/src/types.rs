use crate::{
    Result,
    constants::{DIGIT_COUNT, HEX_SEGMENTS, KEY_MATRIX, KEYPAD_COLUMNS, KEYPAD_ROWS},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Decimal digit (0-9)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Digit(u8);

impl Digit {
    /// Create a new digit with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidDigit` if the value is greater than 9.
    pub fn new(value: u8) -> Result<Self> {
        if value > 9 {
            return Err(Error::InvalidDigit(value));
        }
        Ok(Digit(value))
    }

    /// Get the raw digit value.
    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Digit {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Digit::new(value)
    }
}

impl From<Digit> for u8 {
    fn from(digit: Digit) -> Self {
        digit.0
    }
}

impl fmt::Display for Digit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Logical key on the 4x4 keypad.
///
/// "No key pressed" is represented as `Option::<KeyCode>::None` by the
/// scanner and the debouncer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyCode {
    /// Numeric key 0-9.
    Digit(Digit),
    /// `A` key, submits a new PIN.
    Submit,
    /// `B` key, submits an unlock attempt.
    UnlockSubmit,
    /// `C` key (unused).
    C,
    /// `D` key (unused).
    D,
    /// `*` key (unused).
    Star,
    /// `#` key (unused).
    Hash,
}

impl KeyCode {
    /// Decode a numeric key code (0-15).
    ///
    /// # Errors
    /// Returns `Error::InvalidKeyCode` for values above 15.
    pub fn from_code(code: u8) -> Result<Self> {
        Ok(match code {
            0..=9 => KeyCode::Digit(Digit(code)),
            10 => KeyCode::Submit,
            11 => KeyCode::UnlockSubmit,
            12 => KeyCode::C,
            13 => KeyCode::D,
            14 => KeyCode::Star,
            15 => KeyCode::Hash,
            _ => return Err(Error::InvalidKeyCode(code)),
        })
    }

    /// Look up the key at a physical keypad position.
    ///
    /// # Errors
    /// Returns `Error::InvalidMatrixPosition` if `row` or `column` is out of range.
    pub fn from_position(row: usize, column: usize) -> Result<Self> {
        if row >= KEYPAD_ROWS || column >= KEYPAD_COLUMNS {
            return Err(Error::InvalidMatrixPosition { row, column });
        }
        KeyCode::from_code(KEY_MATRIX[row][column])
    }

    /// Numeric code of this key (0-15).
    #[must_use]
    pub fn code(&self) -> u8 {
        match self {
            KeyCode::Digit(d) => d.value(),
            KeyCode::Submit => 10,
            KeyCode::UnlockSubmit => 11,
            KeyCode::C => 12,
            KeyCode::D => 13,
            KeyCode::Star => 14,
            KeyCode::Hash => 15,
        }
    }

    /// Physical `(row, column)` position of this key.
    #[must_use]
    pub fn position(&self) -> (usize, usize) {
        let code = self.code();
        for (row, keys) in KEY_MATRIX.iter().enumerate() {
            if let Some(column) = keys.iter().position(|&k| k == code) {
                return (row, column);
            }
        }
        unreachable!("KEY_MATRIX holds every key code")
    }

    /// Check if this key is a digit.
    pub fn is_digit(&self) -> bool {
        matches!(self, KeyCode::Digit(_))
    }

    /// Get the digit if this is a digit key.
    pub fn as_digit(&self) -> Option<Digit> {
        match self {
            KeyCode::Digit(d) => Some(*d),
            _ => None,
        }
    }
}

/// Parses the label printed on the key (`A`-`D` are case-insensitive).
impl TryFrom<char> for KeyCode {
    type Error = Error;

    fn try_from(label: char) -> Result<Self> {
        match label.to_ascii_uppercase() {
            c @ '0'..='9' => KeyCode::from_code(c as u8 - b'0'),
            'A' => Ok(KeyCode::Submit),
            'B' => Ok(KeyCode::UnlockSubmit),
            'C' => Ok(KeyCode::C),
            'D' => Ok(KeyCode::D),
            '*' => Ok(KeyCode::Star),
            '#' => Ok(KeyCode::Hash),
            _ => Err(Error::InvalidKeyLabel(label)),
        }
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KeyCode::Digit(d) => write!(f, "{d}"),
            KeyCode::Submit => write!(f, "A"),
            KeyCode::UnlockSubmit => write!(f, "B"),
            KeyCode::C => write!(f, "C"),
            KeyCode::D => write!(f, "D"),
            KeyCode::Star => write!(f, "*"),
            KeyCode::Hash => write!(f, "#"),
        }
    }
}

/// Four-slot passcode, most recent digit first.
///
/// A slot is `None` when no digit was entered for it. Secrets and unlock
/// attempts are both captured from the entry buffer as a `Code`.
///
/// # Security
/// Equality is evaluated in constant time over all four slots.
#[derive(Debug, Clone, Copy, Eq, Default, Serialize, Deserialize)]
pub struct Code([Option<Digit>; DIGIT_COUNT]);

/// Byte used for a blank slot when comparing codes.
const BLANK_SLOT: u8 = 0xFF;

impl Code {
    /// Create a code from its slots (slot 0 is the most recent digit).
    #[must_use]
    pub fn new(slots: [Option<Digit>; DIGIT_COUNT]) -> Self {
        Code(slots)
    }

    /// Build a code from digits in the order they were typed.
    ///
    /// Typing `1, 2, 3, 4` yields slots `[4, 3, 2, 1]`. Only the last four
    /// digits are kept.
    ///
    /// # Errors
    /// Returns `Error::InvalidDigit` if any value is greater than 9.
    pub fn from_typed(typed: &[u8]) -> Result<Self> {
        let mut slots = [None; DIGIT_COUNT];
        for &value in typed {
            let digit = Digit::new(value)?;
            slots.copy_within(0..DIGIT_COUNT - 1, 1);
            slots[0] = Some(digit);
        }
        Ok(Code(slots))
    }

    /// Slots, most recent first.
    #[must_use]
    pub fn slots(&self) -> &[Option<Digit>; DIGIT_COUNT] {
        &self.0
    }

    /// Check if every slot holds a digit.
    pub fn is_complete(&self) -> bool {
        self.0.iter().all(Option::is_some)
    }

    fn as_bytes(&self) -> [u8; DIGIT_COUNT] {
        self.0.map(|slot| slot.map_or(BLANK_SLOT, |d| d.value()))
    }
}

/// Constant-time comparison over all slots.
impl PartialEq for Code {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes()[..].ct_eq(&other.as_bytes()[..]).into()
    }
}

/// Renders the code as typed, oldest digit on the left, `_` for blank slots.
impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for slot in self.0.iter().rev() {
            match slot {
                Some(d) => write!(f, "{d}")?,
                None => write!(f, "_")?,
            }
        }
        Ok(())
    }
}

/// Active-low 7-segment byte for one display digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentPattern(u8);

impl SegmentPattern {
    /// Wrap a raw segment byte.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        SegmentPattern(raw)
    }

    /// Segment pattern of a hex glyph (only the low nibble is used).
    #[must_use]
    pub const fn hex(value: u8) -> Self {
        SegmentPattern(HEX_SEGMENTS[(value & 0x0F) as usize])
    }

    /// Raw byte.
    #[must_use]
    pub fn raw(&self) -> u8 {
        self.0
    }

    /// Output level for segment line `segment` (bit value of the raw byte).
    pub fn level(&self, segment: u8) -> bool {
        (self.0 >> segment) & 1 == 1
    }
}

/// Segment patterns for all four digits, indexed by select line.
///
/// Slot 0 is the rightmost digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Frame(pub [SegmentPattern; DIGIT_COUNT]);

impl Frame {
    /// Pattern for digit slot `slot`.
    ///
    /// # Panics
    /// Panics if `slot` is not below [`DIGIT_COUNT`].
    #[must_use]
    pub fn slot(&self, slot: usize) -> SegmentPattern {
        self.0[slot]
    }

    /// Raw bytes of all four slots.
    #[must_use]
    pub fn raw(&self) -> [u8; DIGIT_COUNT] {
        self.0.map(|p| p.raw())
    }
}
