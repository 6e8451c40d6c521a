//! Line identifiers and directions for the lockbox panel.

use std::fmt;

use lockbox_core::constants::{DIGIT_COUNT, KEYPAD_COLUMNS, SEGMENT_LINES};
use serde::{Deserialize, Serialize};

/// Direction of a panel line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Line is sampled by the controller.
    Input,
    /// Line is driven by the controller.
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// Logical identifier of a panel line.
///
/// Mapping a `LineId` to a physical port and bit is the job of the
/// [`LineIo`](crate::LineIo) implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineId {
    /// Shared select line for display digit `n` and keypad row `n` (0-3).
    DigitSelect(u8),
    /// Keypad column input `n` (0-3).
    Column(u8),
    /// Segment output `n` (0-6, segments a-g).
    Segment(u8),
    /// Lock release solenoid.
    Actuator,
    /// Indicator lit while a new PIN is being accepted.
    ReadyLed,
    /// Indicator lit while the box is locked.
    LockedLed,
}

impl LineId {
    /// Check if the line index is inside the panel layout.
    pub fn is_valid(&self) -> bool {
        match *self {
            Self::DigitSelect(n) => usize::from(n) < DIGIT_COUNT,
            Self::Column(n) => usize::from(n) < KEYPAD_COLUMNS,
            Self::Segment(n) => n < SEGMENT_LINES,
            Self::Actuator | Self::ReadyLed | Self::LockedLed => true,
        }
    }

    /// Direction this line must be configured with.
    pub fn direction(&self) -> Direction {
        match self {
            Self::Column(_) => Direction::Input,
            _ => Direction::Output,
        }
    }

    /// Every line of the panel, outputs first.
    pub fn all() -> impl Iterator<Item = LineId> {
        let selects = (0..DIGIT_COUNT as u8).map(Self::DigitSelect);
        let segments = (0..SEGMENT_LINES).map(Self::Segment);
        let indicators = [Self::Actuator, Self::ReadyLed, Self::LockedLed];
        let columns = (0..KEYPAD_COLUMNS as u8).map(Self::Column);

        selects.chain(segments).chain(indicators).chain(columns)
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DigitSelect(n) => write!(f, "digit select {n}"),
            Self::Column(n) => write!(f, "column {n}"),
            Self::Segment(n) => write!(f, "segment {n}"),
            Self::Actuator => write!(f, "actuator"),
            Self::ReadyLed => write!(f, "ready LED"),
            Self::LockedLed => write!(f, "locked LED"),
        }
    }
}
