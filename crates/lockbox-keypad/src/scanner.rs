//! Display/keypad multiplexing scanner.
//!
//! The panel has four select lines. Asserting select line `n` lights display
//! digit `n` and connects keypad row `n` to the column inputs, so one scan
//! cycle both refreshes the display and samples every key:
//!
//! ```text
//! for row in 0..4:
//!     assert select[row] (all other selects deasserted)
//!     sample columns 0..3       -> first asserted column wins
//!     write frame[row] to the segment lines
//!     wait(settle)
//! ```
//!
//! Because both jobs share the select lines, the key-scan rate and the
//! display refresh rate are the same number: changing the settle delay
//! changes both.

use std::time::Duration;

use lockbox_core::constants::{DIGIT_COUNT, KEYPAD_COLUMNS, SEGMENT_LINES};
use lockbox_core::{Frame, KeyCode, Result, SegmentPattern};
use lockbox_hardware::{Delay, Direction, LineId, LineIo};
use tracing::trace;

/// Result of one full scan cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanReport {
    /// First key found in row order, if any.
    pub key: Option<KeyCode>,

    /// Sequence number of this cycle (starting at 1).
    pub cycle: u64,

    /// Time spent waiting during this cycle.
    pub elapsed: Duration,
}

/// Multiplexing scanner for the shared display/keypad select lines.
#[derive(Debug, Clone)]
pub struct Scanner {
    settle: Duration,
    cycles: u64,
}

impl Scanner {
    /// Create a scanner that waits `settle` after driving each digit.
    pub fn new(settle: Duration) -> Self {
        Self { settle, cycles: 0 }
    }

    /// Configure every panel line with its direction.
    ///
    /// Outputs are left deasserted.
    ///
    /// # Errors
    ///
    /// Returns an error if the line driver rejects any line.
    pub fn configure<L: LineIo>(io: &mut L) -> Result<()> {
        for line in LineId::all() {
            let direction = line.direction();
            io.configure_direction(line, direction)?;
            if direction == Direction::Output {
                io.write_line(line, false)?;
            }
        }
        Ok(())
    }

    /// Number of completed scan cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Settle delay per digit.
    pub fn settle(&self) -> Duration {
        self.settle
    }

    /// Duration of one full cycle, saturating at `Duration::MAX`.
    pub fn period(&self) -> Duration {
        self.settle.saturating_mul(DIGIT_COUNT as u32)
    }

    /// Run one scan cycle, showing `frame` and sampling the keypad.
    ///
    /// The key is sampled exactly once per row. The first row (in scan
    /// order) with an asserted column determines the reported key; columns
    /// are prioritised 0 to 3 within a row.
    ///
    /// # Errors
    ///
    /// Returns an error if a line operation fails. The cycle is abandoned at
    /// the failing line and not counted.
    pub async fn scan<L: LineIo, D: Delay>(
        &mut self,
        io: &mut L,
        delay: &mut D,
        frame: &Frame,
    ) -> Result<ScanReport> {
        let mut key: Option<KeyCode> = None;

        for row in 0..DIGIT_COUNT {
            select(io, row)?;

            let column = first_asserted_column(io)?;
            if let (None, Some(column)) = (key, column) {
                key = Some(KeyCode::from_position(row, column)?);
            }

            write_segments(io, frame.slot(row))?;
            delay.wait(self.settle).await;
        }

        self.cycles += 1;
        trace!(cycle = self.cycles, key = ?key, "scan cycle complete");

        Ok(ScanReport {
            key,
            cycle: self.cycles,
            elapsed: self.period(),
        })
    }
}

/// Assert select line `row`, deasserting the others first.
fn select<L: LineIo>(io: &mut L, row: usize) -> Result<()> {
    for other in (0..DIGIT_COUNT).filter(|&n| n != row) {
        io.write_line(LineId::DigitSelect(other as u8), false)?;
    }
    io.write_line(LineId::DigitSelect(row as u8), true)?;
    Ok(())
}

fn first_asserted_column<L: LineIo>(io: &mut L) -> Result<Option<usize>> {
    for column in 0..KEYPAD_COLUMNS {
        if io.read_line(LineId::Column(column as u8))? {
            return Ok(Some(column));
        }
    }
    Ok(None)
}

fn write_segments<L: LineIo>(io: &mut L, pattern: SegmentPattern) -> Result<()> {
    for segment in 0..SEGMENT_LINES {
        io.write_line(LineId::Segment(segment), pattern.level(segment))?;
    }
    Ok(())
}
