//! Mock keypad/display panel for testing and development.
//!
//! This module provides a simulated panel that behaves like the physical
//! matrix: a held key connects its row select line to its column input, and
//! segment writes are latched into whichever digit is currently selected.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lockbox_core::KeyCode;
use lockbox_core::constants::{DIGIT_COUNT, SEGMENT_LINES};

use crate::{
    HardwareError, Result,
    traits::LineIo,
    types::{Direction, LineId},
};

/// Shared state between the panel and its handle.
#[derive(Debug)]
struct PanelState {
    directions: HashMap<LineId, Direction>,
    outputs: HashMap<LineId, bool>,
    pressed: Option<(usize, usize)>,
    digits: [u8; DIGIT_COUNT],
    actuator_activations: u32,
    fault: Option<String>,
    line_fault: Option<(LineId, String)>,
}

impl PanelState {
    fn new() -> Self {
        Self {
            directions: HashMap::new(),
            outputs: HashMap::new(),
            pressed: None,
            digits: [0; DIGIT_COUNT],
            actuator_activations: 0,
            fault: None,
            line_fault: None,
        }
    }

    fn level(&self, line: LineId) -> bool {
        self.outputs.get(&line).copied().unwrap_or(false)
    }

    fn check(&mut self, line: LineId, expected: Direction) -> Result<()> {
        if let Some(message) = self.fault.take() {
            return Err(HardwareError::communication(message));
        }
        if self.line_fault.as_ref().is_some_and(|(faulty, _)| *faulty == line) {
            if let Some((_, message)) = self.line_fault.take() {
                return Err(HardwareError::communication(message));
            }
        }
        if !line.is_valid() {
            return Err(HardwareError::unknown_line(line));
        }
        match self.directions.get(&line) {
            None => Err(HardwareError::not_configured(line)),
            Some(&actual) if actual != expected => Err(HardwareError::direction_mismatch(
                line, expected, actual,
            )),
            Some(_) => Ok(()),
        }
    }
}

fn lock(state: &Mutex<PanelState>) -> MutexGuard<'_, PanelState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock panel device for testing and development.
///
/// Tests and applications hold a [`MockPanelHandle`] to press keys and to
/// observe the display, the actuator and the indicator LEDs while the panel
/// itself is owned by the controller.
///
/// # Examples
///
/// ```
/// use lockbox_core::KeyCode;
/// use lockbox_hardware::mock::MockPanel;
/// use lockbox_hardware::{Direction, LineId, LineIo};
///
/// let (mut panel, handle) = MockPanel::new();
/// for line in LineId::all() {
///     panel.configure_direction(line, line.direction()).unwrap();
/// }
///
/// handle.press(KeyCode::Submit);
/// panel.write_line(LineId::DigitSelect(0), true).unwrap();
/// assert!(panel.read_line(LineId::Column(3)).unwrap());
///
/// handle.release();
/// assert!(!panel.read_line(LineId::Column(3)).unwrap());
/// ```
#[derive(Debug)]
pub struct MockPanel {
    state: Arc<Mutex<PanelState>>,
}

impl MockPanel {
    /// Create a new mock panel.
    ///
    /// Returns a tuple of (MockPanel, MockPanelHandle) where the handle can
    /// be used to simulate key presses and inspect outputs.
    pub fn new() -> (Self, MockPanelHandle) {
        let state = Arc::new(Mutex::new(PanelState::new()));
        let handle = MockPanelHandle {
            state: Arc::clone(&state),
        };
        (Self { state }, handle)
    }
}

impl LineIo for MockPanel {
    fn configure_direction(&mut self, line: LineId, direction: Direction) -> Result<()> {
        if !line.is_valid() {
            return Err(HardwareError::unknown_line(line));
        }
        lock(&self.state).directions.insert(line, direction);
        Ok(())
    }

    fn write_line(&mut self, line: LineId, level: bool) -> Result<()> {
        let mut state = lock(&self.state);
        state.check(line, Direction::Output)?;

        match line {
            LineId::Segment(segment) => {
                let bit = 1u8 << segment;
                for digit in 0..DIGIT_COUNT {
                    if state.level(LineId::DigitSelect(digit as u8)) {
                        if level {
                            state.digits[digit] |= bit;
                        } else {
                            state.digits[digit] &= !bit;
                        }
                    }
                }
            }
            LineId::Actuator if level && !state.level(line) => {
                state.actuator_activations += 1;
            }
            _ => {}
        }

        state.outputs.insert(line, level);
        Ok(())
    }

    fn read_line(&mut self, line: LineId) -> Result<bool> {
        let mut state = lock(&self.state);
        state.check(line, Direction::Input)?;

        let LineId::Column(column) = line else {
            return Ok(false);
        };

        Ok(match state.pressed {
            Some((row, pressed_column)) => {
                pressed_column == usize::from(column)
                    && state.level(LineId::DigitSelect(row as u8))
            }
            None => false,
        })
    }
}

/// Handle for controlling and observing a mock panel.
///
/// The handle can be cloned and shared across tasks.
#[derive(Debug, Clone)]
pub struct MockPanelHandle {
    state: Arc<Mutex<PanelState>>,
}

impl MockPanelHandle {
    /// Hold a key down until [`release`](Self::release) is called.
    ///
    /// Pressing another key replaces the held key.
    pub fn press(&self, key: KeyCode) {
        lock(&self.state).pressed = Some(key.position());
    }

    /// Release any held key.
    pub fn release(&self) {
        lock(&self.state).pressed = None;
    }

    /// Key currently held, if any.
    pub fn pressed(&self) -> Option<KeyCode> {
        let (row, column) = lock(&self.state).pressed?;
        KeyCode::from_position(row, column).ok()
    }

    /// Make the next line operation fail with a communication error.
    pub fn inject_fault(&self, message: impl Into<String>) {
        lock(&self.state).fault = Some(message.into());
    }

    /// Make the next operation on `line` fail with a communication error.
    pub fn inject_line_fault(&self, line: LineId, message: impl Into<String>) {
        lock(&self.state).line_fault = Some((line, message.into()));
    }

    /// Segment levels latched for each digit (bits 0-6, slot 0 rightmost).
    pub fn display(&self) -> [u8; DIGIT_COUNT] {
        let mask = (1u8 << SEGMENT_LINES) - 1;
        lock(&self.state).digits.map(|bits| bits & mask)
    }

    /// Current level of an output line.
    pub fn output(&self, line: LineId) -> bool {
        lock(&self.state).level(line)
    }

    /// Configured direction of a line.
    pub fn direction(&self, line: LineId) -> Option<Direction> {
        lock(&self.state).directions.get(&line).copied()
    }

    /// Check if the lock release solenoid is asserted.
    pub fn is_actuator_asserted(&self) -> bool {
        self.output(LineId::Actuator)
    }

    /// Number of times the actuator went from deasserted to asserted.
    pub fn actuator_activations(&self) -> u32 {
        lock(&self.state).actuator_activations
    }

    /// Check if the ready indicator is lit.
    pub fn is_ready_led_on(&self) -> bool {
        self.output(LineId::ReadyLed)
    }

    /// Check if the locked indicator is lit.
    pub fn is_locked_led_on(&self) -> bool {
        self.output(LineId::LockedLed)
    }

    /// Number of select lines currently asserted.
    pub fn asserted_selects(&self) -> usize {
        let state = lock(&self.state);
        (0..DIGIT_COUNT as u8)
            .filter(|&n| state.level(LineId::DigitSelect(n)))
            .count()
    }
}
