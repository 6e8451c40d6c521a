//! Capability traits consumed by the lockbox core.
//!
//! The core depends only on these two traits, so the same scanner and
//! controller run against real port drivers, the [`mock`](crate::mock)
//! panel, or anything else that can toggle a line and wait.
//!
//! [`Delay`] uses native `async fn` (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use std::time::Duration;

use crate::error::Result;
use crate::types::{Direction, LineId};

/// Line-level access to the panel.
///
/// Line operations map to single register accesses on the target hardware,
/// so they are synchronous. Levels are logical: `true` means asserted.
///
/// # Examples
///
/// ```no_run
/// use lockbox_hardware::{Direction, LineId, LineIo, Result};
///
/// fn pulse_actuator<L: LineIo>(io: &mut L) -> Result<()> {
///     io.configure_direction(LineId::Actuator, Direction::Output)?;
///     io.write_line(LineId::Actuator, true)?;
///     io.write_line(LineId::Actuator, false)
/// }
/// ```
pub trait LineIo: Send {
    /// Configure a line as input or output.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The line is not part of the panel layout
    /// - The port driver rejects the configuration
    fn configure_direction(&mut self, line: LineId, direction: Direction) -> Result<()>;

    /// Drive an output line to the given level.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The line is unknown or not configured as an output
    /// - The port driver fails
    fn write_line(&mut self, line: LineId, level: bool) -> Result<()>;

    /// Sample an input line.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The line is unknown or not configured as an input
    /// - The port driver fails
    fn read_line(&mut self, line: LineId) -> Result<bool>;
}

/// Monotonic delay primitive.
///
/// Every suspension of the control loop goes through this trait. Waits are
/// never cancelled; callers account for the requested duration as elapsed
/// scan time.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use lockbox_hardware::Delay;
///
/// async fn settle<D: Delay>(delay: &mut D) {
///     delay.wait(Duration::from_micros(250)).await;
/// }
/// ```
pub trait Delay: Send {
    /// Suspend the control flow for `duration`.
    async fn wait(&mut self, duration: Duration);
}
