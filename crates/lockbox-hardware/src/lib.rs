//! Line-level hardware abstraction for the lockbox panel.
//!
//! The lockbox core never touches registers directly. It drives the panel
//! through two capabilities:
//!
//! - [`LineIo`]: configure a line's direction, write an output level, read an
//!   input level. The panel has four digit/row select outputs, four keypad
//!   column inputs, seven segment outputs, the actuator output and two status
//!   LEDs (see [`LineId`]).
//! - [`Delay`]: an opaque, monotonic wait. Real deployments use
//!   [`TokioDelay`]; tests use [`mock::RecordingDelay`], which returns
//!   immediately and only records how long it was asked to wait.
//!
//! # Example
//!
//! ```
//! use lockbox_hardware::{Direction, LineId, LineIo};
//! use lockbox_hardware::mock::MockPanel;
//! use lockbox_core::KeyCode;
//!
//! let (mut panel, handle) = MockPanel::new();
//! panel.configure_direction(LineId::DigitSelect(1), Direction::Output)?;
//! panel.configure_direction(LineId::Column(3), Direction::Input)?;
//!
//! // Hold the B key (row 1, column 3) and select row 1
//! handle.press(KeyCode::UnlockSubmit);
//! panel.write_line(LineId::DigitSelect(1), true)?;
//!
//! assert!(panel.read_line(LineId::Column(3))?);
//! # Ok::<(), lockbox_hardware::HardwareError>(())
//! ```
//!
//! # Error Handling
//!
//! All line operations return [`Result<T>`][error::Result] using
//! [`HardwareError`]. The error converts into [`lockbox_core::Error`] so the
//! controller can propagate it with `?`.

pub mod delay;
pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use delay::TokioDelay;
pub use error::{HardwareError, Result};
pub use traits::{Delay, LineIo};
pub use types::{Direction, LineId};
