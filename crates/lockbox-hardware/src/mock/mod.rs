//! Mock hardware implementations for testing and development.
//!
//! This module provides simulated hardware that can be driven
//! programmatically without a physical panel.

pub mod delay;
pub mod panel;

pub use delay::RecordingDelay;
pub use panel::{MockPanel, MockPanelHandle};
