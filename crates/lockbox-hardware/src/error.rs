//! Error types for line-level hardware operations.
//!
//! This module defines the errors the panel capability can report: unknown
//! lines, lines used against their configured direction, and failures of
//! the underlying port driver.

use crate::types::{Direction, LineId};

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during line operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Line index is outside the panel layout.
    #[error("Unknown line: {line}")]
    UnknownLine { line: LineId },

    /// Line was used before its direction was configured.
    #[error("Line {line} has not been configured")]
    NotConfigured { line: LineId },

    /// Line was read or written against its configured direction.
    #[error("Line {line} is configured as {actual}, expected {expected}")]
    DirectionMismatch {
        line: LineId,
        expected: Direction,
        actual: Direction,
    },

    /// Port driver communication error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },
}

impl HardwareError {
    /// Create a new unknown line error.
    pub fn unknown_line(line: LineId) -> Self {
        Self::UnknownLine { line }
    }

    /// Create a new not configured error.
    pub fn not_configured(line: LineId) -> Self {
        Self::NotConfigured { line }
    }

    /// Create a new direction mismatch error.
    pub fn direction_mismatch(line: LineId, expected: Direction, actual: Direction) -> Self {
        Self::DirectionMismatch {
            line,
            expected,
            actual,
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }
}

impl From<HardwareError> for lockbox_core::Error {
    fn from(error: HardwareError) -> Self {
        lockbox_core::Error::Hardware(error.to_string())
    }
}
