use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Input errors
    #[error("Invalid digit: {0} (expected 0-9)")]
    InvalidDigit(u8),

    #[error("Invalid key code: {0} (expected 0-15)")]
    InvalidKeyCode(u8),

    #[error("Invalid key label: {0:?} (expected 0-9, A-D, * or #)")]
    InvalidKeyLabel(char),

    #[error("Invalid matrix position: row {row}, column {column}")]
    InvalidMatrixPosition { row: usize, column: usize },

    // Hardware errors
    #[error("Hardware operation failed: {0}")]
    Hardware(String),

    // State machine errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Timed out after {cycles} scan cycles in state {state}")]
    Timeout { cycles: u64, state: String },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
