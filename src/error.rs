//! # Error Types
//!
//! Custom error types for Gamepad Link using `thiserror`.

use thiserror::Error;

/// Main error type for Gamepad Link
#[derive(Debug, Error)]
pub enum GamepadLinkError {
    /// Malformed or unsynchronised wire frame
    #[error("Frame error: {0}")]
    Frame(String),

    /// Frame carried an axis id the active profile does not know
    #[error("Unknown axis id: {0}")]
    UnknownAxis(u8),

    /// Button frames must carry 0 or 1
    #[error("Invalid value {value} for button axis {axis}")]
    InvalidButtonValue { axis: u8, value: i16 },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Serial port errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// No serial device could be opened
    #[error("No serial device found (tried: {0})")]
    SerialPortNotFound(String),

    /// Digital/analog/selector capability failures
    #[error("Hardware error: {0}")]
    Hardware(String),

    /// Queue or task could not be created before the pipeline started
    #[error("Startup error: {0}")]
    Startup(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Gamepad Link
pub type Result<T> = std::result::Result<T, GamepadLinkError>;
