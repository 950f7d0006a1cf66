//! # Error Types
//!
//! Custom error types for joystick-vref using `thiserror`.
//!
//! The velocity reference filter itself is infallible; these errors only come
//! from the surrounding stack (configuration, gamepad access, telemetry files).

use thiserror::Error;

/// Main error type for joystick-vref
#[derive(Debug, Error)]
pub enum VrefError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Gamepad access errors
    #[error("Controller error: {0}")]
    Controller(String),

    /// No usable gamepad found on the system
    #[error("No gamepad found (looked for a device exposing BTN_SOUTH and ABS_X)")]
    ControllerNotFound,

    /// Telemetry serialization errors
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for joystick-vref
pub type Result<T> = std::result::Result<T, VrefError>;
