//! Error types for Arduino serial operations

use thiserror::Error;

/// Errors raised while finding, configuring or talking to a board
#[derive(Debug, Error)]
pub enum ArduinoError {
    /// No port matched the configured filter. Carries the full port listing.
    #[error("No Arduino found\n{ports}")]
    NoDevice { ports: String },

    /// The board did not answer before the read timeout elapsed
    #[error("No reply to '{command}' from {port}")]
    NoReply { command: String, port: String },

    #[error("Brightness must be between 0 and 255, got {0}")]
    InvalidBrightness(i64),

    #[error("Not a brightness level: '{0}'")]
    UnparsableBrightness(String),

    #[error("Unknown switch command '{0}' (expected on, off or status)")]
    UnknownSwitchCommand(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serial(#[from] serialport::Error),
}

pub type Result<T> = std::result::Result<T, ArduinoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_device_lists_ports() {
        let err = ArduinoError::NoDevice {
            ports: "/dev/ttyS0 - n/a (unknown)".to_string(),
        };
        assert_eq!(err.to_string(), "No Arduino found\n/dev/ttyS0 - n/a (unknown)");
    }
}
