// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the scanner

use std::fmt;

/// Result type alias using ScanError
pub type ScanResult<T> = Result<T, ScanError>;

/// Error type shared by the decoder capability and the config layer
///
/// Nothing in this enum crosses the controller boundary as an error value:
/// the controller flattens every failure into a logged side effect or a
/// piece of observable state.
#[derive(Debug, Clone)]
pub enum ScanError {
    /// Device enumeration failed as a whole
    Enumeration(String),
    /// The requested capture device does not exist or cannot be opened
    DeviceNotFound(String),
    /// The device offers no pixel format the decoder can read
    FormatNotSupported(String),
    /// Frame capture or format negotiation failed
    Capture(String),
    /// Configuration could not be parsed
    Config(String),
    /// General I/O error
    Io(String),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::Enumeration(msg) => write!(f, "Device enumeration failed: {}", msg),
            ScanError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            ScanError::FormatNotSupported(msg) => write!(f, "Format not supported: {}", msg),
            ScanError::Capture(msg) => write!(f, "Capture failed: {}", msg),
            ScanError::Config(msg) => write!(f, "Configuration error: {}", msg),
            ScanError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for ScanError {}

impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        ScanError::Io(err.to_string())
    }
}
