//! Error types for hardware operations.
//!
//! This module defines error types for the door peripherals: the credential
//! reader, the override button, the drive output and the feedback indicator.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware device operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Device communication error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Invalid data received from device.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Device configuration error.
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    /// Credential read error.
    #[error("Credential read error: {message}")]
    CredentialReadError { message: String },

    /// Drive output rejected a command.
    #[error("Drive error: {message}")]
    DriveError { message: String },
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    /// Create a new credential read error.
    pub fn credential_read(message: impl Into<String>) -> Self {
        Self::CredentialReadError {
            message: message.into(),
        }
    }

    /// Create a new drive error.
    pub fn drive(message: impl Into<String>) -> Self {
        Self::DriveError {
            message: message.into(),
        }
    }
}

impl From<doorgate_core::Error> for HardwareError {
    fn from(error: doorgate_core::Error) -> Self {
        Self::invalid_data(error.to_string())
    }
}
