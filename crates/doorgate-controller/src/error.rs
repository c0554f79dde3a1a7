//! Error types for the entry controller.

use doorgate_hardware::HardwareError;

/// Result type alias for controller operations.
pub type Result<T> = std::result::Result<T, ControllerError>;

/// Errors raised while driving the door.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// A peripheral rejected a command or could not be read.
    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),

    /// A state rule was violated.
    #[error(transparent)]
    Core(#[from] doorgate_core::Error),
}

impl ControllerError {
    /// `true` if the failure came from a peripheral.
    pub fn is_hardware(&self) -> bool {
        matches!(self, Self::Hardware(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hardware_error_wraps() {
        let error: ControllerError = HardwareError::drive("stalled").into();
        assert!(error.is_hardware());
        assert_eq!(error.to_string(), "Hardware error: Drive error: stalled");
    }

    #[test]
    fn test_core_error_is_transparent() {
        let error: ControllerError = doorgate_core::Error::InvalidStateTransition {
            from: "Closed".to_string(),
            to: "Open".to_string(),
        }
        .into();
        assert!(!error.is_hardware());
        assert_eq!(error.to_string(), "Invalid state transition from Closed to Open");
    }
}
