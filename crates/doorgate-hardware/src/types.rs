//! Common types shared across the door peripherals.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logic level of a digital input pin.
///
/// The override button is wired active-low: `Low` means pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinLevel {
    High,
    Low,
}

impl PinLevel {
    /// `true` if the active-low input is asserted.
    pub fn is_pressed(self) -> bool {
        self == Self::Low
    }
}

/// Command sent to the door drive.
///
/// The drive is open-loop: `Open` and `Close` run the motor in one direction
/// until `Stop` is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DriveCommand {
    Open,
    Close,
    Stop,
}

impl fmt::Display for DriveCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::Stop => "stop",
        };
        f.write_str(name)
    }
}

/// LED colors available on the status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedColor {
    /// LED off.
    Off,

    /// Red LED.
    Red,

    /// Green LED.
    Green,
}

/// User-facing feedback event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackSignal {
    /// Access granted, optionally with the server's feedback text.
    Granted { message: Option<String> },

    /// Access denied, for any reason.
    Denied,

    /// The door started closing.
    Closing,
}

impl FeedbackSignal {
    pub fn granted() -> Self {
        Self::Granted { message: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_level_active_low() {
        assert!(PinLevel::Low.is_pressed());
        assert!(!PinLevel::High.is_pressed());
    }

    #[test]
    fn test_drive_command_display() {
        assert_eq!(DriveCommand::Open.to_string(), "open");
        assert_eq!(DriveCommand::Close.to_string(), "close");
        assert_eq!(DriveCommand::Stop.to_string(), "stop");
    }

    #[test]
    fn test_led_color_serialization() {
        let color = LedColor::Green;
        let json = serde_json::to_string(&color).unwrap();
        let deserialized: LedColor = serde_json::from_str(&json).unwrap();
        assert_eq!(color, deserialized);
    }
}
