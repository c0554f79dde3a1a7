//! Outputs that only log, for running the controller without hardware.

use std::time::Duration;

use tracing::info;

use crate::error::Result;
use crate::servo::ServoOutput;
use crate::traits::Indicator;
use crate::types::LedColor;

/// Servo channel that logs each position command.
#[derive(Debug, Default)]
pub struct LoggingServo {
    angle: Option<u8>,
}

impl LoggingServo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last angle written.
    pub fn angle(&self) -> Option<u8> {
        self.angle
    }
}

impl ServoOutput for LoggingServo {
    fn write_angle(&mut self, degrees: u8) -> Result<()> {
        info!(degrees, "servo");
        self.angle = Some(degrees);
        Ok(())
    }
}

/// Indicator that logs LED and buzzer actions.
#[derive(Debug, Default)]
pub struct LoggingIndicator;

impl Indicator for LoggingIndicator {
    async fn set_led(&mut self, color: LedColor) -> Result<()> {
        info!(?color, "led");
        Ok(())
    }

    async fn tone(&mut self, frequency_hz: u32, duration: Duration) -> Result<()> {
        info!(frequency_hz, ?duration, "buzzer");
        Ok(())
    }
}
