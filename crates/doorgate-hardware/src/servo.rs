//! Continuous-rotation servo drive.
//!
//! A continuous-rotation servo interprets the position command as speed and
//! direction: one end of the range spins one way at full speed, the other end
//! spins the other way, and the calibrated midpoint stops it. The midpoint
//! drifts between units (it is trimmed with the servo's potentiometer), so all
//! three values live in a [`ServoProfile`].

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{HardwareError, Result};
use crate::traits::DoorDrive;
use crate::types::DriveCommand;

/// Largest command a hobby servo accepts.
pub const MAX_SERVO_ANGLE: u8 = 180;

/// Raw PWM output for one servo channel.
pub trait ServoOutput: Send {
    /// Write a position command in degrees (0-180).
    fn write_angle(&mut self, degrees: u8) -> Result<()>;
}

/// Calibrated servo commands for each drive direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServoProfile {
    pub open: u8,
    pub stop: u8,
    pub close: u8,
}

impl Default for ServoProfile {
    fn default() -> Self {
        Self {
            open: 0,
            stop: 90,
            close: 180,
        }
    }
}

impl ServoProfile {
    /// Build a validated profile.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::ConfigurationError` if any angle exceeds
    /// [`MAX_SERVO_ANGLE`] or if the directions are not on opposite sides of
    /// the stop point.
    pub fn new(open: u8, stop: u8, close: u8) -> Result<Self> {
        let profile = Self { open, stop, close };
        profile.validate()?;
        Ok(profile)
    }

    /// # Errors
    /// See [`ServoProfile::new`].
    pub fn validate(&self) -> Result<()> {
        for (name, angle) in [("open", self.open), ("stop", self.stop), ("close", self.close)] {
            if angle > MAX_SERVO_ANGLE {
                return Err(HardwareError::configuration(format!(
                    "Servo {name} angle {angle} exceeds {MAX_SERVO_ANGLE}"
                )));
            }
        }

        let opposite = (self.open < self.stop && self.stop < self.close)
            || (self.close < self.stop && self.stop < self.open);
        if !opposite {
            return Err(HardwareError::configuration(format!(
                "Servo open ({}) and close ({}) must lie on opposite sides of stop ({})",
                self.open, self.close, self.stop
            )));
        }
        Ok(())
    }

    /// Servo command for a drive command.
    pub fn angle_for(&self, command: DriveCommand) -> u8 {
        match command {
            DriveCommand::Open => self.open,
            DriveCommand::Close => self.close,
            DriveCommand::Stop => self.stop,
        }
    }
}

/// [`DoorDrive`] backed by a continuous-rotation servo.
#[derive(Debug)]
pub struct ServoDrive<S> {
    output: S,
    profile: ServoProfile,
}

impl<S: ServoOutput> ServoDrive<S> {
    /// Wrap `output` with a validated profile.
    ///
    /// # Errors
    /// Returns `HardwareError::ConfigurationError` for an invalid profile.
    pub fn new(output: S, profile: ServoProfile) -> Result<Self> {
        profile.validate()?;
        Ok(Self { output, profile })
    }

    pub fn profile(&self) -> &ServoProfile {
        &self.profile
    }

    pub fn output(&self) -> &S {
        &self.output
    }
}

impl<S: ServoOutput> DoorDrive for ServoDrive<S> {
    fn drive(&mut self, command: DriveCommand) -> Result<()> {
        let angle = self.profile.angle_for(command);
        debug!(%command, angle, "Writing servo command");
        self.output.write_angle(angle).map_err(|e| {
            error!(%command, angle, error = %e, "Servo write failed");
            HardwareError::drive(format!("servo {command} ({angle}): {e}"))
        })
    }
}
