//! Door actuator.
//!
//! Thin open-loop wrapper over a [`DoorDrive`]: it issues commands and
//! remembers what was issued and when. It knows nothing about movement
//! durations; the entry controller owns all timing.

use doorgate_hardware::{DoorDrive, DriveCommand, Result};
use tokio::time::Instant;
use tracing::{debug, error};

#[derive(Debug)]
pub struct DoorActuator<D> {
    drive: D,
    last_command: Option<DriveCommand>,
    issued_at: Option<Instant>,
}

impl<D: DoorDrive> DoorActuator<D> {
    pub fn new(drive: D) -> Self {
        Self {
            drive,
            last_command: None,
            issued_at: None,
        }
    }

    /// Drive towards the open position.
    pub fn open(&mut self, now: Instant) -> Result<()> {
        self.issue(DriveCommand::Open, now)
    }

    /// Drive towards the closed position.
    pub fn close(&mut self, now: Instant) -> Result<()> {
        self.issue(DriveCommand::Close, now)
    }

    /// Neutral command.
    pub fn stop(&mut self, now: Instant) -> Result<()> {
        self.issue(DriveCommand::Stop, now)
    }

    /// Issue `command` at `now`.
    ///
    /// On failure the recorded command and timestamp are left unchanged.
    pub fn issue(&mut self, command: DriveCommand, now: Instant) -> Result<()> {
        if let Err(e) = self.drive.drive(command) {
            error!(%command, error = %e, "Drive command failed");
            return Err(e);
        }
        debug!(%command, "Drive command issued");
        self.last_command = Some(command);
        self.issued_at = Some(now);
        Ok(())
    }

    pub fn last_command(&self) -> Option<DriveCommand> {
        self.last_command
    }

    /// When the last successful command was issued.
    pub fn issued_at(&self) -> Option<Instant> {
        self.issued_at
    }

    pub fn drive(&self) -> &D {
        &self.drive
    }
}
