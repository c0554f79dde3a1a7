//! Mock door drive that records every command.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::time::Instant;

use crate::error::{HardwareError, Result};
use crate::traits::DoorDrive;
use crate::types::DriveCommand;

#[derive(Debug, Default)]
struct DriveState {
    commands: Vec<(Instant, DriveCommand)>,
    fail_remaining: usize,
}

/// Recording drive.
///
/// Clones share the same log, so a test can keep one clone while the
/// controller owns another.
#[derive(Debug, Clone, Default)]
pub struct MockDrive {
    state: Arc<Mutex<DriveState>>,
}

impl MockDrive {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, DriveState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Reject the next `count` commands.
    pub fn fail_next(&self, count: usize) {
        self.state().fail_remaining = count;
    }

    /// Accepted commands in order.
    pub fn commands(&self) -> Vec<DriveCommand> {
        self.state().commands.iter().map(|(_, c)| *c).collect()
    }

    /// Accepted commands with the instant they were applied.
    pub fn timeline(&self) -> Vec<(Instant, DriveCommand)> {
        self.state().commands.clone()
    }

    pub fn last_command(&self) -> Option<DriveCommand> {
        self.state().commands.last().map(|(_, c)| *c)
    }

    /// Number of times `command` was accepted.
    pub fn count(&self, command: DriveCommand) -> usize {
        self.state().commands.iter().filter(|(_, c)| *c == command).count()
    }
}

impl DoorDrive for MockDrive {
    fn drive(&mut self, command: DriveCommand) -> Result<()> {
        let mut state = self.state();
        if state.fail_remaining > 0 {
            state.fail_remaining -= 1;
            return Err(HardwareError::drive(format!("injected failure on {command}")));
        }
        state.commands.push((Instant::now(), command));
        Ok(())
    }
}
