//! Entry controller.
//!
//! Owns the door state, its deadlines and the button debouncer, and turns
//! input events into actuator commands:
//!
//! | State   | Event                                  | Action          | Next    |
//! |---------|----------------------------------------|-----------------|---------|
//! | Closed  | granted credential / accepted press    | `open()`        | Opening |
//! | Opening | movement time elapsed                  | `stop()`        | Open    |
//! | Open    | open time elapsed since reaching Open  | `close()`       | Closing |
//! | Closing | movement time elapsed                  | `stop()`        | Closed  |
//!
//! Events arriving in any state other than `Closed` are ignored: they never
//! restart or extend a deadline and never trigger a second `open()`. A denied
//! credential causes no transition at all.
//!
//! Time never flows implicitly. Every operation takes `now`, and deadlines
//! are only acted upon inside [`EntryController::tick`].
//!
//! If the drive rejects a command the state is left as it was and the
//! deadline stays armed, so the next `tick` retries the same command.

use std::collections::VecDeque;

use doorgate_core::AuthorizationResult;
use doorgate_core::config::DoorTiming;
use doorgate_hardware::{DoorDrive, DriveCommand, PinLevel};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::actuator::DoorActuator;
use crate::debounce::{ButtonEdge, Debouncer};
use crate::door::{Direction, DoorState, DoorStateMachine, StateTransition};
use crate::error::Result;

pub struct EntryController<D> {
    actuator: DoorActuator<D>,
    machine: DoorStateMachine,
    debouncer: Debouncer,
    timing: DoorTiming,
    deadline: Option<Instant>,
}

impl<D: DoorDrive> EntryController<D> {
    /// Create a controller for a closed door.
    ///
    /// A neutral command is issued first so the drive starts stopped.
    ///
    /// # Errors
    /// Returns `ControllerError::Hardware` if the drive rejects it.
    pub fn new(drive: D, timing: DoorTiming, now: Instant) -> Result<Self> {
        let mut actuator = DoorActuator::new(drive);
        actuator.stop(now)?;

        Ok(Self {
            actuator,
            machine: DoorStateMachine::new(now),
            debouncer: Debouncer::new(timing.debounce, now),
            timing,
            deadline: None,
        })
    }

    pub fn state(&self) -> DoorState {
        self.machine.state()
    }

    pub fn timing(&self) -> &DoorTiming {
        &self.timing
    }

    /// Next armed deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn history(&self) -> &VecDeque<StateTransition> {
        self.machine.history()
    }

    pub fn actuator(&self) -> &DoorActuator<D> {
        &self.actuator
    }

    /// `true` when the reader may be polled.
    ///
    /// While the door moves the reader is left alone so an exchange cannot
    /// hold the drive past its stop deadline.
    pub fn reader_enabled(&self) -> bool {
        !self.state().is_moving()
    }

    /// Feed one raw button sample.
    ///
    /// An accepted press opens a closed door; everything else is absorbed.
    pub fn sample_button(&mut self, level: PinLevel, now: Instant) -> Result<Option<StateTransition>> {
        match self.debouncer.sample(level, now) {
            Some(ButtonEdge::Pressed) => {
                if self.state() == DoorState::Closed {
                    info!("Button pressed");
                    self.begin_opening(now).map(Some)
                } else {
                    debug!(state = %self.state(), "Button press ignored");
                    Ok(None)
                }
            }
            Some(ButtonEdge::Released) => {
                debug!("Button released");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Act on a completed authorization exchange.
    pub fn apply_authorization(
        &mut self,
        result: &AuthorizationResult,
        now: Instant,
    ) -> Result<Option<StateTransition>> {
        if !result.granted {
            debug!("Credential denied, door unchanged");
            return Ok(None);
        }
        if self.state() != DoorState::Closed {
            info!(state = %self.state(), "Credential granted while door not closed, ignoring");
            return Ok(None);
        }
        self.begin_opening(now).map(Some)
    }

    /// Service the armed deadline.
    ///
    /// At most one transition happens per call.
    pub fn tick(&mut self, now: Instant) -> Result<Option<StateTransition>> {
        let Some(deadline) = self.deadline else {
            return Ok(None);
        };
        if now < deadline {
            return Ok(None);
        }

        let transition = match self.state() {
            DoorState::Moving(Direction::Opening) => {
                let transition = self.advance(DriveCommand::Stop, DoorState::Open, now)?;
                self.deadline = Some(now + self.timing.open);
                transition
            }
            DoorState::Open => {
                let transition =
                    self.advance(DriveCommand::Close, DoorState::Moving(Direction::Closing), now)?;
                self.deadline = Some(now + self.timing.movement);
                transition
            }
            DoorState::Moving(Direction::Closing) => {
                let transition = self.advance(DriveCommand::Stop, DoorState::Closed, now)?;
                self.deadline = None;
                transition
            }
            DoorState::Closed => {
                self.deadline = None;
                return Ok(None);
            }
        };

        Ok(Some(transition))
    }

    /// Stop the drive if the door is moving. Used at shutdown.
    pub fn halt(&mut self, now: Instant) -> Result<()> {
        if self.state().is_moving() {
            info!(state = %self.state(), "Halting drive");
            self.actuator.stop(now)?;
        }
        Ok(())
    }

    fn begin_opening(&mut self, now: Instant) -> Result<StateTransition> {
        let transition =
            self.advance(DriveCommand::Open, DoorState::Moving(Direction::Opening), now)?;
        self.deadline = Some(now + self.timing.movement);
        Ok(transition)
    }

    /// Validate, command, then record.
    fn advance(
        &mut self,
        command: DriveCommand,
        next: DoorState,
        now: Instant,
    ) -> Result<StateTransition> {
        let current = self.state();
        if !current.can_transition_to(&next) {
            return Err(doorgate_core::Error::InvalidStateTransition {
                from: current.to_string(),
                to: next.to_string(),
            }
            .into());
        }

        self.actuator.issue(command, now)?;
        let transition = self.machine.transition_to(next, now)?;
        info!(from = %transition.from, to = %transition.to, "Door transition");
        Ok(transition)
    }
}

impl<D> std::fmt::Debug for EntryController<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryController")
            .field("state", &self.machine.state())
            .field("deadline", &self.deadline)
            .field("timing", &self.timing)
            .finish_non_exhaustive()
    }
}
