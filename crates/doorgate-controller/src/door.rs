//! Door state machine.
//!
//! The door cycles strictly through four states:
//!
//! ```text
//! Closed ──open()──> Opening ──stop()──> Open ──close()──> Closing ──stop()──> Closed
//! ```
//!
//! There is no shortcut: a closing door cannot be reopened and an open door
//! cannot be opened again. Transitions are validated by
//! [`DoorState::can_transition_to`] and recorded in a bounded history for
//! diagnostics.
//!
//! # Examples
//!
//! ```
//! use doorgate_controller::{Direction, DoorState, DoorStateMachine};
//! use tokio::time::Instant;
//!
//! let now = Instant::now();
//! let mut machine = DoorStateMachine::new(now);
//! assert_eq!(machine.state(), DoorState::Closed);
//!
//! machine.transition_to(DoorState::Moving(Direction::Opening), now).unwrap();
//! assert!(machine.transition_to(DoorState::Closed, now).is_err());
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use doorgate_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Maximum number of transitions kept in history.
///
/// One door cycle is four transitions, so this covers the last 16 cycles.
pub const MAX_HISTORY_SIZE: usize = 64;

/// Direction of a moving door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Opening,
    Closing,
}

/// Physical state of the door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorState {
    /// At rest in the closed position.
    Closed,

    /// Drive running towards an end position.
    Moving(Direction),

    /// At rest in the open position, auto-close armed.
    Open,
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            DoorState::Closed => "Closed",
            DoorState::Moving(Direction::Opening) => "Opening",
            DoorState::Open => "Open",
            DoorState::Moving(Direction::Closing) => "Closing",
        };
        write!(f, "{}", state_str)
    }
}

impl DoorState {
    /// Check if transition to `target` is valid from this state.
    ///
    /// ```
    /// use doorgate_controller::{Direction, DoorState};
    ///
    /// assert!(DoorState::Closed.can_transition_to(&DoorState::Moving(Direction::Opening)));
    /// assert!(!DoorState::Closed.can_transition_to(&DoorState::Open));
    /// ```
    pub fn can_transition_to(&self, target: &DoorState) -> bool {
        matches!(
            (self, target),
            (DoorState::Closed, DoorState::Moving(Direction::Opening))
                | (DoorState::Moving(Direction::Opening), DoorState::Open)
                | (DoorState::Open, DoorState::Moving(Direction::Closing))
                | (DoorState::Moving(Direction::Closing), DoorState::Closed)
        )
    }

    pub fn is_moving(&self) -> bool {
        matches!(self, DoorState::Moving(_))
    }
}

/// A single state transition with timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    /// The state transitioned from.
    pub from: DoorState,

    /// The state transitioned to.
    pub to: DoorState,

    /// When the transition occurred.
    pub at: Instant,
}

impl StateTransition {
    pub fn new(from: DoorState, to: DoorState, at: Instant) -> Self {
        Self { from, to, at }
    }
}

/// Validated door state with transition history.
///
/// All methods take the current instant explicitly; the machine never reads
/// the clock itself.
#[derive(Debug)]
pub struct DoorStateMachine {
    /// Current state of the door.
    state: DoorState,

    /// When the current state was entered.
    entered_at: Instant,

    /// History of state transitions (limited to MAX_HISTORY_SIZE).
    history: VecDeque<StateTransition>,
}

impl DoorStateMachine {
    /// Create a machine in the `Closed` state.
    pub fn new(now: Instant) -> Self {
        Self {
            state: DoorState::Closed,
            entered_at: now,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn state(&self) -> DoorState {
        self.state
    }

    /// When the current state was entered.
    pub fn entered_at(&self) -> Instant {
        self.entered_at
    }

    /// Time spent in the current state as of `now`.
    pub fn time_in_state(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.entered_at)
    }

    /// Recent transitions, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// The last `count` transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        let skip = self.history.len().saturating_sub(count);
        self.history.iter().skip(skip).copied().collect()
    }

    /// Transition to `new_state` at `now`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` if the transition is not
    /// allowed from the current state; the machine is then unchanged.
    pub fn transition_to(&mut self, new_state: DoorState, now: Instant) -> Result<StateTransition> {
        if !self.state.can_transition_to(&new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.state.to_string(),
                to: new_state.to_string(),
            });
        }

        let transition = StateTransition::new(self.state, new_state, now);
        self.state = new_state;
        self.entered_at = now;

        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }

        Ok(transition)
    }
}
