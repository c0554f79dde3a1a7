//! Door controller crate for the doorgate access endpoint.
//!
//! This crate contains the door state machine, the open-loop actuator, the
//! button debouncer and the control loop that ties reader, button,
//! authorizer and feedback together.

pub mod actuator;
pub mod control_loop;
pub mod debounce;
pub mod door;
pub mod entry;
pub mod error;

pub use actuator::DoorActuator;
pub use control_loop::{ControlLoop, LoopStats};
pub use debounce::{ButtonEdge, Debouncer};
pub use door::{Direction, DoorState, DoorStateMachine, MAX_HISTORY_SIZE, StateTransition};
pub use entry::EntryController;
pub use error::{ControllerError, Result};
