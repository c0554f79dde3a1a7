//! Peripheral abstraction layer for the doorgate access endpoint.
//!
//! This crate defines the traits the entry controller uses to talk to the
//! door hardware, plus mock implementations for development and testing.
//!
//! # Device Traits
//!
//! - [`CredentialReader`]: contactless reader, polled for presence and then
//!   read. Asynchronous.
//! - [`ButtonInput`]: raw level of the active-low override button, sampled
//!   once per control-loop iteration.
//! - [`DoorDrive`]: open-loop drive output (`Open`, `Close`, `Stop`).
//! - [`Feedback`]: fire-and-forget granted/denied signals.
//! - [`Indicator`]: LED and buzzer used by the [`FeedbackWorker`].
//!
//! ```no_run
//! use doorgate_hardware::{DoorDrive, DriveCommand, Result};
//!
//! fn pulse<D: DoorDrive>(drive: &mut D) -> Result<()> {
//!     drive.drive(DriveCommand::Open)?;
//!     drive.drive(DriveCommand::Stop)
//! }
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T>`][error::Result] with
//! [`HardwareError`].
//!
//! [`CredentialReader`]: traits::CredentialReader
//! [`ButtonInput`]: traits::ButtonInput
//! [`DoorDrive`]: traits::DoorDrive
//! [`Feedback`]: traits::Feedback
//! [`Indicator`]: traits::Indicator

pub mod error;
pub mod feedback;
pub mod mock;
pub mod servo;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use feedback::{ChannelFeedback, FeedbackWorker};
pub use servo::{ServoDrive, ServoOutput, ServoProfile};
pub use traits::{ButtonInput, CredentialReader, DoorDrive, Feedback, Indicator};
pub use types::{DriveCommand, FeedbackSignal, LedColor, PinLevel};
