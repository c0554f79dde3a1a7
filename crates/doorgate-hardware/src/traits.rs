//! Hardware device trait definitions.
//!
//! These traits are the contract between the entry controller and the door
//! peripherals, so mock and real drivers can be swapped freely.
//!
//! Reader operations are asynchronous and use native `async fn` in traits
//! (Rust 1.90 + Edition 2024). The button and drive are sampled and commanded
//! from inside the control loop and must not suspend, so they are plain
//! synchronous methods. [`Indicator`] futures are `Send` because the feedback
//! worker runs on its own task.

#![allow(async_fn_in_trait)]

use std::future::Future;
use std::time::Duration;

use doorgate_core::Credential;

use crate::error::Result;
use crate::types::{DriveCommand, FeedbackSignal, LedColor, PinLevel};

/// Contactless credential reader.
///
/// The control loop polls [`is_credential_present`] once per iteration and
/// calls [`read_credential`] only when it returned `true`.
///
/// # Examples
///
/// ```no_run
/// use doorgate_hardware::traits::CredentialReader;
/// use doorgate_hardware::error::Result;
///
/// async fn poll<R: CredentialReader>(reader: &mut R) -> Result<()> {
///     if reader.is_credential_present().await? {
///         let credential = reader.read_credential().await?;
///         println!("read {} bytes", credential.len());
///     }
///     Ok(())
/// }
/// ```
///
/// [`is_credential_present`]: CredentialReader::is_credential_present
/// [`read_credential`]: CredentialReader::read_credential
pub trait CredentialReader: Send {
    /// Check whether a new credential is waiting to be read.
    async fn is_credential_present(&mut self) -> Result<bool>;

    /// Read the pending credential.
    ///
    /// # Errors
    ///
    /// - `HardwareError::CredentialReadError` if the read failed
    /// - `HardwareError::Disconnected` if the reader went away
    async fn read_credential(&mut self) -> Result<Credential>;
}

/// Raw digital input of the override button.
pub trait ButtonInput: Send {
    /// Sample the current pin level.
    fn read_level(&mut self) -> Result<PinLevel>;
}

/// Door drive output.
pub trait DoorDrive: Send {
    /// Apply a drive command.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::DriveError` if the output rejected the
    /// command; the physical output is then unchanged.
    fn drive(&mut self, command: DriveCommand) -> Result<()>;
}

/// Fire-and-forget user feedback.
///
/// Implementations must return immediately; door transitions never wait on
/// feedback.
pub trait Feedback: Send {
    fn signal(&mut self, signal: FeedbackSignal);
}

/// LED plus buzzer.
pub trait Indicator: Send {
    /// Set the status LED.
    fn set_led(&mut self, color: LedColor) -> impl Future<Output = Result<()>> + Send;

    /// Start a tone of `frequency_hz` lasting `duration`.
    ///
    /// Returns once the tone has been started; it stops by itself.
    fn tone(
        &mut self,
        frequency_hz: u32,
        duration: Duration,
    ) -> impl Future<Output = Result<()>> + Send;
}

impl<T: ButtonInput + ?Sized> ButtonInput for Box<T> {
    fn read_level(&mut self) -> Result<PinLevel> {
        (**self).read_level()
    }
}

impl<T: DoorDrive + ?Sized> DoorDrive for Box<T> {
    fn drive(&mut self, command: DriveCommand) -> Result<()> {
        (**self).drive(command)
    }
}

impl<T: Feedback + ?Sized> Feedback for Box<T> {
    fn signal(&mut self, signal: FeedbackSignal) {
        (**self).signal(signal)
    }
}
