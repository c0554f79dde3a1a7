//! Mock override button.
//!
//! The pin level is shared through a `watch` channel so tests can press and
//! release the button while the control loop owns the [`MockButton`].

use tokio::sync::watch;

use crate::error::Result;
use crate::traits::ButtonInput;
use crate::types::PinLevel;

/// Mock active-low button input.
#[derive(Debug)]
pub struct MockButton {
    level_rx: watch::Receiver<PinLevel>,
}

impl MockButton {
    /// Create a released button and its controlling handle.
    pub fn new() -> (Self, MockButtonHandle) {
        let (level_tx, level_rx) = watch::channel(PinLevel::High);
        (Self { level_rx }, MockButtonHandle { level_tx })
    }
}

impl ButtonInput for MockButton {
    fn read_level(&mut self) -> Result<PinLevel> {
        Ok(*self.level_rx.borrow())
    }
}

/// Handle for driving a [`MockButton`].
#[derive(Debug, Clone)]
pub struct MockButtonHandle {
    level_tx: watch::Sender<PinLevel>,
}

impl MockButtonHandle {
    /// Pull the pin low.
    pub fn press(&self) {
        self.set_level(PinLevel::Low);
    }

    /// Let the pin float back high.
    pub fn release(&self) {
        self.set_level(PinLevel::High);
    }

    pub fn set_level(&self, level: PinLevel) {
        self.level_tx.send_replace(level);
    }

    pub fn level(&self) -> PinLevel {
        *self.level_tx.borrow()
    }
}
