//! Non-blocking feedback.
//!
//! [`ChannelFeedback`] is the [`Feedback`] handed to the control loop: it
//! pushes signals into a bounded channel and returns immediately. A
//! [`FeedbackWorker`] on its own task drains the channel and plays each
//! signal's pattern on an [`Indicator`]. Patterns play one after another; a
//! full channel drops the newest signal.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::traits::{Feedback, Indicator};
use crate::types::{FeedbackSignal, LedColor};

/// Signals queued between the loop and the worker.
pub const FEEDBACK_CHANNEL_CAPACITY: usize = 8;

pub const GRANTED_TONE_HZ: u32 = 2000;
pub const GRANTED_TONE: Duration = Duration::from_millis(200);
pub const DENIED_TONE_HZ: u32 = 500;
pub const DENIED_TONE: Duration = Duration::from_millis(200);
/// Start-to-start spacing of the denial beeps.
pub const DENIED_BEEP_PERIOD: Duration = Duration::from_millis(300);
pub const DENIED_BEEPS: usize = 3;

/// Create a connected feedback sender and worker.
pub fn channel<I: Indicator>(indicator: I) -> (ChannelFeedback, FeedbackWorker<I>) {
    let (tx, rx) = mpsc::channel(FEEDBACK_CHANNEL_CAPACITY);
    (ChannelFeedback { tx }, FeedbackWorker { rx, indicator })
}

/// Sending half, owned by the control loop.
#[derive(Debug, Clone)]
pub struct ChannelFeedback {
    tx: mpsc::Sender<FeedbackSignal>,
}

impl Feedback for ChannelFeedback {
    fn signal(&mut self, signal: FeedbackSignal) {
        match self.tx.try_send(signal) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(signal)) => {
                warn!(?signal, "Feedback channel full, dropping signal");
            }
            Err(mpsc::error::TrySendError::Closed(signal)) => {
                warn!(?signal, "Feedback worker stopped, dropping signal");
            }
        }
    }
}

/// Plays feedback patterns on an indicator.
#[derive(Debug)]
pub struct FeedbackWorker<I> {
    rx: mpsc::Receiver<FeedbackSignal>,
    indicator: I,
}

impl<I: Indicator> FeedbackWorker<I> {
    /// Run until every sender is dropped.
    ///
    /// Indicator faults are logged and the worker moves on to the next
    /// signal.
    pub async fn run(mut self) -> I {
        debug!("Feedback worker started");
        while let Some(signal) = self.rx.recv().await {
            if let Err(e) = self.play(&signal).await {
                warn!(?signal, error = %e, "Indicator fault while playing feedback");
            }
        }
        debug!("Feedback worker stopped");
        self.indicator
    }

    async fn play(&mut self, signal: &FeedbackSignal) -> crate::Result<()> {
        match signal {
            FeedbackSignal::Granted { .. } => {
                self.indicator.set_led(LedColor::Green).await?;
                self.indicator.tone(GRANTED_TONE_HZ, GRANTED_TONE).await?;
            }
            FeedbackSignal::Denied => {
                self.indicator.set_led(LedColor::Red).await?;
                for _ in 0..DENIED_BEEPS {
                    self.indicator.tone(DENIED_TONE_HZ, DENIED_TONE).await?;
                    tokio::time::sleep(DENIED_BEEP_PERIOD).await;
                }
                self.indicator.set_led(LedColor::Off).await?;
            }
            FeedbackSignal::Closing => {
                self.indicator.set_led(LedColor::Off).await?;
            }
        }
        Ok(())
    }
}
