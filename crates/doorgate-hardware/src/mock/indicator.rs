//! Mock indicator and feedback sink.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{HardwareError, Result};
use crate::traits::{Feedback, Indicator};
use crate::types::{FeedbackSignal, LedColor};

/// One indicator action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndicatorEvent {
    Led(LedColor),
    Tone { frequency_hz: u32, duration: Duration },
}

#[derive(Debug, Default)]
struct IndicatorState {
    events: Vec<(Instant, IndicatorEvent)>,
    fail_next: bool,
}

/// Indicator that records LED and tone actions with their timestamps.
#[derive(Debug, Clone, Default)]
pub struct MockIndicator {
    state: Arc<Mutex<IndicatorState>>,
}

impl MockIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, IndicatorState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fail the next action.
    pub fn fail_next(&self) {
        self.state().fail_next = true;
    }

    pub fn events(&self) -> Vec<(Instant, IndicatorEvent)> {
        self.state().events.clone()
    }

    pub fn last_led(&self) -> Option<LedColor> {
        self.state().events.iter().rev().find_map(|(_, e)| match e {
            IndicatorEvent::Led(color) => Some(*color),
            IndicatorEvent::Tone { .. } => None,
        })
    }

    fn record(&self, event: IndicatorEvent) -> Result<()> {
        let mut state = self.state();
        if std::mem::take(&mut state.fail_next) {
            return Err(HardwareError::communication("injected indicator failure"));
        }
        state.events.push((Instant::now(), event));
        Ok(())
    }
}

impl Indicator for MockIndicator {
    async fn set_led(&mut self, color: LedColor) -> Result<()> {
        self.record(IndicatorEvent::Led(color))
    }

    async fn tone(&mut self, frequency_hz: u32, duration: Duration) -> Result<()> {
        self.record(IndicatorEvent::Tone {
            frequency_hz,
            duration,
        })
    }
}

/// Feedback sink that records every signal.
#[derive(Debug, Clone, Default)]
pub struct MockFeedback {
    signals: Arc<Mutex<Vec<FeedbackSignal>>>,
}

impl MockFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signals(&self) -> Vec<FeedbackSignal> {
        self.signals.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn count_denied(&self) -> usize {
        self.signals()
            .iter()
            .filter(|s| matches!(s, FeedbackSignal::Denied))
            .count()
    }

    pub fn count_granted(&self) -> usize {
        self.signals()
            .iter()
            .filter(|s| matches!(s, FeedbackSignal::Granted { .. }))
            .count()
    }
}

impl Feedback for MockFeedback {
    fn signal(&mut self, signal: FeedbackSignal) {
        self.signals
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(signal);
    }
}
