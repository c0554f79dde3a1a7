//! Cooperative control loop.
//!
//! One iteration samples the button, polls the reader (only while the door
//! is at rest), runs at most one authorization exchange, and then services
//! the door deadlines. Iterations are paced by a tokio interval and the loop
//! exits when the shutdown future resolves, stopping the drive if the door
//! is still moving.

use std::future::Future;
use std::time::Duration;

use doorgate_core::{AuthorizationResult, Authorizer};
use doorgate_hardware::{ButtonInput, CredentialReader, DoorDrive, Feedback, FeedbackSignal};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::door::{Direction, DoorState, StateTransition};
use crate::entry::EntryController;
use crate::error::Result;

/// Counters for the lifetime of a loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub iterations: u64,
    pub exchanges: u64,
    pub granted: u64,
    pub denied: u64,
    pub read_failures: u64,
    pub drive_failures: u64,
}

pub struct ControlLoop<R, B, D, A, F> {
    reader: R,
    button: B,
    controller: EntryController<D>,
    authorizer: A,
    feedback: F,
    poll_interval: Duration,
    stats: LoopStats,
}

impl<R, B, D, A, F> ControlLoop<R, B, D, A, F>
where
    R: CredentialReader,
    B: ButtonInput,
    D: DoorDrive,
    A: Authorizer,
    F: Feedback,
{
    pub fn new(
        reader: R,
        button: B,
        controller: EntryController<D>,
        authorizer: A,
        feedback: F,
        poll_interval: Duration,
    ) -> Self {
        Self {
            reader,
            button,
            controller,
            authorizer,
            feedback,
            poll_interval,
            stats: LoopStats::default(),
        }
    }

    pub fn controller(&self) -> &EntryController<D> {
        &self.controller
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Run one iteration.
    ///
    /// Faults in one step are logged and do not prevent the remaining steps
    /// from running.
    pub async fn run_once(&mut self) {
        self.stats.iterations += 1;

        self.poll_button();

        if self.controller.reader_enabled() {
            self.poll_reader().await;
        }

        match self.controller.tick(Instant::now()) {
            Ok(Some(transition)) => self.on_transition(transition),
            Ok(None) => {}
            Err(e) => {
                self.stats.drive_failures += 1;
                error!(
                    error = %e,
                    state = %self.controller.state(),
                    "Deadline step failed, retrying next iteration"
                );
            }
        }
    }

    /// Run until `shutdown` resolves, then stop a moving door.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::Hardware` if the final stop is rejected.
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) -> Result<()> {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(poll_interval = ?self.poll_interval, "Control loop started");

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                _ = interval.tick() => {
                    self.run_once().await;
                }
            }
        }

        self.controller.halt(Instant::now())?;
        info!(stats = ?self.stats, "Control loop stopped");
        Ok(())
    }

    fn poll_button(&mut self) {
        let level = match self.button.read_level() {
            Ok(level) => level,
            Err(e) => {
                warn!(error = %e, "Button read failed");
                return;
            }
        };

        match self.controller.sample_button(level, Instant::now()) {
            Ok(Some(transition)) => self.on_transition(transition),
            Ok(None) => {}
            Err(e) => {
                self.stats.drive_failures += 1;
                error!(error = %e, "Failed to open door for button press");
            }
        }
    }

    async fn poll_reader(&mut self) {
        match self.reader.is_credential_present().await {
            Ok(true) => {}
            Ok(false) => return,
            Err(e) => {
                self.stats.read_failures += 1;
                warn!(error = %e, "Reader presence check failed");
                return;
            }
        }

        let credential = match self.reader.read_credential().await {
            Ok(credential) => credential,
            Err(e) => {
                self.stats.read_failures += 1;
                warn!(error = %e, "Credential read failed");
                return;
            }
        };

        debug!(len = credential.len(), "Credential presented");
        self.stats.exchanges += 1;
        let result = self.authorizer.check_authorization(&credential).await;
        self.on_authorization(result);
    }

    fn on_authorization(&mut self, result: AuthorizationResult) {
        if result.granted {
            self.stats.granted += 1;
            info!(message = result.message.as_deref().unwrap_or(""), "Access granted");
        } else {
            self.stats.denied += 1;
            info!("Access denied");
        }

        match self.controller.apply_authorization(&result, Instant::now()) {
            Ok(Some(transition)) => self.on_transition(transition),
            Ok(None) => {}
            Err(e) => {
                self.stats.drive_failures += 1;
                error!(error = %e, "Failed to open door for granted credential");
            }
        }

        let signal = if result.granted {
            FeedbackSignal::Granted {
                message: result.message,
            }
        } else {
            FeedbackSignal::Denied
        };
        self.feedback.signal(signal);
    }

    fn on_transition(&mut self, transition: StateTransition) {
        if transition.to == DoorState::Moving(Direction::Closing) {
            self.feedback.signal(FeedbackSignal::Closing);
        }
    }
}

impl<R, B, D, A, F> std::fmt::Debug for ControlLoop<R, B, D, A, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlLoop")
            .field("controller", &self.controller)
            .field("poll_interval", &self.poll_interval)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doorgate_core::Credential;
    use doorgate_core::config::DoorTiming;
    use doorgate_hardware::DriveCommand;
    use doorgate_hardware::mock::{
        MockButton, MockButtonHandle, MockDrive, MockFeedback, MockReader, MockReaderHandle,
    };
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Authorizer answering from a script, recording what it was asked.
    #[derive(Debug, Clone, Default)]
    struct ScriptedAuthorizer {
        answers: Arc<Mutex<VecDeque<AuthorizationResult>>>,
        seen: Arc<Mutex<Vec<Vec<u8>>>>,
        latency: Duration,
    }

    impl ScriptedAuthorizer {
        fn answering(answers: impl IntoIterator<Item = AuthorizationResult>) -> Self {
            Self {
                answers: Arc::new(Mutex::new(answers.into_iter().collect())),
                ..Default::default()
            }
        }

        fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = latency;
            self
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    impl Authorizer for ScriptedAuthorizer {
        async fn check_authorization(&mut self, credential: &Credential) -> AuthorizationResult {
            self.seen.lock().unwrap().push(credential.as_bytes().to_vec());
            tokio::time::sleep(self.latency).await;
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(AuthorizationResult::denied)
        }
    }

    type TestLoop = ControlLoop<MockReader, MockButton, MockDrive, ScriptedAuthorizer, MockFeedback>;

    struct Rig {
        control: TestLoop,
        reader: MockReaderHandle,
        button: MockButtonHandle,
        drive: MockDrive,
        authorizer: ScriptedAuthorizer,
        feedback: MockFeedback,
    }

    fn rig(authorizer: ScriptedAuthorizer) -> Rig {
        let (reader, reader_handle) = MockReader::new();
        let (button, button_handle) = MockButton::new();
        let drive = MockDrive::new();
        let feedback = MockFeedback::new();
        let controller =
            EntryController::new(drive.clone(), DoorTiming::default(), Instant::now()).unwrap();

        let control = ControlLoop::new(
            reader,
            button,
            controller,
            authorizer.clone(),
            feedback.clone(),
            Duration::from_millis(5),
        );

        Rig {
            control,
            reader: reader_handle,
            button: button_handle,
            drive,
            authorizer,
            feedback,
        }
    }

    fn card() -> Credential {
        Credential::new(vec![0x04, 0xAB, 0xCD, 0xEF]).unwrap()
    }

    /// Iterate the loop every 5ms for `span`.
    async fn step_for(control: &mut TestLoop, span: Duration) {
        let end = Instant::now() + span;
        while Instant::now() < end {
            control.run_once().await;
            tokio::time::advance(Duration::from_millis(5)).await;
        }
    }

    /// Offset of each drive command from the first `Open`.
    fn offsets_from_open(drive: &MockDrive) -> Vec<(Duration, DriveCommand)> {
        let timeline = drive.timeline();
        let start = timeline
            .iter()
            .find(|(_, c)| *c == DriveCommand::Open)
            .map(|(t, _)| *t)
            .unwrap();
        timeline
            .into_iter()
            .filter(|(t, _)| *t >= start)
            .map(|(t, c)| (t - start, c))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_granted_card_opens_and_auto_closes() {
        let mut r = rig(ScriptedAuthorizer::answering([
            AuthorizationResult::granted().with_message("Alice"),
        ]));

        r.reader.present(card()).await.unwrap();
        step_for(&mut r.control, Duration::from_secs(5)).await;

        let offsets = offsets_from_open(&r.drive);
        let commands: Vec<_> = offsets.iter().map(|(_, c)| *c).collect();
        assert_eq!(
            commands,
            vec![DriveCommand::Open, DriveCommand::Stop, DriveCommand::Close, DriveCommand::Stop]
        );

        // Never stopped before the movement time, auto-close not early.
        assert!(offsets[1].0 >= Duration::from_millis(360));
        assert!(offsets[2].0 - offsets[1].0 >= Duration::from_millis(3000));
        assert!(offsets[3].0 - offsets[2].0 >= Duration::from_millis(360));

        assert_eq!(r.control.controller().state(), DoorState::Closed);
        assert_eq!(
            r.feedback.signals(),
            vec![
                FeedbackSignal::Granted {
                    message: Some("Alice".to_string())
                },
                FeedbackSignal::Closing
            ]
        );
        assert_eq!(r.control.stats().granted, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_denied_card_never_opens() {
        let mut r = rig(ScriptedAuthorizer::answering([AuthorizationResult::denied()]));

        r.reader.present(card()).await.unwrap();
        step_for(&mut r.control, Duration::from_secs(1)).await;

        assert_eq!(r.drive.count(DriveCommand::Open), 0);
        assert_eq!(r.feedback.count_denied(), 1);
        assert_eq!(r.control.stats().denied, 1);
        assert_eq!(r.authorizer.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reader_not_polled_while_moving() {
        let mut r = rig(ScriptedAuthorizer::answering([
            AuthorizationResult::granted(),
            AuthorizationResult::granted(),
        ]));

        r.reader.present(card()).await.unwrap();
        r.control.run_once().await;
        assert!(r.control.controller().state().is_moving());

        r.reader.present(card()).await.unwrap();
        step_for(&mut r.control, Duration::from_millis(300)).await;
        assert_eq!(r.authorizer.calls(), 1);

        // Picked up once the door has reached Open; ignored there.
        step_for(&mut r.control, Duration::from_millis(100)).await;
        assert_eq!(r.control.controller().state(), DoorState::Open);
        assert_eq!(r.authorizer.calls(), 2);
        assert_eq!(r.drive.count(DriveCommand::Open), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_button_opens_without_exchange() {
        let mut r = rig(ScriptedAuthorizer::default());

        r.button.press();
        step_for(&mut r.control, Duration::from_millis(100)).await;

        assert_eq!(r.drive.count(DriveCommand::Open), 1);
        assert_eq!(r.authorizer.calls(), 0);
        assert!(r.feedback.signals().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_button_glitch_ignored() {
        let mut r = rig(ScriptedAuthorizer::default());

        r.button.press();
        step_for(&mut r.control, Duration::from_millis(20)).await;
        r.button.release();
        step_for(&mut r.control, Duration::from_millis(200)).await;

        assert_eq!(r.drive.count(DriveCommand::Open), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_exchange_measures_movement_from_open() {
        let mut r = rig(
            ScriptedAuthorizer::answering([AuthorizationResult::granted()])
                .with_latency(Duration::from_millis(4000)),
        );

        r.reader.present(card()).await.unwrap();
        r.control.run_once().await;
        step_for(&mut r.control, Duration::from_millis(500)).await;

        let offsets = offsets_from_open(&r.drive);
        assert_eq!(offsets[0].1, DriveCommand::Open);
        assert_eq!(offsets[1].1, DriveCommand::Stop);
        assert!(offsets[1].0 >= Duration::from_millis(360));
    }

    #[tokio::test(start_paused = true)]
    async fn test_outstanding_exchange_holds_auto_close() {
        let mut r = rig(
            ScriptedAuthorizer::answering([
                AuthorizationResult::granted(),
                AuthorizationResult::granted(),
            ])
            .with_latency(Duration::from_millis(2000)),
        );

        r.reader.present(card()).await.unwrap();
        r.control.run_once().await;
        step_for(&mut r.control, Duration::from_millis(2500)).await;
        assert_eq!(r.control.controller().state(), DoorState::Open);
        let deadline = r.control.controller().deadline().unwrap();

        r.reader.present(card()).await.unwrap();
        let started = Instant::now();
        assert!(started < deadline);
        r.control.run_once().await;

        // Deadline passed mid-exchange; serviced only once it returned.
        let (closed_at, _) = r
            .drive
            .timeline()
            .into_iter()
            .find(|(_, c)| *c == DriveCommand::Close)
            .unwrap();
        assert!(closed_at >= started + Duration::from_millis(2000));
        assert_eq!(
            r.control.controller().state(),
            DoorState::Moving(Direction::Closing)
        );
        assert_eq!(r.drive.count(DriveCommand::Open), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_fault_skips_exchange() {
        let mut r = rig(ScriptedAuthorizer::default());

        r.reader.inject_fault("collision").await.unwrap();
        r.control.run_once().await;

        assert_eq!(r.authorizer.calls(), 0);
        assert_eq!(r.control.stats().read_failures, 1);
        assert_eq!(r.control.controller().state(), DoorState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drive_fault_retried_by_loop() {
        let mut r = rig(ScriptedAuthorizer::answering([AuthorizationResult::granted()]));

        r.reader.present(card()).await.unwrap();
        r.control.run_once().await;

        r.drive.fail_next(1);
        step_for(&mut r.control, Duration::from_millis(400)).await;

        assert_eq!(r.control.controller().state(), DoorState::Open);
        assert_eq!(r.control.stats().drive_failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_halts_moving_door() {
        let mut r = rig(ScriptedAuthorizer::default());
        r.button.press();

        let shutdown = tokio::time::sleep(Duration::from_millis(100));
        r.control.run(shutdown).await.unwrap();

        assert!(r.control.controller().state().is_moving());
        assert_eq!(r.drive.last_command(), Some(DriveCommand::Stop));
        assert_eq!(r.drive.count(DriveCommand::Open), 1);
    }
}
