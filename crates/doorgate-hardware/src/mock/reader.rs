//! Mock credential reader for testing and development.
//!
//! The reader is driven through a [`MockReaderHandle`] that presents
//! credentials or injects read faults over a channel.

use doorgate_core::Credential;
use tokio::sync::mpsc;

use crate::error::{HardwareError, Result};
use crate::traits::CredentialReader;

/// Mock contactless reader.
///
/// # Examples
///
/// ```
/// use doorgate_core::Credential;
/// use doorgate_hardware::mock::MockReader;
/// use doorgate_hardware::traits::CredentialReader;
///
/// #[tokio::main]
/// async fn main() -> doorgate_hardware::Result<()> {
///     let (mut reader, handle) = MockReader::new();
///
///     handle.present(Credential::new(vec![0x04, 0xAB, 0xCD, 0xEF])?).await?;
///
///     assert!(reader.is_credential_present().await?);
///     let credential = reader.read_credential().await?;
///     assert_eq!(credential.as_bytes(), &[0x04, 0xAB, 0xCD, 0xEF]);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockReader {
    /// Channel receiver for reader events
    event_rx: mpsc::Receiver<ReaderEvent>,

    /// Event taken off the channel by a presence poll, not yet read
    pending: Option<ReaderEvent>,

    /// Number of completed reads
    reads: usize,
}

impl MockReader {
    /// Create a new mock reader and its controlling handle.
    pub fn new() -> (Self, MockReaderHandle) {
        let (event_tx, event_rx) = mpsc::channel(32);

        let reader = Self {
            event_rx,
            pending: None,
            reads: 0,
        };

        (reader, MockReaderHandle { event_tx })
    }

    /// Number of `read_credential` calls that returned a credential.
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl CredentialReader for MockReader {
    async fn is_credential_present(&mut self) -> Result<bool> {
        if self.pending.is_none() {
            self.pending = self.event_rx.try_recv().ok();
        }
        Ok(self.pending.is_some())
    }

    async fn read_credential(&mut self) -> Result<Credential> {
        let event = match self.pending.take() {
            Some(event) => event,
            None => self
                .event_rx
                .recv()
                .await
                .ok_or_else(|| HardwareError::disconnected("Reader event channel closed"))?,
        };

        match event {
            ReaderEvent::Presented(credential) => {
                self.reads += 1;
                Ok(credential)
            }
            ReaderEvent::Fault(message) => Err(HardwareError::credential_read(message)),
        }
    }
}

/// Internal event type for the mock reader.
#[derive(Debug, Clone)]
enum ReaderEvent {
    Presented(Credential),
    Fault(String),
}

/// Handle for controlling a [`MockReader`].
#[derive(Debug, Clone)]
pub struct MockReaderHandle {
    event_tx: mpsc::Sender<ReaderEvent>,
}

impl MockReaderHandle {
    /// Present a credential to the reader.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::Disconnected` if the reader has been dropped.
    pub async fn present(&self, credential: Credential) -> Result<()> {
        self.send(ReaderEvent::Presented(credential)).await
    }

    /// Make the next read fail with `message`.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::Disconnected` if the reader has been dropped.
    pub async fn inject_fault(&self, message: impl Into<String>) -> Result<()> {
        self.send(ReaderEvent::Fault(message.into())).await
    }

    async fn send(&self, event: ReaderEvent) -> Result<()> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| HardwareError::disconnected("Reader event channel closed"))
    }
}
