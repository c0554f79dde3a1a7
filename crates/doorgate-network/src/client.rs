//! Authorization client.
//!
//! One call to [`AuthorizationClient::exchange`] performs one complete
//! request/response cycle against the authorization server:
//!
//! ```text
//! Credential ──seal──> {UUID, iv, content} ──POST /──> server
//!                                                        │
//!   granted <── 2xx ── status line <── ExchangeCodec <───┘
//! ```
//!
//! # Failure policy
//!
//! - **No retry**: a failed connection returns immediately.
//! - **Bounded**: the whole call, from connecting to closing, runs against
//!   one deadline set `response_timeout` after it starts. Within it,
//!   connecting is further limited by `connect_timeout` and body draining by
//!   `drain_timeout`.
//! - **Status line decides**: if the deadline passes after a complete status
//!   line but before the end of the headers, that status line is used.
//! - **Closed on every path**: the connection never outlives the call.
//! - **Fail closed**: through the [`Authorizer`] implementation every error
//!   becomes a denial.
//!
//! # Example
//!
//! ```no_run
//! use doorgate_core::{Authorizer, Credential, DeviceId, EncryptionKey};
//! use doorgate_network::{AuthorizationClient, AuthorizationClientConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AuthorizationClientConfig {
//!     host: "auth.example.local".to_string(),
//!     port: 8080,
//!     ..Default::default()
//! };
//! let key = EncryptionKey::from_hex("2b7e151628aed2a6abf7158809cf4f3c")?;
//!
//! let mut client = AuthorizationClient::new(config, DeviceId::generate(), key);
//! let result = client
//!     .check_authorization(&Credential::new(vec![0x04, 0xAB, 0xCD, 0xEF])?)
//!     .await;
//! println!("granted: {}", result.granted);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use bytes::BytesMut;
use doorgate_core::config::ServerSettings;
use doorgate_core::constants::{
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_DRAIN_TIMEOUT_MS, DEFAULT_RESPONSE_TIMEOUT_MS,
    DEFAULT_SERVER_PORT, MAX_BODY_BYTES,
};
use doorgate_core::{AuthorizationResult, Authorizer, Credential, DeviceId, EncryptionKey};
use doorgate_protocol::{
    AuthorizationPayload, AuthorizationRequest, CredentialEncoder, ExchangeCodec, IvSource,
    OsIvSource, ResponseHead, StatusLine,
};
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{Instant, timeout_at};
use tokio_util::codec::Framed;
use tracing::{debug, error, info, trace, warn};

use crate::connector::{Connector, TcpConnector};

/// Flush and shutdown bound used when closing, clipped to the deadline.
const CLOSE_TIMEOUT: Duration = Duration::from_millis(500);

/// Whole milliseconds of `duration`, saturating.
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// What arrived before the response deadline.
#[derive(Debug)]
enum HeadOutcome {
    Complete(ResponseHead),
    /// Deadline passed with only the status line available.
    StatusOnly(StatusLine),
}

/// Configuration for the authorization client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationClientConfig {
    /// Server host name or address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Bound on establishing the connection
    pub connect_timeout: Duration,

    /// Bound on the whole exchange, connect through close
    pub response_timeout: Duration,

    /// Bound on draining the response body
    pub drain_timeout: Duration,
}

impl Default for AuthorizationClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_SERVER_PORT,
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            response_timeout: Duration::from_millis(DEFAULT_RESPONSE_TIMEOUT_MS),
            drain_timeout: Duration::from_millis(DEFAULT_DRAIN_TIMEOUT_MS),
        }
    }
}

impl From<&ServerSettings> for AuthorizationClientConfig {
    fn from(settings: &ServerSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            connect_timeout: settings.connect_timeout,
            response_timeout: settings.response_timeout,
            drain_timeout: settings.drain_timeout,
        }
    }
}

impl AuthorizationClientConfig {
    /// Value of the `Host` header: the host, plus the port unless it is 80.
    pub fn host_header(&self) -> String {
        if self.port == DEFAULT_SERVER_PORT {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Stage of the exchange that ran out of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeStage {
    Connect,
    Response,
}

impl std::fmt::Display for ExchangeStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connect => f.write_str("connect"),
            Self::Response => f.write_str("response"),
        }
    }
}

/// Errors of a single exchange.
#[derive(Debug, Error)]
pub enum AuthorizationError {
    /// The server could not be reached or the connection broke
    #[error("Connection failure: {0}")]
    ConnectionFailure(String),

    /// A bounded stage did not complete in time
    #[error("{stage} timeout after {duration_ms}ms")]
    Timeout {
        stage: ExchangeStage,
        duration_ms: u64,
    },

    /// The server answered with something that is not a status line
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The request could not be built (credential length, entropy, key)
    #[error("Encryption precondition failed: {0}")]
    Encryption(#[source] doorgate_core::Error),
}

/// Counters over the client's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExchangeStats {
    pub exchanges: u64,
    pub granted: u64,
    pub denied: u64,
    pub failures: u64,
}

/// Authorization client for one device.
///
/// The device identifier and key are fixed at construction. Every exchange
/// takes `&mut self`, so a client never has two exchanges in flight.
pub struct AuthorizationClient<C = TcpConnector, S = OsIvSource> {
    config: AuthorizationClientConfig,
    host_header: String,
    device_id: DeviceId,
    encoder: CredentialEncoder<S>,
    connector: C,
    stats: ExchangeStats,
}

impl AuthorizationClient {
    /// Create a client using plain TCP and operating-system IVs.
    pub fn new(config: AuthorizationClientConfig, device_id: DeviceId, key: EncryptionKey) -> Self {
        Self::with_parts(config, device_id, key, TcpConnector, OsIvSource)
    }
}

impl<C: Connector, S: IvSource> AuthorizationClient<C, S> {
    /// Create a client with an explicit connector and IV source.
    pub fn with_parts(
        config: AuthorizationClientConfig,
        device_id: DeviceId,
        key: EncryptionKey,
        connector: C,
        iv_source: S,
    ) -> Self {
        debug!(
            host = %config.host,
            port = config.port,
            device_id = %device_id,
            "Creating authorization client"
        );

        Self {
            host_header: config.host_header(),
            config,
            device_id,
            encoder: CredentialEncoder::new(key, iv_source),
            connector,
            stats: ExchangeStats::default(),
        }
    }

    pub fn config(&self) -> &AuthorizationClientConfig {
        &self.config
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    pub fn stats(&self) -> ExchangeStats {
        self.stats
    }

    /// Run one exchange for `credential`.
    ///
    /// The credential is sealed before any connection is opened, so an
    /// encryption precondition failure never touches the network.
    ///
    /// # Errors
    ///
    /// Returns the [`AuthorizationError`] describing why no decision could be
    /// obtained. A well-formed non-2xx response is not an error: it is
    /// `Ok` with `granted == false`.
    pub async fn exchange(
        &mut self,
        credential: &Credential,
    ) -> Result<AuthorizationResult, AuthorizationError> {
        self.stats.exchanges += 1;
        let started = Instant::now();

        let outcome = self.run_exchange(credential).await;

        let elapsed_ms = millis(started.elapsed());
        match &outcome {
            Ok(result) if result.granted => {
                self.stats.granted += 1;
                info!(elapsed_ms, "Authorization granted");
            }
            Ok(_) => {
                self.stats.denied += 1;
                info!(elapsed_ms, "Authorization denied");
            }
            Err(_) => self.stats.failures += 1,
        }
        outcome
    }

    async fn run_exchange(
        &mut self,
        credential: &Credential,
    ) -> Result<AuthorizationResult, AuthorizationError> {
        let request = self.build_request(credential)?;

        let started = Instant::now();
        let deadline = started + self.config.response_timeout;
        let connect_deadline = deadline.min(started + self.config.connect_timeout);

        info!(
            "Connecting to authorization server at {}:{}",
            self.config.host, self.config.port
        );
        let stream = match timeout_at(
            connect_deadline,
            self.connector.connect(&self.config.host, self.config.port),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(AuthorizationError::ConnectionFailure(e.to_string()));
            }
            Err(_) => {
                return Err(AuthorizationError::Timeout {
                    stage: ExchangeStage::Connect,
                    duration_ms: millis(connect_deadline - started),
                });
            }
        };

        let mut framed = Framed::new(stream, ExchangeCodec::new());

        let outcome = match self.await_head(&mut framed, request, deadline).await {
            Ok(HeadOutcome::Complete(head)) => {
                let drain_deadline = deadline.min(Instant::now() + self.config.drain_timeout);
                let body = drain_body(&mut framed, head.content_length, drain_deadline).await;
                Ok(interpret(&head.status, &body))
            }
            Ok(HeadOutcome::StatusOnly(status)) => Ok(interpret(&status, b"")),
            Err(e) => Err(e),
        };

        close(framed, deadline).await;
        outcome
    }

    fn build_request(
        &mut self,
        credential: &Credential,
    ) -> Result<AuthorizationRequest, AuthorizationError> {
        let sealed = self
            .encoder
            .seal(credential.as_bytes())
            .map_err(AuthorizationError::Encryption)?;
        let payload = AuthorizationPayload::new(&self.device_id, &sealed);
        AuthorizationRequest::new(self.host_header.clone(), &payload)
            .map_err(AuthorizationError::Encryption)
    }

    async fn await_head<T: AsyncRead + AsyncWrite + Unpin>(
        &self,
        framed: &mut Framed<T, ExchangeCodec>,
        request: AuthorizationRequest,
        deadline: Instant,
    ) -> Result<HeadOutcome, AuthorizationError> {
        let timed_out = || AuthorizationError::Timeout {
            stage: ExchangeStage::Response,
            duration_ms: millis(self.config.response_timeout),
        };

        trace!(body_len = request.body().len(), "Sending authorization request");
        match timeout_at(deadline, framed.send(request)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(AuthorizationError::ConnectionFailure(e.to_string())),
            Err(_) => return Err(timed_out()),
        }

        match timeout_at(deadline, framed.next()).await {
            Ok(Some(Ok(head))) => {
                debug!(status = %head.status, "Received response head");
                Ok(HeadOutcome::Complete(head))
            }
            Ok(Some(Err(doorgate_core::Error::Io(e)))) => {
                Err(AuthorizationError::ConnectionFailure(e.to_string()))
            }
            Ok(Some(Err(e))) => Err(AuthorizationError::MalformedResponse(e.to_string())),
            Ok(None) => Err(AuthorizationError::MalformedResponse(
                "connection closed before status line".to_string(),
            )),
            Err(_) => match StatusLine::from_partial_head(framed.read_buffer()) {
                Some(status) => {
                    debug!(%status, "Headers incomplete at deadline, deciding on status line");
                    Ok(HeadOutcome::StatusOnly(status))
                }
                None => Err(timed_out()),
            },
        }
    }
}

fn interpret(status: &StatusLine, body: &[u8]) -> AuthorizationResult {
    if !status.is_success() {
        debug!(code = status.code, "Non-success status");
        return AuthorizationResult::denied();
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        AuthorizationResult::granted()
    } else {
        AuthorizationResult::granted().with_message(text)
    }
}

/// Read what is left of the response, keeping at most [`MAX_BODY_BYTES`].
///
/// Stops at end of stream, once `content_length` bytes arrived, on a read
/// error, or at `deadline`.
async fn drain_body<T: AsyncRead + AsyncWrite + Unpin>(
    framed: &mut Framed<T, ExchangeCodec>,
    content_length: Option<usize>,
    deadline: Instant,
) -> BytesMut {
    let mut body = framed.read_buffer_mut().split();
    let mut received = body.len();
    body.truncate(MAX_BODY_BYTES);

    let stream = framed.get_mut();
    let mut chunk = [0u8; 512];

    loop {
        if content_length.is_some_and(|len| received >= len) {
            break;
        }
        match timeout_at(deadline, stream.read(&mut chunk)).await {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => {
                received += n;
                let room = MAX_BODY_BYTES.saturating_sub(body.len());
                body.extend_from_slice(&chunk[..n.min(room)]);
            }
            Ok(Err(e)) => {
                debug!(error = %e, "Read error while draining response body");
                break;
            }
            Err(_) => {
                debug!(received, "Drain deadline reached");
                break;
            }
        }
    }

    if let Some(len) = content_length {
        body.truncate(len);
    }
    trace!(received, kept = body.len(), "Response body drained");
    body
}

/// Flush and shut down the connection.
///
/// Each step gets at most 500ms and never runs past `deadline`; a step that
/// is already complete still goes through once the deadline has passed. The
/// stream is dropped either way.
async fn close<T: AsyncRead + AsyncWrite + Unpin>(
    mut framed: Framed<T, ExchangeCodec>,
    deadline: Instant,
) {
    let step_deadline = || deadline.min(Instant::now() + CLOSE_TIMEOUT);

    match timeout_at(step_deadline(), framed.flush()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Error flushing during close: {}", e),
        Err(_) => warn!("Flush did not complete before close deadline"),
    }

    let mut stream = framed.into_inner();
    match timeout_at(step_deadline(), stream.shutdown()).await {
        Ok(Ok(())) => debug!("Connection closed"),
        Ok(Err(e)) => debug!("Error during shutdown: {}", e),
        Err(_) => warn!("Shutdown did not complete before close deadline"),
    }
}

impl<C: Connector, S: IvSource> Authorizer for AuthorizationClient<C, S> {
    async fn check_authorization(&mut self, credential: &Credential) -> AuthorizationResult {
        match self.exchange(credential).await {
            Ok(result) => result,
            Err(e @ AuthorizationError::Encryption(_)) => {
                error!(error = %e, "Authorization request could not be built");
                AuthorizationResult::denied()
            }
            Err(e) => {
                warn!(error = %e, "Authorization exchange failed, denying");
                AuthorizationResult::denied()
            }
        }
    }
}

impl<C, S> std::fmt::Debug for AuthorizationClient<C, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationClient")
            .field("config", &self.config)
            .field("device_id", &self.device_id)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
