//! Tokio codec for the authorization exchange.
//!
//! `ExchangeCodec` writes [`AuthorizationRequest`]s and decodes exactly one
//! [`ResponseHead`] (status line plus headers) from the server's byte stream.
//! The body is not decoded: once the head is known, the caller takes the
//! remaining bytes out of the `Framed` read buffer and drains the rest.
//!
//! # Usage with Tokio Framed
//!
//! ```rust,no_run
//! use tokio::net::TcpStream;
//! use tokio_util::codec::Framed;
//! use futures::{SinkExt, StreamExt};
//! use doorgate_protocol::{AuthorizationRequest, ExchangeCodec};
//!
//! # async fn example(request: AuthorizationRequest) -> doorgate_core::Result<()> {
//! let stream = TcpStream::connect("127.0.0.1:8080").await?;
//! let mut framed = Framed::new(stream, ExchangeCodec::new());
//!
//! framed.send(request).await?;
//! if let Some(Ok(head)) = framed.next().await {
//!     println!("granted: {}", head.status.is_success());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Robustness
//!
//! - The head is bounded by [`MAX_HEAD_BYTES`]; a server that never finishes
//!   its headers is rejected instead of buffered without limit.
//! - A connection closed right after the status line is still decoded, since
//!   the decision only needs that line.
//! - Anything that does not start with `HTTP/1.0` or `HTTP/1.1` followed by a
//!   three-digit code is a malformed response.

use std::fmt;

use bytes::BytesMut;
use doorgate_core::constants::MAX_HEAD_BYTES;
use doorgate_core::{Error, Result};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::request::AuthorizationRequest;

/// Parsed HTTP status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub version: String,
    pub code: u16,
    pub reason: String,
}

impl StatusLine {
    /// Parse `HTTP/1.x <code> <reason>`.
    ///
    /// # Errors
    /// Returns `Error::MalformedResponse` on any deviation.
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut parts = line.splitn(3, ' ');

        let version = parts.next().unwrap_or_default();
        if version != "HTTP/1.1" && version != "HTTP/1.0" {
            return Err(Error::MalformedResponse(format!(
                "Unexpected protocol version in status line: {line:?}"
            )));
        }

        let code_text = parts.next().unwrap_or_default();
        if code_text.len() != 3 || !code_text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::MalformedResponse(format!(
                "Invalid status code in status line: {line:?}"
            )));
        }
        let code: u16 = code_text
            .parse()
            .map_err(|_| Error::MalformedResponse(format!("Invalid status code: {code_text}")))?;
        if !(100..=599).contains(&code) {
            return Err(Error::MalformedResponse(format!(
                "Status code out of range: {code}"
            )));
        }

        Ok(Self {
            version: version.to_string(),
            code,
            reason: parts.next().unwrap_or_default().trim().to_string(),
        })
    }

    /// Status line at the front of a head that is still incomplete.
    ///
    /// `None` until the first line is terminated, or when it does not parse.
    pub fn from_partial_head(buf: &[u8]) -> Option<Self> {
        let end = buf.iter().position(|&b| b == b'\n')?;
        let line = std::str::from_utf8(&buf[..end]).ok()?;
        Self::parse(line).ok()
    }

    /// `true` for any 2xx code.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.version, self.code, self.reason)
    }
}

/// Status line plus the headers the client cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: StatusLine,
    pub content_length: Option<usize>,
}

impl ResponseHead {
    fn parse(raw: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(raw)
            .map_err(|_| Error::MalformedResponse("Response head is not UTF-8".to_string()))?;
        let mut lines = text.split('\n').map(|line| line.trim_end_matches('\r'));

        let status = StatusLine::parse(lines.next().unwrap_or_default())?;

        let mut content_length = None;
        for line in lines {
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':')
                && name.trim().eq_ignore_ascii_case("content-length")
            {
                content_length = value.trim().parse().ok();
            }
        }

        Ok(Self {
            status,
            content_length,
        })
    }
}

/// Codec for one request/response exchange.
#[derive(Debug)]
pub struct ExchangeCodec {
    max_head_size: usize,
    head_decoded: bool,
}

impl ExchangeCodec {
    pub fn new() -> Self {
        Self::with_max_head_size(MAX_HEAD_BYTES)
    }

    pub fn with_max_head_size(max_head_size: usize) -> Self {
        Self {
            max_head_size,
            head_decoded: false,
        }
    }

    pub fn max_head_size(&self) -> usize {
        self.max_head_size
    }
}

impl Default for ExchangeCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Position just past the blank line ending the head, if present.
fn find_head_end(buf: &[u8]) -> Option<usize> {
    let crlf = buf.windows(4).position(|w| w == b"\r\n\r\n").map(|i| i + 4);
    let lf = buf.windows(2).position(|w| w == b"\n\n").map(|i| i + 2);
    match (crlf, lf) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

impl Decoder for ExchangeCodec {
    type Item = ResponseHead;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<ResponseHead>> {
        if self.head_decoded {
            return Ok(None);
        }

        let Some(end) = find_head_end(src) else {
            if src.len() > self.max_head_size {
                return Err(Error::MalformedResponse(format!(
                    "Response head exceeds {} bytes",
                    self.max_head_size
                )));
            }
            return Ok(None);
        };

        if end > self.max_head_size {
            return Err(Error::MalformedResponse(format!(
                "Response head exceeds {} bytes",
                self.max_head_size
            )));
        }

        let raw = src.split_to(end);
        let head = ResponseHead::parse(&raw)?;
        trace!(status = %head.status, content_length = ?head.content_length, "Decoded response head");
        self.head_decoded = true;
        Ok(Some(head))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<ResponseHead>> {
        if let Some(head) = self.decode(src)? {
            return Ok(Some(head));
        }
        if self.head_decoded || src.is_empty() {
            return Ok(None);
        }

        // Peer closed mid-head; the status line alone still decides.
        let raw = src.split();
        let head = ResponseHead::parse(&raw)?;
        self.head_decoded = true;
        Ok(Some(head))
    }
}

impl Encoder<AuthorizationRequest> for ExchangeCodec {
    type Error = Error;

    fn encode(&mut self, request: AuthorizationRequest, dst: &mut BytesMut) -> Result<()> {
        request.write_to(dst);
        Ok(())
    }
}
