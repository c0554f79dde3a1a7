//! Connection establishment.
//!
//! The exchange only needs a byte stream; how it is opened lives behind
//! [`Connector`]. [`TcpConnector`] opens a plain TCP connection. A connector
//! that wraps the stream in TLS slots in here without touching the exchange.

#![allow(async_fn_in_trait)]

use std::io;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{debug, warn};

/// Opens the transport for one exchange.
pub trait Connector {
    type Stream: AsyncRead + AsyncWrite + Unpin;

    /// Open a connection to `host:port`.
    async fn connect(&mut self, host: &str, port: u16) -> io::Result<Self::Stream>;
}

/// Plain TCP with `TCP_NODELAY`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&mut self, host: &str, port: u16) -> io::Result<TcpStream> {
        let stream = TcpStream::connect((host, port)).await?;

        // The request is written in one go and the server answers right away;
        // Nagle would only add delay.
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {} - latency may be impacted", e);
        }

        debug!(host, port, "TCP connection established");
        Ok(stream)
    }
}
