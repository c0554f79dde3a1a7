//! Network layer for doorgate.
//!
//! This crate performs the encrypted authorization exchange with the remote
//! server. It owns connection establishment, the request/response cycle and
//! its timeouts, and implements [`doorgate_core::Authorizer`] so the entry
//! controller never sees the transport.
//!
//! # Components
//!
//! - **AuthorizationClient**: one bounded exchange per credential
//! - **Connector**: how the byte stream is opened (plain TCP by default)
//!
//! # Example
//!
//! ```no_run
//! use doorgate_core::{DeviceId, EncryptionKey, Credential};
//! use doorgate_network::{AuthorizationClient, AuthorizationClientConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = AuthorizationClient::new(
//!     AuthorizationClientConfig::default(),
//!     "6f9619ff-8b86-d011-b42d-00c04fc964ff".parse::<DeviceId>()?,
//!     EncryptionKey::from_hex("2b7e151628aed2a6abf7158809cf4f3c")?,
//! );
//!
//! match client.exchange(&Credential::new(vec![0x12, 0x34, 0x56, 0x78])?).await {
//!     Ok(result) => println!("granted: {}", result.granted),
//!     Err(e) => println!("no decision: {e}"),
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod connector;

pub use client::{
    AuthorizationClient, AuthorizationClientConfig, AuthorizationError, ExchangeStage,
    ExchangeStats,
};
pub use connector::{Connector, TcpConnector};
