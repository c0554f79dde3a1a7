//! Shared building blocks for the Doorgate access-control endpoint.
//!
//! This crate holds everything the other workspace members agree on: the
//! credential and identity types, the immutable process configuration, the
//! [`Authorizer`] seam between the entry controller and the network, and the
//! common error type.

pub mod authorizer;
pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use authorizer::{AuthorizationResult, Authorizer};
pub use config::{DoorgateConfig, Settings};
pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
