//! Core constants for the Doorgate endpoint.
//!
//! Timing defaults come from the calibration of the reference door mechanism
//! (a continuous-rotation servo driving the latch). They are defaults only:
//! every duration here can be overridden in the configuration file.
//!
//! # Usage
//!
//! ```
//! use doorgate_core::constants::*;
//! use std::time::Duration;
//!
//! let travel = Duration::from_millis(DEFAULT_MOVEMENT_MS);
//! assert!(travel < Duration::from_millis(DEFAULT_OPEN_MS));
//! assert_eq!(BLOCK_SIZE, 16);
//! ```

// ============================================================================
// Door Timing
// ============================================================================

/// Time the mechanism needs to travel between the closed and open positions.
///
/// The drive is open-loop: after this long the controller issues the neutral
/// command. Measured on the reference latch at 360 ms.
pub const DEFAULT_MOVEMENT_MS: u64 = 360;

/// How long the door dwells open before closing automatically.
pub const DEFAULT_OPEN_MS: u64 = 3000;

/// Settle window for the manual override button.
pub const DEFAULT_DEBOUNCE_MS: u64 = 50;

/// Interval between two iterations of the control loop.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5;

// ============================================================================
// Authorization Exchange
// ============================================================================

/// Bound on establishing the connection, within the exchange deadline.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;

/// Deadline for one whole exchange, from connecting to closing.
///
/// The control loop is suspended for at most this long per scan.
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 5000;

/// Bound on draining the response body, within the exchange deadline.
pub const DEFAULT_DRAIN_TIMEOUT_MS: u64 = 1000;

/// Default authorization server port.
pub const DEFAULT_SERVER_PORT: u16 = 80;

/// Largest response head (status line plus headers) accepted from the server.
pub const MAX_HEAD_BYTES: usize = 8 * 1024;

/// Response body bytes kept as feedback text; anything beyond is discarded.
pub const MAX_BODY_BYTES: usize = 1024;

// ============================================================================
// Cipher
// ============================================================================

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// AES-128 key size in bytes.
pub const KEY_SIZE: usize = 16;

/// IV size in bytes (one cipher block).
pub const IV_SIZE: usize = BLOCK_SIZE;

/// Largest plaintext that still fits one PKCS#7-padded block.
///
/// PKCS#7 always appends at least one pad byte, so a full 16-byte payload
/// would spill into a second block.
pub const MAX_BLOCK_PAYLOAD: usize = BLOCK_SIZE - 1;

/// Number of IVs drawn from the software generator before it is reseeded
/// from the operating system.
pub const IV_RESEED_INTERVAL: u64 = 1024;

// ============================================================================
// Credentials
// ============================================================================

/// Minimum credential length in bytes.
pub const MIN_CREDENTIAL_LENGTH: usize = 1;

/// Capacity of a credential buffer.
///
/// ISO 14443 UIDs are 4, 7 or 10 bytes; the buffer leaves room for readers
/// that report longer identifiers, which the encoder then rejects explicitly.
pub const MAX_CREDENTIAL_LENGTH: usize = 32;

// ============================================================================
// Configuration
// ============================================================================

/// Environment variable that may carry the encryption key instead of the
/// configuration file.
pub const KEY_ENV_VAR: &str = "DOORGATE_KEY";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_defaults_are_ordered() {
        assert!(DEFAULT_DEBOUNCE_MS < DEFAULT_MOVEMENT_MS);
        assert!(DEFAULT_MOVEMENT_MS < DEFAULT_OPEN_MS);
        assert!(DEFAULT_POLL_INTERVAL_MS < DEFAULT_DEBOUNCE_MS);
    }

    #[test]
    fn test_block_payload_leaves_room_for_padding() {
        assert_eq!(MAX_BLOCK_PAYLOAD + 1, BLOCK_SIZE);
        assert_eq!(IV_SIZE, BLOCK_SIZE);
    }
}
