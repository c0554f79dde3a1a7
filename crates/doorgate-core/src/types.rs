use crate::{
    Result,
    constants::{KEY_SIZE, MAX_CREDENTIAL_LENGTH, MIN_CREDENTIAL_LENGTH},
    error::Error,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use subtle::ConstantTimeEq;
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Raw credential bytes as reported by the contactless reader.
///
/// # Security
/// Comparison is constant-time and `Debug` only reveals the length, so a
/// credential never ends up in a log line by accident.
#[derive(Clone, Eq)]
pub struct Credential(Vec<u8>);

impl Credential {
    /// Create a credential with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidCredential` if the byte sequence is empty or
    /// longer than [`MAX_CREDENTIAL_LENGTH`].
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        let len = bytes.len();
        if !(MIN_CREDENTIAL_LENGTH..=MAX_CREDENTIAL_LENGTH).contains(&len) {
            return Err(Error::InvalidCredential(format!(
                "Credential must be {MIN_CREDENTIAL_LENGTH}-{MAX_CREDENTIAL_LENGTH} bytes, got {len}"
            )));
        }
        Ok(Credential(bytes))
    }

    /// Parse a credential from a hex string (case-insensitive).
    ///
    /// # Errors
    /// Returns `Error::InvalidCredential` on malformed hex or bad length.
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let bytes = hex::decode(hex_str.trim())
            .map_err(|e| Error::InvalidCredential(format!("Invalid hex credential: {e}")))?;
        Credential::new(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(len={})", self.0.len())
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_slice().ct_eq(other.0.as_slice()).into()
    }
}

impl TryFrom<&[u8]> for Credential {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Credential::new(bytes.to_vec())
    }
}

/// Identifier of this endpoint, sent to the server as `"UUID"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(Uuid);

impl DeviceId {
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        DeviceId(id)
    }

    /// Generate a fresh random identifier (used when provisioning a device).
    #[must_use]
    pub fn generate() -> Self {
        DeviceId(Uuid::new_v4())
    }

    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl std::str::FromStr for DeviceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(DeviceId)
            .map_err(|e| Error::InvalidDeviceId(format!("{s}: {e}")))
    }
}

impl Serialize for DeviceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DeviceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// AES-128 key shared with the authorization server.
///
/// Zeroized on drop and redacted in `Debug`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey([u8; KEY_SIZE]);

impl EncryptionKey {
    #[must_use]
    pub fn new(bytes: [u8; KEY_SIZE]) -> Self {
        EncryptionKey(bytes)
    }

    /// Parse a key from exactly 32 hex characters.
    ///
    /// # Errors
    /// Returns `Error::InvalidKey` on malformed hex or wrong length.
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let hex_str = hex_str.trim();
        if hex_str.len() != KEY_SIZE * 2 {
            return Err(Error::InvalidKey(format!(
                "Key must be {} hex characters, got {}",
                KEY_SIZE * 2,
                hex_str.len()
            )));
        }
        let mut bytes = [0u8; KEY_SIZE];
        hex::decode_to_slice(hex_str, &mut bytes)
            .map_err(|e| Error::InvalidKey(format!("Invalid hex key: {e}")))?;
        Ok(EncryptionKey(bytes))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(<redacted>)")
    }
}
