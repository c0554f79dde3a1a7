//! Authorization request: JSON payload plus the HTTP/1.1 envelope.
//!
//! ```text
//! POST / HTTP/1.1
//! Host: <server>
//! Content-Type: application/json
//! Content-Length: <n>
//! Connection: close
//!
//! {"UUID":"<device-id>","iv":"<32 hex>","content":"<32 hex>"}
//! ```

use bytes::{BufMut, BytesMut};
use doorgate_core::{DeviceId, Error, Result};
use serde::{Deserialize, Serialize};

use crate::encoder::SealedCredential;

/// JSON body of an authorization request.
///
/// Only the sealed credential is carried; the plaintext never leaves the
/// device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationPayload {
    #[serde(rename = "UUID")]
    pub uuid: String,
    pub iv: String,
    pub content: String,
}

impl AuthorizationPayload {
    pub fn new(device_id: &DeviceId, sealed: &SealedCredential) -> Self {
        Self {
            uuid: device_id.to_string(),
            iv: sealed.iv_hex(),
            content: sealed.ciphertext_hex(),
        }
    }

    /// # Errors
    /// Returns `Error::RequestEncoding` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::RequestEncoding(e.to_string()))
    }
}

/// A complete request ready for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    host: String,
    body: String,
}

impl AuthorizationRequest {
    /// Build a request for `host` (the value of the `Host` header).
    ///
    /// # Errors
    /// Returns `Error::RequestEncoding` if the host contains characters that
    /// would break the header block, or if the payload cannot be serialized.
    pub fn new(host: impl Into<String>, payload: &AuthorizationPayload) -> Result<Self> {
        let host = host.into();
        if host.is_empty() || host.chars().any(|c| c.is_control() || c.is_whitespace()) {
            return Err(Error::RequestEncoding(format!("Invalid Host header: {host:?}")));
        }
        Ok(Self {
            host,
            body: payload.to_json()?,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Append the wire form of the request to `dst`.
    pub fn write_to(&self, dst: &mut BytesMut) {
        let head = format!(
            "POST / HTTP/1.1\r\n\
             Host: {}\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\
             \r\n",
            self.host,
            self.body.len()
        );
        dst.reserve(head.len() + self.body.len());
        dst.put_slice(head.as_bytes());
        dst.put_slice(self.body.as_bytes());
    }

    /// The wire form as a fresh buffer.
    pub fn to_bytes(&self) -> BytesMut {
        let mut buf = BytesMut::new();
        self.write_to(&mut buf);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encrypt_block;
    use doorgate_core::EncryptionKey;

    const DEVICE: &str = "6f9619ff-8b86-d011-b42d-00c04fc964ff";

    fn golden_payload() -> AuthorizationPayload {
        let key = EncryptionKey::from_hex("2b7e151628aed2a6abf7158809cf4f3c").unwrap();
        let iv: [u8; 16] = core::array::from_fn(|i| i as u8);
        let sealed = encrypt_block(&key, &iv, &[0x12, 0x34, 0x56, 0x78]).unwrap();
        AuthorizationPayload::new(&DEVICE.parse().unwrap(), &sealed)
    }

    #[test]
    fn test_payload_json_shape() {
        let json = golden_payload().to_json().unwrap();
        assert_eq!(
            json,
            r#"{"UUID":"6f9619ff-8b86-d011-b42d-00c04fc964ff","iv":"000102030405060708090a0b0c0d0e0f","content":"fe5983fe39140660545f4db15f240024"}"#
        );
    }

    #[test]
    fn test_payload_fields_are_32_hex_chars() {
        let value: serde_json::Value = serde_json::from_str(&golden_payload().to_json().unwrap()).unwrap();
        for field in ["iv", "content"] {
            let text = value[field].as_str().unwrap();
            assert_eq!(text.len(), 32, "{field}");
            assert!(text.chars().all(|c| c.is_ascii_hexdigit()));
        }
        assert_eq!(value["UUID"], DEVICE);
    }

    #[test]
    fn test_request_wire_format() {
        let request = AuthorizationRequest::new("auth.local:8080", &golden_payload()).unwrap();
        let wire = String::from_utf8(request.to_bytes().to_vec()).unwrap();

        let (head, body) = wire.split_once("\r\n\r\n").unwrap();
        let lines: Vec<&str> = head.split("\r\n").collect();

        assert_eq!(lines[0], "POST / HTTP/1.1");
        assert!(lines.contains(&"Host: auth.local:8080"));
        assert!(lines.contains(&"Content-Type: application/json"));
        assert!(lines.contains(&format!("Content-Length: {}", body.len()).as_str()));
        assert!(lines.contains(&"Connection: close"));
        assert_eq!(body, request.body());
    }

    #[test]
    fn test_request_rejects_header_injection() {
        let payload = golden_payload();
        assert!(AuthorizationRequest::new("evil\r\nX-Injected: 1", &payload).is_err());
        assert!(AuthorizationRequest::new("", &payload).is_err());
        assert!(AuthorizationRequest::new("two words", &payload).is_err());
    }

    #[test]
    fn test_body_contains_no_plaintext() {
        let request = AuthorizationRequest::new("auth.local", &golden_payload()).unwrap();
        assert!(!request.body().contains("12345678"));
    }
}
