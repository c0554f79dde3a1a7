//! Wire-level pieces of the authorization exchange.
//!
//! - [`encoder`]: seals a credential into one AES-128-CBC block.
//! - [`iv`]: fresh initialization vectors for every request.
//! - [`request`]: the JSON payload and the HTTP request around it.
//! - [`codec`]: a Tokio codec writing requests and decoding response heads.
//!
//! ```
//! use doorgate_core::{DeviceId, EncryptionKey};
//! use doorgate_protocol::{AuthorizationPayload, CredentialEncoder, OsIvSource};
//!
//! # fn main() -> doorgate_core::Result<()> {
//! let key = EncryptionKey::from_hex("2b7e151628aed2a6abf7158809cf4f3c")?;
//! let mut encoder = CredentialEncoder::new(key, OsIvSource);
//! let sealed = encoder.seal(&[0x04, 0xAB, 0xCD, 0xEF])?;
//!
//! let payload = AuthorizationPayload::new(&DeviceId::generate(), &sealed);
//! assert_eq!(payload.iv.len(), 32);
//! assert_eq!(payload.content.len(), 32);
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod encoder;
pub mod iv;
pub mod request;

pub use codec::{ExchangeCodec, ResponseHead, StatusLine};
pub use encoder::{CredentialEncoder, SealedCredential, decrypt_block, encrypt_block};
pub use iv::{IvSource, OsIvSource, ReseedingIvSource};
pub use request::{AuthorizationPayload, AuthorizationRequest};
