//! Credential encoder: one AES-128-CBC block with PKCS#7 padding.
//!
//! The credential bytes are copied into a 16-byte block and the remaining
//! `P = 16 - len` bytes are set to `P`. Because PKCS#7 always adds at least
//! one pad byte, the single-block contract caps the credential at
//! [`MAX_BLOCK_PAYLOAD`] (15) bytes. Longer or empty input is rejected with
//! [`Error::CredentialLength`]; nothing is ever truncated.
//!
//! # Example
//!
//! ```
//! use doorgate_core::EncryptionKey;
//! use doorgate_protocol::encrypt_block;
//!
//! let key = EncryptionKey::from_hex("2b7e151628aed2a6abf7158809cf4f3c").unwrap();
//! let iv: [u8; 16] = core::array::from_fn(|i| i as u8);
//!
//! let sealed = encrypt_block(&key, &iv, &[0x12, 0x34, 0x56, 0x78]).unwrap();
//! assert_eq!(sealed.ciphertext_hex(), "fe5983fe39140660545f4db15f240024");
//! ```

use aes::Aes128;
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use doorgate_core::constants::{BLOCK_SIZE, IV_SIZE, MAX_BLOCK_PAYLOAD, MIN_CREDENTIAL_LENGTH};
use doorgate_core::{EncryptionKey, Error, Result};
use tracing::error;

use crate::iv::IvSource;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// IV and ciphertext of one sealed credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SealedCredential {
    pub iv: [u8; IV_SIZE],
    pub ciphertext: [u8; BLOCK_SIZE],
}

impl SealedCredential {
    /// IV as 32 lowercase hex characters.
    pub fn iv_hex(&self) -> String {
        hex::encode(self.iv)
    }

    /// Ciphertext as 32 lowercase hex characters.
    pub fn ciphertext_hex(&self) -> String {
        hex::encode(self.ciphertext)
    }
}

/// Encrypt `plaintext` into exactly one padded block under `key` and `iv`.
///
/// # Errors
///
/// Returns `Error::CredentialLength` if `plaintext` is empty or longer than
/// [`MAX_BLOCK_PAYLOAD`] bytes.
pub fn encrypt_block(
    key: &EncryptionKey,
    iv: &[u8; IV_SIZE],
    plaintext: &[u8],
) -> Result<SealedCredential> {
    let len = plaintext.len();
    check_payload_len(len)?;

    let mut block = [0u8; BLOCK_SIZE];
    block[..len].copy_from_slice(plaintext);

    let ciphertext = Aes128CbcEnc::new(key.as_bytes().into(), iv.into())
        .encrypt_padded_mut::<Pkcs7>(&mut block, len)
        .map_err(|_| Error::Crypto("padded plaintext exceeds one block".to_string()))?;

    let ciphertext: [u8; BLOCK_SIZE] = ciphertext
        .try_into()
        .map_err(|_| Error::Crypto("ciphertext is not exactly one block".to_string()))?;

    Ok(SealedCredential {
        iv: *iv,
        ciphertext,
    })
}

fn check_payload_len(len: usize) -> Result<()> {
    if !(MIN_CREDENTIAL_LENGTH..=MAX_BLOCK_PAYLOAD).contains(&len) {
        error!(len, max = MAX_BLOCK_PAYLOAD, "Credential does not fit one cipher block");
        return Err(Error::CredentialLength {
            len,
            min: MIN_CREDENTIAL_LENGTH,
            max: MAX_BLOCK_PAYLOAD,
        });
    }
    Ok(())
}

/// Decrypt one block and strip its PKCS#7 padding.
///
/// The endpoint never needs this at runtime; it exists for verification
/// tooling and for the server side of tests.
///
/// # Errors
///
/// Returns `Error::Crypto` if the padding is invalid (wrong key, wrong IV or
/// corrupted ciphertext).
pub fn decrypt_block(
    key: &EncryptionKey,
    iv: &[u8; IV_SIZE],
    ciphertext: &[u8; BLOCK_SIZE],
) -> Result<Vec<u8>> {
    let mut block = *ciphertext;
    let plaintext = Aes128CbcDec::new(key.as_bytes().into(), iv.into())
        .decrypt_padded_mut::<Pkcs7>(&mut block)
        .map_err(|_| Error::Crypto("invalid padding".to_string()))?;
    Ok(plaintext.to_vec())
}

/// Seals credentials under a fixed key with a fresh IV per call.
pub struct CredentialEncoder<S> {
    key: EncryptionKey,
    iv_source: S,
}

impl<S: IvSource> CredentialEncoder<S> {
    pub fn new(key: EncryptionKey, iv_source: S) -> Self {
        Self { key, iv_source }
    }

    /// Seal one credential.
    ///
    /// The length is checked before an IV is drawn.
    ///
    /// # Errors
    ///
    /// Returns `Error::CredentialLength` for out-of-range input and
    /// `Error::Entropy` if no IV could be generated.
    pub fn seal(&mut self, credential: &[u8]) -> Result<SealedCredential> {
        check_payload_len(credential.len())?;
        let iv = self.iv_source.next_iv()?;
        encrypt_block(&self.key, &iv, credential)
    }
}

impl<S> std::fmt::Debug for CredentialEncoder<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialEncoder")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
