//! Property-based tests for the credential encoder and response parsing.
//!
//! These tests use proptest to generate random keys, IVs and credentials and
//! verify that the single-block invariants hold for every accepted input.

use aes::Aes128;
use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, KeyIvInit};
use bytes::BytesMut;
use doorgate_core::{DeviceId, EncryptionKey, Error};
use doorgate_protocol::{
    AuthorizationPayload, AuthorizationRequest, ExchangeCodec, StatusLine, decrypt_block,
    encrypt_block,
};
use proptest::prelude::*;
use tokio_util::codec::Decoder;

/// Strategy for credentials that fit one block (1-15 bytes).
fn fitting_credential() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..=15)
}

/// Strategy for credentials that never fit (16-64 bytes).
fn oversized_credential() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 16..=64)
}

fn raw_block(key: &[u8; 16], iv: &[u8; 16], ciphertext: &[u8; 16]) -> [u8; 16] {
    let mut block = *ciphertext;
    cbc::Decryptor::<Aes128>::new(key.into(), iv.into())
        .decrypt_padded_mut::<NoPadding>(&mut block)
        .unwrap();
    block
}

proptest! {
    /// Property: the decrypted block is the credential followed by
    /// `16 - len` copies of `16 - len`.
    #[test]
    fn prop_padding_layout(
        key in any::<[u8; 16]>(),
        iv in any::<[u8; 16]>(),
        credential in fitting_credential(),
    ) {
        let sealed = encrypt_block(&EncryptionKey::new(key), &iv, &credential).unwrap();
        let block = raw_block(&key, &iv, &sealed.ciphertext);

        let len = credential.len();
        let pad = (16 - len) as u8;
        prop_assert_eq!(&block[..len], credential.as_slice());
        prop_assert!(block[len..].iter().all(|&b| b == pad));
        prop_assert_eq!(sealed.iv, iv);
    }

    /// Property: decrypting with the same key and IV recovers the credential.
    #[test]
    fn prop_decrypt_recovers(
        key in any::<[u8; 16]>(),
        iv in any::<[u8; 16]>(),
        credential in fitting_credential(),
    ) {
        let key = EncryptionKey::new(key);
        let sealed = encrypt_block(&key, &iv, &credential).unwrap();
        prop_assert_eq!(decrypt_block(&key, &iv, &sealed.ciphertext).unwrap(), credential);
    }

    /// Property: nothing of 16 bytes or more is ever truncated into a block.
    #[test]
    fn prop_oversized_rejected(
        key in any::<[u8; 16]>(),
        iv in any::<[u8; 16]>(),
        credential in oversized_credential(),
    ) {
        let result = encrypt_block(&EncryptionKey::new(key), &iv, &credential);
        let is_length_error = matches!(result, Err(Error::CredentialLength { .. }));
        prop_assert!(is_length_error);
    }

    /// Property: the JSON body always carries two 32-char lowercase hex fields.
    #[test]
    fn prop_payload_hex_fields(
        key in any::<[u8; 16]>(),
        iv in any::<[u8; 16]>(),
        credential in fitting_credential(),
    ) {
        let sealed = encrypt_block(&EncryptionKey::new(key), &iv, &credential).unwrap();
        let payload = AuthorizationPayload::new(&DeviceId::generate(), &sealed);

        for field in [&payload.iv, &payload.content] {
            prop_assert_eq!(field.len(), 32);
            prop_assert!(field.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
        }
        prop_assert_eq!(hex::decode(&payload.iv).unwrap(), iv.to_vec());
    }

    /// Property: Content-Length always matches the body.
    #[test]
    fn prop_request_content_length(
        iv in any::<[u8; 16]>(),
        credential in fitting_credential(),
    ) {
        let key = EncryptionKey::new([7u8; 16]);
        let sealed = encrypt_block(&key, &iv, &credential).unwrap();
        let payload = AuthorizationPayload::new(&DeviceId::generate(), &sealed);
        let request = AuthorizationRequest::new("auth.local", &payload).unwrap();

        let wire = String::from_utf8(request.to_bytes().to_vec()).unwrap();
        let (_, body) = wire.split_once("\r\n\r\n").unwrap();
        let expected = format!("Content-Length: {}\r\n", body.len());
        prop_assert!(wire.contains(&expected));
    }

    /// Property: a status code grants iff it is 2xx.
    #[test]
    fn prop_status_classification(code in 100u16..=599) {
        let status = StatusLine::parse(&format!("HTTP/1.1 {code} Reason")).unwrap();
        prop_assert_eq!(status.is_success(), (200..300).contains(&code));
    }

    /// Property: the head decoder never panics on arbitrary input.
    #[test]
    fn prop_decoder_total(data in prop::collection::vec(any::<u8>(), 0..512)) {
        let mut codec = ExchangeCodec::new();
        let mut buf = BytesMut::from(&data[..]);
        let _ = codec.decode(&mut buf);
        let _ = codec.decode_eof(&mut buf);
    }
}
