// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! AES-256-GCM encryption of short text fields (card number, CVV, expiry).
//!
//! Each call draws a fresh 12-byte nonce. The result is a text token with
//! three base64 segments:
//!
//! ```text
//! base64(nonce) ":" base64(tag) ":" base64(ciphertext)
//! ```

use std::sync::Arc;

use aes_gcm::aead::{AeadInPlace, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce, Tag};
use base64ct::{Base64, Encoding};

use super::{CryptoError, CryptoResult, EncryptionKey};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the AES-256-GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Separator between the three token segments. Not part of the base64 alphabet.
pub const SEGMENT_DELIMITER: char = ':';

/// Seals and opens individual text fields.
///
/// The record adapter is written against this trait so tests can inject
/// failures at a chosen field.
pub trait FieldSealer: Send + Sync {
    /// Encrypt `plaintext`. Blank input yields `Ok(None)`.
    fn seal(&self, plaintext: &str) -> CryptoResult<Option<String>>;

    /// Decrypt a token produced by [`FieldSealer::seal`].
    fn open(&self, token: &str) -> CryptoResult<String>;
}

/// Field cipher bound to a single key.
#[derive(Clone)]
pub struct FieldCipher {
    key: Arc<EncryptionKey>,
}

impl FieldCipher {
    pub fn new(key: Arc<EncryptionKey>) -> Self {
        Self { key }
    }

    /// Encrypt a text field.
    ///
    /// Empty or whitespace-only input is treated as "no value" and returns
    /// `Ok(None)`; absent sensitive data is normal.
    pub fn encrypt(&self, plaintext: &str) -> CryptoResult<Option<String>> {
        if plaintext.trim().is_empty() {
            return Ok(None);
        }

        let cipher = self.key.cipher();
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let mut buffer = plaintext.as_bytes().to_vec();
        let tag = cipher
            .encrypt_in_place_detached(&nonce, b"", &mut buffer)
            .map_err(|e| CryptoError::EncryptionFailed(format!("AES-GCM error: {e}")))?;

        Ok(Some(format!(
            "{}{SEGMENT_DELIMITER}{}{SEGMENT_DELIMITER}{}",
            Base64::encode_string(&nonce),
            Base64::encode_string(&tag),
            Base64::encode_string(&buffer),
        )))
    }

    /// Decrypt a field token.
    ///
    /// Exactly three segments are required. A tag mismatch (tampering or a
    /// different key) fails with [`CryptoError::DecryptionFailed`].
    pub fn decrypt(&self, token: &str) -> CryptoResult<String> {
        let segments: Vec<&str> = token.split(SEGMENT_DELIMITER).collect();
        let [nonce_b64, tag_b64, ciphertext_b64] = segments.as_slice() else {
            return Err(CryptoError::MalformedCiphertext(format!(
                "expected 3 segments, found {}",
                segments.len()
            )));
        };

        let nonce = decode_segment("nonce", nonce_b64)?;
        let tag = decode_segment("tag", tag_b64)?;
        let mut buffer = decode_segment("ciphertext", ciphertext_b64)?;

        if nonce.len() != NONCE_LEN {
            return Err(CryptoError::MalformedCiphertext(format!(
                "nonce must be {NONCE_LEN} bytes, got {}",
                nonce.len()
            )));
        }
        if tag.len() != TAG_LEN {
            return Err(CryptoError::MalformedCiphertext(format!(
                "tag must be {TAG_LEN} bytes, got {}",
                tag.len()
            )));
        }

        self.key
            .cipher()
            .decrypt_in_place_detached(
                Nonce::from_slice(&nonce),
                b"",
                &mut buffer,
                Tag::from_slice(&tag),
            )
            .map_err(|_| CryptoError::DecryptionFailed)?;

        String::from_utf8(buffer).map_err(|_| {
            CryptoError::MalformedCiphertext("plaintext is not valid UTF-8".to_string())
        })
    }
}

impl FieldSealer for FieldCipher {
    fn seal(&self, plaintext: &str) -> CryptoResult<Option<String>> {
        self.encrypt(plaintext)
    }

    fn open(&self, token: &str) -> CryptoResult<String> {
        self.decrypt(token)
    }
}

fn decode_segment(name: &str, segment: &str) -> CryptoResult<Vec<u8>> {
    Base64::decode_vec(segment)
        .map_err(|e| CryptoError::MalformedCiphertext(format!("{name} segment: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> FieldCipher {
        FieldCipher::new(Arc::new(EncryptionKey::generate()))
    }

    fn flip_ciphertext_byte(token: &str, index: usize) -> String {
        let parts: Vec<&str> = token.split(SEGMENT_DELIMITER).collect();
        let mut ciphertext = Base64::decode_vec(parts[2]).unwrap();
        ciphertext[index] ^= 0x01;
        format!(
            "{}:{}:{}",
            parts[0],
            parts[1],
            Base64::encode_string(&ciphertext)
        )
    }

    #[test]
    fn round_trip_recovers_plaintext() {
        let cipher = cipher();
        for plaintext in ["4111111111111111", "123", "12/29", "naïve ünïcode ✓"] {
            let token = cipher.encrypt(plaintext).unwrap().unwrap();
            assert_eq!(cipher.decrypt(&token).unwrap(), plaintext);
        }
    }

    #[test]
    fn blank_plaintext_is_no_value() {
        let cipher = cipher();
        assert!(cipher.encrypt("").unwrap().is_none());
        assert!(cipher.encrypt("   ").unwrap().is_none());
    }

    #[test]
    fn same_plaintext_yields_different_tokens() {
        let cipher = cipher();
        let a = cipher.encrypt("4111111111111111").unwrap().unwrap();
        let b = cipher.encrypt("4111111111111111").unwrap().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn token_has_three_segments() {
        let token = cipher().encrypt("secret").unwrap().unwrap();
        let parts: Vec<&str> = token.split(SEGMENT_DELIMITER).collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(Base64::decode_vec(parts[0]).unwrap().len(), NONCE_LEN);
        assert_eq!(Base64::decode_vec(parts[1]).unwrap().len(), TAG_LEN);
    }

    #[test]
    fn every_flipped_ciphertext_byte_is_detected() {
        let cipher = cipher();
        let plaintext = "4111111111111111";
        let token = cipher.encrypt(plaintext).unwrap().unwrap();

        for index in 0..plaintext.len() {
            let tampered = flip_ciphertext_byte(&token, index);
            let result = cipher.decrypt(&tampered);
            assert!(
                matches!(result, Err(CryptoError::DecryptionFailed)),
                "byte {index} tamper was not detected"
            );
        }
    }

    #[test]
    fn tampered_tag_is_detected() {
        let cipher = cipher();
        let token = cipher.encrypt("123").unwrap().unwrap();
        let parts: Vec<&str> = token.split(SEGMENT_DELIMITER).collect();
        let mut tag = Base64::decode_vec(parts[1]).unwrap();
        tag[0] ^= 0x80;
        let tampered = format!("{}:{}:{}", parts[0], Base64::encode_string(&tag), parts[2]);

        assert!(matches!(
            cipher.decrypt(&tampered),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn wrong_key_is_rejected() {
        let token = cipher().encrypt("4111111111111111").unwrap().unwrap();
        let other = cipher();
        assert!(matches!(
            other.decrypt(&token),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn wrong_segment_count_is_format_error() {
        let cipher = cipher();
        for bad in ["", "abc", "a:b", "a:b:c:d"] {
            assert!(matches!(
                cipher.decrypt(bad),
                Err(CryptoError::MalformedCiphertext(_))
            ));
        }
    }

    #[test]
    fn short_nonce_is_format_error() {
        let cipher = cipher();
        let token = cipher.encrypt("123").unwrap().unwrap();
        let parts: Vec<&str> = token.split(SEGMENT_DELIMITER).collect();
        let short = format!("{}:{}:{}", Base64::encode_string(&[0u8; 8]), parts[1], parts[2]);

        assert!(matches!(
            cipher.decrypt(&short),
            Err(CryptoError::MalformedCiphertext(_))
        ));
    }
}
