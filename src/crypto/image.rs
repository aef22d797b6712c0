// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! AES-256-GCM encryption of binary blobs (card photographs).
//!
//! Layout of an encrypted blob, written to object storage as-is:
//!
//! ```text
//! [ 12-byte nonce | 16-byte auth tag | ciphertext ]
//! ```

use std::sync::Arc;

use aes_gcm::aead::{AeadInPlace, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce, Tag};

use super::field::{NONCE_LEN, TAG_LEN};
use super::{CryptoError, CryptoResult, EncryptionKey};

/// Shortest blob that can possibly be decrypted.
pub const HEADER_LEN: usize = NONCE_LEN + TAG_LEN;

/// Image cipher bound to a single key.
#[derive(Clone)]
pub struct ImageCipher {
    key: Arc<EncryptionKey>,
}

impl ImageCipher {
    pub fn new(key: Arc<EncryptionKey>) -> Self {
        Self { key }
    }

    /// Encrypt `bytes` into a single `nonce | tag | ciphertext` buffer.
    pub fn encrypt(&self, bytes: &[u8]) -> CryptoResult<Vec<u8>> {
        if bytes.is_empty() {
            return Err(CryptoError::EmptyPayload);
        }

        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let mut output = Vec::with_capacity(HEADER_LEN + bytes.len());
        output.extend_from_slice(&nonce);
        output.extend_from_slice(&[0u8; TAG_LEN]);
        output.extend_from_slice(bytes);

        let tag = self
            .key
            .cipher()
            .encrypt_in_place_detached(&nonce, b"", &mut output[HEADER_LEN..])
            .map_err(|e| CryptoError::EncryptionFailed(format!("AES-GCM error: {e}")))?;
        output[NONCE_LEN..HEADER_LEN].copy_from_slice(&tag);

        Ok(output)
    }

    /// Decrypt a blob produced by [`ImageCipher::encrypt`].
    ///
    /// Blobs shorter than the header are rejected before any AES work.
    pub fn decrypt(&self, blob: &[u8]) -> CryptoResult<Vec<u8>> {
        if blob.len() < HEADER_LEN {
            return Err(CryptoError::MalformedCiphertext(format!(
                "blob is {} bytes, header alone is {HEADER_LEN}",
                blob.len()
            )));
        }

        let (nonce, rest) = blob.split_at(NONCE_LEN);
        let (tag, ciphertext) = rest.split_at(TAG_LEN);

        let mut buffer = ciphertext.to_vec();
        self.key
            .cipher()
            .decrypt_in_place_detached(
                Nonce::from_slice(nonce),
                b"",
                &mut buffer,
                Tag::from_slice(tag),
            )
            .map_err(|_| CryptoError::DecryptionFailed)?;

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> ImageCipher {
        ImageCipher::new(Arc::new(EncryptionKey::generate()))
    }

    fn jpeg_like() -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
        bytes.extend((0..2048u32).map(|i| (i % 251) as u8));
        bytes
    }

    #[test]
    fn round_trip_recovers_bytes() {
        let cipher = cipher();
        let image = jpeg_like();
        let blob = cipher.encrypt(&image).unwrap();

        assert_eq!(blob.len(), HEADER_LEN + image.len());
        assert_eq!(cipher.decrypt(&blob).unwrap(), image);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            cipher().encrypt(&[]),
            Err(CryptoError::EmptyPayload)
        ));
    }

    #[test]
    fn truncated_blob_is_rejected_before_decryption() {
        let cipher = cipher();
        for len in [0, 1, NONCE_LEN, HEADER_LEN - 1] {
            let result = cipher.decrypt(&vec![0u8; len]);
            assert!(matches!(result, Err(CryptoError::MalformedCiphertext(_))));
        }
    }

    #[test]
    fn tampered_blob_fails_closed() {
        let cipher = cipher();
        let mut blob = cipher.encrypt(&jpeg_like()).unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0x01;

        assert!(matches!(
            cipher.decrypt(&blob),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn wrong_key_fails_closed() {
        let blob = cipher().encrypt(&jpeg_like()).unwrap();
        assert!(matches!(
            cipher().decrypt(&blob),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn encryptions_use_fresh_nonces() {
        let cipher = cipher();
        let image = jpeg_like();
        let a = cipher.encrypt(&image).unwrap();
        let b = cipher.encrypt(&image).unwrap();
        assert_ne!(a[..NONCE_LEN], b[..NONCE_LEN]);
    }
}
