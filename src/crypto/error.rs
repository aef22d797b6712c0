// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Errors raised by the field and image ciphers.

use thiserror::Error;

/// Result type for cipher operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Failure classes of the AES-256-GCM ciphers.
///
/// `DecryptionFailed` is deliberately distinct from every "no value" case:
/// a wrong key or tampered token is never reported as an empty field.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid encryption key: {0}")]
    InvalidKey(String),

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("malformed ciphertext: {0}")]
    MalformedCiphertext(String),

    #[error("decryption failed: wrong key or tampered ciphertext")]
    DecryptionFailed,

    #[error("refusing to encrypt an empty payload")]
    EmptyPayload,
}
