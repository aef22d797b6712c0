// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Encryption of card images already sitting in the object store.
//!
//! The plaintext object is only deleted after the encrypted copy has been
//! written. A crash in between leaves both objects behind, never neither.

use thiserror::Error;

use crate::crypto::{CryptoError, ImageCipher};

use super::{ObjectStore, StorageError};

/// Suffix appended to an object name once its content is encrypted.
pub const ENCRYPTED_SUFFIX: &str = ".encrypted";

/// Errors raised by the image workflow.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image not found: {0}")]
    NotFound(String),

    /// Anything that prevents returning displayable bytes.
    #[error("image unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Object name of the encrypted copy of `path`.
pub fn encrypted_object_name(path: &str) -> String {
    format!("{path}{ENCRYPTED_SUFFIX}")
}

/// Encrypt the object at `path` in place.
///
/// Downloads the plaintext, writes the ciphertext to `path + ".encrypted"`,
/// then deletes the plaintext. Returns the new object name.
pub fn encrypt_stored_image(
    store: &dyn ObjectStore,
    cipher: &ImageCipher,
    path: &str,
) -> Result<String, ImageError> {
    if !store.exists(path)? {
        return Err(ImageError::NotFound(path.to_string()));
    }

    let plaintext = store.download(path)?;
    let blob = cipher.encrypt(&plaintext)?;

    let encrypted_path = encrypted_object_name(path);
    store.upload(&encrypted_path, &blob)?;

    if let Err(e) = store.delete(path) {
        // The encrypted copy is already durable at this point.
        tracing::warn!(
            object = %path,
            error = %e,
            "Encrypted image written but plaintext original could not be deleted"
        );
    }

    tracing::debug!(object = %encrypted_path, "Card image encrypted");
    Ok(encrypted_path)
}

/// Download and decrypt an encrypted image.
///
/// Every failure (missing object, corrupt blob, wrong key) is reported as
/// [`ImageError::Unavailable`]. The raw ciphertext is never returned.
pub fn get_decrypted_image(
    store: &dyn ObjectStore,
    cipher: &ImageCipher,
    encrypted_path: &str,
) -> Result<Vec<u8>, ImageError> {
    let blob = match store.exists(encrypted_path) {
        Ok(true) => store.download(encrypted_path),
        Ok(false) => Err(StorageError::NotFound(encrypted_path.to_string())),
        Err(e) => Err(e),
    }
    .map_err(|e| ImageError::Unavailable(e.to_string()))?;

    cipher
        .decrypt(&blob)
        .map_err(|e| ImageError::Unavailable(e.to_string()))
}

/// Download a plaintext image, mapping every failure to `Unavailable`.
pub fn get_plain_image(store: &dyn ObjectStore, path: &str) -> Result<Vec<u8>, ImageError> {
    store
        .download(path)
        .map_err(|e| ImageError::Unavailable(e.to_string()))
}
