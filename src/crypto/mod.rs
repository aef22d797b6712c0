// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Encryption Module
//!
//! AES-256-GCM encryption of card data, keyed by a single process-wide key
//! that is injected at construction time.
//!
//! - `field` - short text fields, encoded as `nonce:tag:ciphertext` tokens
//! - `image` - binary blobs, laid out as `nonce | tag | ciphertext`
//! - `record` - applies the field cipher to the sensitive card attributes

pub mod error;
pub mod field;
pub mod image;
pub mod key;
pub mod record;

use std::sync::Arc;

pub use error::{CryptoError, CryptoResult};
pub use field::{FieldCipher, FieldSealer};
pub use image::ImageCipher;
pub use key::EncryptionKey;
pub use record::{RecordCipher, SensitiveField, SensitiveFields, SensitiveValue};

/// The ciphers a request handler needs, all bound to the same key.
#[derive(Clone)]
pub struct CipherSuite {
    records: RecordCipher,
    images: ImageCipher,
}

impl CipherSuite {
    pub fn new(key: EncryptionKey) -> Self {
        let key = Arc::new(key);
        Self {
            records: RecordCipher::new(FieldCipher::new(Arc::clone(&key))),
            images: ImageCipher::new(key),
        }
    }

    pub fn records(&self) -> &RecordCipher {
        &self.records
    }

    pub fn images(&self) -> &ImageCipher {
        &self.images
    }
}
