// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Two kinds of persistence sit behind this module:
//!
//! - **Documents**: card records and share folders as JSON files, written
//!   atomically (temp file + rename) and updated under a process-wide lock so
//!   read-modify-write cycles on one document never interleave.
//! - **Objects**: card photographs behind the [`ObjectStore`] trait.
//!
//! ## Storage Layout
//!
//! ```text
//! {DATA_DIR}/
//!   cards/{card_id}.json        # Sensitive fields sealed per field
//!   folders/{folder_id}.json    # Members, active link, share history
//!   objects/images/...          # Card photographs (".encrypted" when sealed)
//!   audit/{date}/events.jsonl   # Daily audit logs
//! ```
//!
//! ## Important Notes
//!
//! - Nothing here encrypts. Callers seal records and images before writing.
//! - Ownership is enforced by callers through [`OwnershipEnforcer`].

pub mod audit;
pub mod document_fs;
pub mod images;
pub mod object_store;
pub mod ownership;
pub mod paths;
pub mod repository;

pub use audit::{AuditEvent, AuditEventType, AuditRepository};
pub use document_fs::{DocumentStorage, StorageError, StorageResult};
pub use images::{encrypt_stored_image, get_decrypted_image, get_plain_image, ImageError};
pub use object_store::{FsObjectStore, MemoryObjectStore, ObjectStore};
pub use ownership::{OwnedResource, OwnershipCheck, OwnershipEnforcer};
pub use paths::{card_image_object, StoragePaths};
pub use repository::{
    CardCategory, CardRepository, FolderRepository, ShareFolder, StoredCard, StoredImage,
};
