// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path constants and utilities for the data directory layout.
//!
//! ```text
//! {root}/
//!   cards/{card_id}.json
//!   folders/{folder_id}.json
//!   objects/images/{card_id}/{uuid}.jpg[.encrypted]
//!   audit/{date}/events.jsonl
//! ```

use std::path::{Path, PathBuf};

/// Default data directory when `DATA_DIR` is not set.
pub const DATA_ROOT: &str = "./data";

/// Storage path utilities for the data directory.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== Card Paths ==========

    /// Directory containing all card records.
    pub fn cards_dir(&self) -> PathBuf {
        self.root.join("cards")
    }

    /// Path to a specific card record.
    pub fn card(&self, card_id: &str) -> PathBuf {
        self.cards_dir().join(format!("{card_id}.json"))
    }

    // ========== Folder Paths ==========

    /// Directory containing all share folders.
    pub fn folders_dir(&self) -> PathBuf {
        self.root.join("folders")
    }

    /// Path to a specific folder document.
    pub fn folder(&self, folder_id: &str) -> PathBuf {
        self.folders_dir().join(format!("{folder_id}.json"))
    }

    // ========== Object Paths ==========

    /// Root of the filesystem object store.
    pub fn objects_dir(&self) -> PathBuf {
        self.root.join("objects")
    }

    // ========== Audit Log Paths ==========

    /// Directory containing audit logs.
    pub fn audit_dir(&self) -> PathBuf {
        self.root.join("audit")
    }

    /// Directory for a specific date's audit logs.
    pub fn audit_date_dir(&self, date: &str) -> PathBuf {
        self.audit_dir().join(date)
    }

    /// Path to a daily audit events file (JSONL format).
    pub fn audit_events_file(&self, date: &str) -> PathBuf {
        self.audit_date_dir(date).join("events.jsonl")
    }
}

/// Longest accepted document ID.
pub const MAX_ID_LEN: usize = 128;

/// Whether `id` can name a document file.
///
/// IDs arrive from request paths already percent-decoded, so anything that
/// could add a path component is refused.
pub fn is_document_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Object name for a freshly uploaded card image.
pub fn card_image_object(card_id: &str, upload_id: &str) -> String {
    format!("images/{card_id}/{upload_id}.jpg")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_use_data_root() {
        let paths = StoragePaths::default();
        assert_eq!(paths.root(), Path::new("./data"));
    }

    #[test]
    fn card_and_folder_paths_are_correct() {
        let paths = StoragePaths::new("/tmp/test-data");
        assert_eq!(
            paths.card("c-1"),
            PathBuf::from("/tmp/test-data/cards/c-1.json")
        );
        assert_eq!(
            paths.folder("f-1"),
            PathBuf::from("/tmp/test-data/folders/f-1.json")
        );
        assert_eq!(paths.objects_dir(), PathBuf::from("/tmp/test-data/objects"));
    }

    #[test]
    fn audit_paths_are_correct() {
        let paths = StoragePaths::new("/srv");
        assert_eq!(paths.audit_dir(), PathBuf::from("/srv/audit"));
        assert_eq!(
            paths.audit_events_file("2026-01-28"),
            PathBuf::from("/srv/audit/2026-01-28/events.jsonl")
        );
    }

    #[test]
    fn document_ids_cannot_leave_their_directory() {
        assert!(is_document_id("c-1"));
        assert!(is_document_id("0b6f1c2e-5d1a-4d2b-9f3e-7a1c2d3e4f50"));
        for id in ["", "..", "../x", "../../outside", "a/b", "a\\b", ".hidden", "c-1.json", "x\0"] {
            assert!(!is_document_id(id), "{id:?}");
        }
        assert!(!is_document_id(&"a".repeat(MAX_ID_LEN + 1)));
    }

    #[test]
    fn card_image_object_is_relative() {
        assert_eq!(card_image_object("c-1", "u-2"), "images/c-1/u-2.jpg");
    }
}
