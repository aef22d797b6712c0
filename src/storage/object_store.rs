// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blob storage for card images.
//!
//! The [`ObjectStore`] trait is the whole contract the image workflow relies
//! on. Object names are relative, `/`-separated paths.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use super::{StorageError, StorageResult};

/// Minimal blob store interface.
pub trait ObjectStore: Send + Sync {
    fn exists(&self, path: &str) -> StorageResult<bool>;
    fn download(&self, path: &str) -> StorageResult<Vec<u8>>;
    /// Must not return until the object is durably written.
    fn upload(&self, path: &str, bytes: &[u8]) -> StorageResult<()>;
    fn delete(&self, path: &str) -> StorageResult<()>;
}

/// Object store backed by files under a root directory.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Map an object name to a file path, rejecting anything that could
    /// escape the root.
    fn resolve(&self, path: &str) -> StorageResult<PathBuf> {
        let relative = Path::new(path);
        let is_clean = !path.is_empty()
            && !path.contains('\\')
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));

        if !is_clean {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl ObjectStore for FsObjectStore {
    fn exists(&self, path: &str) -> StorageResult<bool> {
        Ok(self.resolve(path)?.is_file())
    }

    fn download(&self, path: &str) -> StorageResult<Vec<u8>> {
        Ok(fs::read(self.resolve(path)?)?)
    }

    fn upload(&self, path: &str, bytes: &[u8]) -> StorageResult<()> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut temp_name = target.clone().into_os_string();
        temp_name.push(".part");
        let temp = PathBuf::from(temp_name);
        {
            let mut file = File::create(&temp)?;
            file.write_all(bytes)?;
            file.sync_all()?;
        }
        fs::rename(&temp, &target)?;
        Ok(())
    }

    fn delete(&self, path: &str) -> StorageResult<()> {
        fs::remove_file(self.resolve(path)?)?;
        Ok(())
    }
}

/// In-memory object store with an upload failure switch.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    fail_uploads: AtomicBool,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent upload fail until switched back off.
    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.objects().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn objects(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.objects.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ObjectStore for MemoryObjectStore {
    fn exists(&self, path: &str) -> StorageResult<bool> {
        Ok(self.objects().contains_key(path))
    }

    fn download(&self, path: &str) -> StorageResult<Vec<u8>> {
        self.objects()
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("Object {path}")))
    }

    fn upload(&self, path: &str, bytes: &[u8]) -> StorageResult<()> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(format!("upload of {path} rejected")));
        }
        self.objects().insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    fn delete(&self, path: &str) -> StorageResult<()> {
        self.objects()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(format!("Object {path}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn fs_store_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = FsObjectStore::new(temp.path());

        store.upload("images/c-1/a.jpg", b"jpeg bytes").unwrap();
        assert!(store.exists("images/c-1/a.jpg").unwrap());
        assert_eq!(store.download("images/c-1/a.jpg").unwrap(), b"jpeg bytes");
        assert!(!temp.path().join("images/c-1/a.jpg.part").exists());

        store.delete("images/c-1/a.jpg").unwrap();
        assert!(!store.exists("images/c-1/a.jpg").unwrap());
    }

    #[test]
    fn fs_store_missing_object_is_not_found() {
        let temp = TempDir::new().unwrap();
        let store = FsObjectStore::new(temp.path());
        assert!(matches!(
            store.download("images/none.jpg"),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn fs_store_rejects_escaping_paths() {
        let temp = TempDir::new().unwrap();
        let store = FsObjectStore::new(temp.path());

        for bad in ["", "/etc/passwd", "../outside.jpg", "images/../../x", "a\\b", "./a"] {
            assert!(
                matches!(store.upload(bad, b"x"), Err(StorageError::InvalidPath(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn memory_store_failure_switch() {
        let store = MemoryObjectStore::new();
        store.set_fail_uploads(true);
        assert!(matches!(
            store.upload("a", b"x"),
            Err(StorageError::Unavailable(_))
        ));
        assert!(store.is_empty());

        store.set_fail_uploads(false);
        store.upload("a", b"x").unwrap();
        assert_eq!(store.len(), 1);
    }
}
