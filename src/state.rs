// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::config::ShareSettings;
use crate::crypto::CipherSuite;
use crate::share::DisclosureGateway;
use crate::storage::{DocumentStorage, ObjectStore};

/// Shared application state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    storage: Arc<DocumentStorage>,
    objects: Arc<dyn ObjectStore>,
    ciphers: CipherSuite,
    share: Arc<ShareSettings>,
}

impl AppState {
    pub fn new(
        storage: DocumentStorage,
        objects: Arc<dyn ObjectStore>,
        ciphers: CipherSuite,
        share: ShareSettings,
    ) -> Self {
        Self {
            storage: Arc::new(storage),
            objects,
            ciphers,
            share: Arc::new(share),
        }
    }

    pub fn storage(&self) -> &DocumentStorage {
        &self.storage
    }

    pub fn objects(&self) -> &dyn ObjectStore {
        self.objects.as_ref()
    }

    pub fn ciphers(&self) -> &CipherSuite {
        &self.ciphers
    }

    pub fn share_settings(&self) -> &ShareSettings {
        &self.share
    }

    /// Gateway for the unauthenticated share routes.
    pub fn gateway(&self) -> DisclosureGateway<'_> {
        DisclosureGateway::new(
            self.storage(),
            self.objects(),
            self.ciphers(),
            self.share.expose_cvv,
        )
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::config::parse_base_url;
    use crate::crypto::EncryptionKey;
    use crate::storage::{MemoryObjectStore, StoragePaths};
    use tempfile::TempDir;

    /// State over a temp data dir and an in-memory object store.
    pub struct TestApp {
        pub _temp: TempDir,
        pub state: AppState,
        pub objects: Arc<MemoryObjectStore>,
    }

    pub fn test_app() -> TestApp {
        let temp = TempDir::new().unwrap();
        let mut storage = DocumentStorage::new(StoragePaths::new(temp.path()));
        storage.initialize().unwrap();

        let objects = Arc::new(MemoryObjectStore::new());
        let settings = ShareSettings {
            public_base_url: parse_base_url("https://vault.example.com").unwrap(),
            expose_cvv: true,
        };
        let state = AppState::new(
            storage,
            objects.clone(),
            CipherSuite::new(EncryptionKey::generate()),
            settings,
        );

        TestApp {
            _temp: temp,
            state,
            objects,
        }
    }
}
