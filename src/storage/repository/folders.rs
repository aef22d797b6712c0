// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Share folder repository.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::share::ShareLinkState;

use super::super::{
    paths::is_document_id, DocumentStorage, OwnedResource, StorageError, StorageResult,
};

/// A named group of cards owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareFolder {
    /// Unique folder identifier (UUID)
    pub id: String,
    pub owner_user_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Member card IDs; a set, order carries no meaning
    #[serde(default)]
    pub card_ids: Vec<String>,
    #[serde(flatten)]
    pub sharing: ShareLinkState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShareFolder {
    /// New, empty, unshared folder.
    pub fn new(
        id: String,
        owner_user_id: String,
        name: String,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_user_id,
            name,
            description,
            card_ids: Vec::new(),
            sharing: ShareLinkState::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_cards(mut self, card_ids: Vec<String>) -> Self {
        for card_id in card_ids {
            self.insert_card(card_id);
        }
        self
    }

    /// Set-union insert. Returns false when already a member.
    pub fn insert_card(&mut self, card_id: String) -> bool {
        if self.contains_card(&card_id) {
            return false;
        }
        self.card_ids.push(card_id);
        true
    }

    pub fn remove_card(&mut self, card_id: &str) -> bool {
        let before = self.card_ids.len();
        self.card_ids.retain(|id| id != card_id);
        self.card_ids.len() != before
    }

    pub fn contains_card(&self, card_id: &str) -> bool {
        self.card_ids.iter().any(|id| id == card_id)
    }
}

impl OwnedResource for ShareFolder {
    fn owner_user_id(&self) -> &str {
        &self.owner_user_id
    }

    fn resource_label(&self) -> String {
        format!("folder {}", self.id)
    }
}

/// Repository for share folders.
pub struct FolderRepository<'a> {
    storage: &'a DocumentStorage,
}

impl<'a> FolderRepository<'a> {
    pub fn new(storage: &'a DocumentStorage) -> Self {
        Self { storage }
    }

    /// Document path for `folder_id`. Malformed IDs read as missing folders.
    fn path(&self, folder_id: &str) -> StorageResult<PathBuf> {
        if !is_document_id(folder_id) {
            return Err(StorageError::NotFound(format!("Folder {folder_id}")));
        }
        Ok(self.storage.paths().folder(folder_id))
    }

    pub fn exists(&self, folder_id: &str) -> bool {
        self.path(folder_id)
            .is_ok_and(|path| self.storage.exists(path))
    }

    /// Get a folder by ID.
    pub fn get(&self, folder_id: &str) -> StorageResult<ShareFolder> {
        let path = self.path(folder_id)?;
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("Folder {folder_id}")));
        }
        self.storage.read_json(path)
    }

    pub fn create(&self, folder: &ShareFolder) -> StorageResult<()> {
        if self.exists(&folder.id) {
            return Err(StorageError::AlreadyExists(format!("Folder {}", folder.id)));
        }
        self.storage.write_json(self.path(&folder.id)?, folder)
    }

    /// Apply `mutate` to a folder as one atomic document update.
    ///
    /// Membership changes and link transitions both go through here, so a
    /// concurrent writer always sees the result of the previous update.
    pub fn modify<R, E, F>(&self, folder_id: &str, mutate: F) -> Result<R, E>
    where
        E: From<StorageError>,
        F: FnOnce(&mut ShareFolder) -> Result<R, E>,
    {
        let path = self.path(folder_id)?;
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("Folder {folder_id}")).into());
        }
        self.storage.update_json(path, mutate)
    }

    pub fn delete(&self, folder_id: &str) -> StorageResult<()> {
        let path = self.path(folder_id)?;
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("Folder {folder_id}")));
        }
        self.storage.delete(path)
    }

    /// List all folders, skipping unreadable documents.
    pub fn list_all(&self) -> StorageResult<Vec<ShareFolder>> {
        let folder_ids = self
            .storage
            .list_files(self.storage.paths().folders_dir(), "json")?;

        Ok(folder_ids
            .iter()
            .filter_map(|id| match self.get(id) {
                Ok(folder) => Some(folder),
                Err(e) => {
                    tracing::warn!(folder_id = %id, error = %e, "Failed to read folder");
                    None
                }
            })
            .collect())
    }

    /// List all folders owned by a user, newest first.
    pub fn list_by_owner(&self, user_id: &str) -> StorageResult<Vec<ShareFolder>> {
        let mut folders: Vec<ShareFolder> = self
            .list_all()?
            .into_iter()
            .filter(|folder| folder.owner_user_id == user_id)
            .collect();
        folders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(folders)
    }

    /// Find the folder whose active link is `token`.
    pub fn find_by_share_token(&self, token: &str) -> StorageResult<Option<ShareFolder>> {
        Ok(self
            .list_all()?
            .into_iter()
            .find(|folder| folder.sharing.is_active_token(token)))
    }

    /// Drop `card_id` from every folder of `user_id` that lists it.
    pub fn remove_card_everywhere(&self, user_id: &str, card_id: &str) -> StorageResult<usize> {
        let mut removed = 0;
        for folder in self.list_by_owner(user_id)? {
            if !folder.contains_card(card_id) {
                continue;
            }
            let changed: StorageResult<bool> = self.modify(&folder.id, |folder| {
                let changed = folder.remove_card(card_id);
                if changed {
                    folder.updated_at = Utc::now();
                }
                Ok(changed)
            });
            if changed? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
