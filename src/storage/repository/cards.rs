// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Card repository.
//!
//! Each card or ID document is a JSON file under `{root}/cards/`. The three
//! sensitive attributes are persisted only in sealed form; the non-sensitive
//! ones (holder, bank, display name) are stored as-is.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::crypto::SensitiveFields;

use super::super::{
    paths::is_document_id, DocumentStorage, OwnedResource, StorageError, StorageResult,
};

/// Kind of card or document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum CardCategory {
    Credit,
    Debit,
    /// Identity documents (driving licence, national ID, ...)
    Id,
    #[default]
    Other,
}

/// Reference to a card photograph in the object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "path", rename_all = "snake_case")]
pub enum StoredImage {
    /// Object holds a displayable image.
    Plain(String),
    /// Object holds an image-cipher blob.
    Sealed(String),
}

impl StoredImage {
    pub fn path(&self) -> &str {
        match self {
            StoredImage::Plain(path) | StoredImage::Sealed(path) => path,
        }
    }

    pub fn is_sealed(&self) -> bool {
        matches!(self, StoredImage::Sealed(_))
    }
}

/// Card record as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCard {
    /// Unique card identifier (UUID)
    pub id: String,
    /// Identity-provider user ID of the owner
    pub owner_user_id: String,
    pub category: CardCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder_name: Option<String>,
    /// Issuing bank label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    /// Display name chosen by the owner
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_name: Option<String>,
    /// Card/ID number, CVV and expiry
    #[serde(default)]
    pub secrets: SensitiveFields,
    /// When the CVV was last set; cleared together with the CVV
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cvv_added_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<StoredImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredCard {
    /// Clear the CVV and its provenance timestamp together.
    pub fn erase_cvv(&mut self, now: DateTime<Utc>) {
        self.secrets.cvv = None;
        self.cvv_added_at = None;
        self.updated_at = now;
    }
}

impl OwnedResource for StoredCard {
    fn owner_user_id(&self) -> &str {
        &self.owner_user_id
    }

    fn resource_label(&self) -> String {
        format!("card {}", self.id)
    }
}

/// Repository for card records.
pub struct CardRepository<'a> {
    storage: &'a DocumentStorage,
}

impl<'a> CardRepository<'a> {
    /// Create a new CardRepository.
    pub fn new(storage: &'a DocumentStorage) -> Self {
        Self { storage }
    }

    /// Document path for `card_id`. Malformed IDs read as missing cards.
    fn path(&self, card_id: &str) -> StorageResult<PathBuf> {
        if !is_document_id(card_id) {
            return Err(StorageError::NotFound(format!("Card {card_id}")));
        }
        Ok(self.storage.paths().card(card_id))
    }

    /// Check if a card exists.
    pub fn exists(&self, card_id: &str) -> bool {
        self.path(card_id)
            .is_ok_and(|path| self.storage.exists(path))
    }

    /// Get a card by ID.
    pub fn get(&self, card_id: &str) -> StorageResult<StoredCard> {
        let path = self.path(card_id)?;
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("Card {card_id}")));
        }
        self.storage.read_json(path)
    }

    /// Get several cards, silently skipping IDs that no longer exist.
    pub fn get_many(&self, card_ids: &[String]) -> Vec<StoredCard> {
        card_ids
            .iter()
            .filter_map(|id| match self.get(id) {
                Ok(card) => Some(card),
                Err(StorageError::NotFound(_)) => None,
                Err(e) => {
                    tracing::warn!(card_id = %id, error = %e, "Failed to read card");
                    None
                }
            })
            .collect()
    }

    /// Create a new card. The record must already be sealed.
    pub fn create(&self, card: &StoredCard) -> StorageResult<()> {
        if self.exists(&card.id) {
            return Err(StorageError::AlreadyExists(format!("Card {}", card.id)));
        }
        self.storage.write_json(self.path(&card.id)?, card)
    }

    /// Apply `mutate` to a stored card as one atomic document update.
    pub fn modify<R, E, F>(&self, card_id: &str, mutate: F) -> Result<R, E>
    where
        E: From<StorageError>,
        F: FnOnce(&mut StoredCard) -> Result<R, E>,
    {
        let path = self.path(card_id)?;
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("Card {card_id}")).into());
        }
        self.storage.update_json(path, mutate)
    }

    /// Delete a card record.
    pub fn delete(&self, card_id: &str) -> StorageResult<()> {
        let path = self.path(card_id)?;
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("Card {card_id}")));
        }
        self.storage.delete(path)
    }

    /// List all cards owned by a user, newest first.
    pub fn list_by_owner(&self, user_id: &str) -> StorageResult<Vec<StoredCard>> {
        let card_ids = self
            .storage
            .list_files(self.storage.paths().cards_dir(), "json")?;

        let mut cards: Vec<StoredCard> = self
            .get_many(&card_ids)
            .into_iter()
            .filter(|card| card.owner_user_id == user_id)
            .collect();
        cards.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(cards)
    }
}
