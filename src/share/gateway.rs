// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Public disclosure of a shared folder.
//!
//! Everything reachable here is unauthenticated. The gateway decides which
//! card fields leave the vault and routes image bytes back through the image
//! cipher instead of handing out object store paths.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::crypto::{CipherSuite, SensitiveField};
use crate::storage::{
    get_decrypted_image, get_plain_image, CardCategory, CardRepository, DocumentStorage,
    FolderRepository, ObjectStore, ShareFolder, StoredCard, StoredImage,
};

use super::token::{is_expired, is_well_formed, token_prefix};
use super::{ShareError, ShareResult};

/// Folder metadata shown to link holders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PublicFolder {
    pub name: String,
    pub description: Option<String>,
    pub card_count: usize,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Card as shown to link holders. Carries no owner or sealing metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PublicCard {
    pub id: String,
    pub category: CardCategory,
    pub holder_name: Option<String>,
    pub bank_name: Option<String>,
    pub card_name: Option<String>,
    /// `null` when the stored value could not be decrypted
    pub number: Option<String>,
    pub expiry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cvv: Option<String>,
    /// Token-scoped image endpoint, never a storage path
    pub image_url: Option<String>,
}

/// Full public view of a shared folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PublicShareView {
    pub folder: PublicFolder,
    pub cards: Vec<PublicCard>,
}

/// Path of the public image endpoint for one card of a shared folder.
pub fn public_image_path(token: &str, card_id: &str) -> String {
    format!("/v1/public/share/{token}/cards/{card_id}/image")
}

/// Resolves share tokens and renders what their holders may see.
pub struct DisclosureGateway<'a> {
    storage: &'a DocumentStorage,
    objects: &'a dyn ObjectStore,
    ciphers: &'a CipherSuite,
    expose_cvv: bool,
}

impl<'a> DisclosureGateway<'a> {
    pub fn new(
        storage: &'a DocumentStorage,
        objects: &'a dyn ObjectStore,
        ciphers: &'a CipherSuite,
        expose_cvv: bool,
    ) -> Self {
        Self {
            storage,
            objects,
            ciphers,
            expose_cvv,
        }
    }

    /// Folder whose active link is `token`.
    ///
    /// Malformed, unknown and revoked tokens are all `TokenNotFound`.
    pub fn resolve_token(&self, token: &str) -> ShareResult<ShareFolder> {
        if !is_well_formed(token) {
            return Err(ShareError::TokenNotFound);
        }

        FolderRepository::new(self.storage)
            .find_by_share_token(token)?
            .ok_or(ShareError::TokenNotFound)
    }

    pub fn check_expiry(&self, folder: &ShareFolder, now: DateTime<Utc>) -> ShareResult<()> {
        if is_expired(folder.sharing.expires_at(), now) {
            return Err(ShareError::LinkExpired);
        }
        Ok(())
    }

    /// Resolve and check expiry in one step.
    pub fn open(&self, token: &str, now: DateTime<Utc>) -> ShareResult<ShareFolder> {
        let folder = self.resolve_token(token)?;
        self.check_expiry(&folder, now)?;
        Ok(folder)
    }

    /// Render the redacted view of `folder`.
    ///
    /// Member cards that vanished or belong to someone else are skipped.
    pub fn render_public_view(&self, folder: &ShareFolder) -> PublicShareView {
        let token = folder.sharing.share_token().unwrap_or_default();
        let cards: Vec<PublicCard> = CardRepository::new(self.storage)
            .get_many(&folder.card_ids)
            .into_iter()
            .filter(|card| card.owner_user_id == folder.owner_user_id)
            .map(|card| self.public_card(token, card))
            .collect();

        PublicShareView {
            folder: PublicFolder {
                name: folder.name.clone(),
                description: folder.description.clone(),
                card_count: cards.len(),
                expires_at: folder.sharing.expires_at(),
            },
            cards,
        }
    }

    /// Decrypted image bytes for a card in the folder behind `token`.
    pub fn public_image(
        &self,
        token: &str,
        card_id: &str,
        now: DateTime<Utc>,
    ) -> ShareResult<Vec<u8>> {
        let folder = self.open(token, now)?;
        if !folder.contains_card(card_id) {
            return Err(ShareError::ImageUnavailable);
        }

        let card = CardRepository::new(self.storage)
            .get(card_id)
            .map_err(|_| ShareError::ImageUnavailable)?;
        if card.owner_user_id != folder.owner_user_id {
            return Err(ShareError::ImageUnavailable);
        }

        let Some(image) = card.image else {
            return Err(ShareError::ImageUnavailable);
        };

        let bytes = match &image {
            StoredImage::Sealed(path) => get_decrypted_image(self.objects, self.ciphers.images(), path),
            StoredImage::Plain(path) => get_plain_image(self.objects, path),
        };
        bytes.map_err(|e| {
            tracing::warn!(
                token_prefix = %token_prefix(token),
                card_id = %card_id,
                error = %e,
                "Shared image could not be served"
            );
            ShareError::ImageUnavailable
        })
    }

    fn public_card(&self, token: &str, card: StoredCard) -> PublicCard {
        let secrets = self.ciphers.records().open(&card.secrets);
        let cvv = if self.expose_cvv {
            secrets.plain(SensitiveField::Cvv)
        } else {
            None
        };

        PublicCard {
            image_url: card
                .image
                .as_ref()
                .map(|_| public_image_path(token, &card.id)),
            number: secrets.plain(SensitiveField::Number),
            expiry: secrets.plain(SensitiveField::Expiry),
            cvv,
            id: card.id,
            category: card.category,
            holder_name: card.holder_name,
            bank_name: card.bank_name,
            card_name: card.card_name,
        }
    }
}
