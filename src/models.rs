// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the request and response data structures used by
//! the owner-facing REST API. Public share responses live next to the
//! disclosure gateway in [`crate::share::gateway`].
//!
//! ## Update Semantics
//!
//! In update requests an absent field is left untouched and an empty string
//! clears the stored value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::share::ShareHistoryEntry;
use crate::storage::CardCategory;

/// Maximum length of folder names and card labels.
pub const MAX_LABEL_LEN: usize = 100;

// =============================================================================
// Card Models
// =============================================================================

/// Request to store a new card.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateCardRequest {
    #[serde(default)]
    pub category: CardCategory,
    pub holder_name: Option<String>,
    pub bank_name: Option<String>,
    pub card_name: Option<String>,
    /// Card or document number. Stored encrypted.
    pub number: Option<String>,
    /// Stored encrypted.
    pub cvv: Option<String>,
    /// Stored encrypted.
    pub expiry: Option<String>,
}

/// Partial card update.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateCardRequest {
    pub category: Option<CardCategory>,
    pub holder_name: Option<String>,
    pub bank_name: Option<String>,
    pub card_name: Option<String>,
    pub number: Option<String>,
    pub cvv: Option<String>,
    pub expiry: Option<String>,
}

/// A card as seen by its owner, with sensitive fields decrypted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Card {
    pub id: String,
    pub category: CardCategory,
    pub holder_name: Option<String>,
    pub bank_name: Option<String>,
    pub card_name: Option<String>,
    /// `null` when absent or when the stored value could not be decrypted.
    pub number: Option<String>,
    pub cvv: Option<String>,
    pub expiry: Option<String>,
    pub cvv_added_at: Option<DateTime<Utc>>,
    /// Owner image endpoint, present once an image was uploaded.
    pub image_url: Option<String>,
    pub image_encrypted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Response for listing cards.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListCardsResponse {
    pub cards: Vec<Card>,
}

// =============================================================================
// Folder Models
// =============================================================================

/// Request to create a folder.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateFolderRequest {
    pub name: String,
    pub description: Option<String>,
}

/// Request to rename or re-describe a folder.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateFolderRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Request to add a card to a folder.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddFolderCardRequest {
    pub card_id: String,
}

/// A folder as seen by its owner.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Folder {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub card_ids: Vec<String>,
    pub is_public: bool,
    /// Active share token, if any.
    pub share_token: Option<String>,
    /// Expiry of the active link; `null` with an active link means never.
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Response for listing folders.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListFoldersResponse {
    pub folders: Vec<Folder>,
}

// =============================================================================
// Share Link Models
// =============================================================================

/// Request to generate a share link.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateShareLinkRequest {
    /// `"<n>h"`, `"<n>d"` or `"never"`. Defaults to `"7d"`.
    pub expires_in: Option<String>,
}

/// A freshly generated share link.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShareLink {
    pub share_url: String,
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Share history of a folder, newest first.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShareHistoryResponse {
    pub history: Vec<ShareHistoryEntry>,
}

/// Trim `value`, mapping blank input to `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
