// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Share link state machine.
//!
//! The link state is embedded in the folder document, so every transition
//! below lands in the same atomic document write as the folder itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::ToSchema;

use crate::auth::AuthenticatedUser;
use crate::storage::{FolderRepository, OwnershipEnforcer, ShareFolder};

use super::token::{calculate_expiry, generate_token, token_prefix};
use super::{ShareError, ShareResult};

/// One issued share link. Entries are appended and only ever flipped inactive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ShareHistoryEntry {
    pub token: String,
    pub created_at: DateTime<Utc>,
    /// `None` means the link never expires
    pub expires_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

/// Sharing fields of a folder.
///
/// `is_public`, `share_token` and `expires_at` always mirror the single
/// active history entry, or are cleared when there is none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLinkState {
    #[serde(default)]
    is_public: bool,
    #[serde(default)]
    share_token: Option<String>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    share_history: Vec<ShareHistoryEntry>,
}

impl ShareLinkState {
    pub fn is_public(&self) -> bool {
        self.is_public
    }

    pub fn share_token(&self) -> Option<&str> {
        self.share_token.as_deref()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn active_entry(&self) -> Option<&ShareHistoryEntry> {
        self.share_history.iter().find(|entry| entry.is_active)
    }

    /// True when `token` is the currently active link.
    pub fn is_active_token(&self, token: &str) -> bool {
        self.is_public && self.share_token.as_deref() == Some(token)
    }

    /// All entries, newest first.
    pub fn history(&self) -> Vec<ShareHistoryEntry> {
        let mut entries: Vec<ShareHistoryEntry> =
            self.share_history.iter().rev().cloned().collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries
    }

    /// Revoke whatever is active and activate a new entry.
    fn activate(&mut self, token: String, expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) {
        self.deactivate_all(now);
        self.share_history.push(ShareHistoryEntry {
            token: token.clone(),
            created_at: now,
            expires_at,
            revoked_at: None,
            is_active: true,
        });
        self.is_public = true;
        self.share_token = Some(token);
        self.expires_at = expires_at;
    }

    fn revoke(&mut self, now: DateTime<Utc>) -> ShareResult<ShareHistoryEntry> {
        let Some(index) = self.share_history.iter().position(|entry| entry.is_active) else {
            return Err(ShareError::NoActiveLink);
        };

        self.deactivate_all(now);
        self.is_public = false;
        self.share_token = None;
        self.expires_at = None;
        Ok(self.share_history[index].clone())
    }

    fn deactivate_all(&mut self, now: DateTime<Utc>) {
        for entry in self.share_history.iter_mut().filter(|entry| entry.is_active) {
            entry.is_active = false;
            entry.revoked_at = Some(now);
        }
    }
}

/// A freshly minted link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedLink {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Mint a link on `folder`, revoking any active one.
pub fn generate_link(
    folder: &mut ShareFolder,
    expires_in: &str,
    now: DateTime<Utc>,
) -> ShareResult<IssuedLink> {
    if folder.card_ids.is_empty() {
        return Err(ShareError::EmptyFolder);
    }

    let token = generate_token();
    let expires_at = calculate_expiry(expires_in, now);
    folder.sharing.activate(token.clone(), expires_at, now);
    folder.updated_at = now;

    Ok(IssuedLink { token, expires_at })
}

/// Revoke the active link on `folder`.
pub fn revoke_link(folder: &mut ShareFolder, now: DateTime<Utc>) -> ShareResult<ShareHistoryEntry> {
    let revoked = folder.sharing.revoke(now)?;
    folder.updated_at = now;
    Ok(revoked)
}

/// Public URL for `token` under the configured base.
pub fn public_url(base: &Url, token: &str) -> Result<Url, url::ParseError> {
    base.join(&format!("share/{token}"))
}

/// Owner-facing link operations, each applied as one folder update.
pub struct ShareLinks<'a> {
    folders: FolderRepository<'a>,
}

impl<'a> ShareLinks<'a> {
    pub fn new(folders: FolderRepository<'a>) -> Self {
        Self { folders }
    }

    pub fn generate(
        &self,
        user: &AuthenticatedUser,
        folder_id: &str,
        expires_in: &str,
        now: DateTime<Utc>,
    ) -> ShareResult<IssuedLink> {
        let issued = self.folders.modify(folder_id, |folder| {
            folder.verify_ownership(user)?;
            generate_link(folder, expires_in, now)
        })?;

        tracing::info!(
            folder_id = %folder_id,
            token_prefix = %token_prefix(&issued.token),
            expires_at = ?issued.expires_at,
            "Share link generated"
        );
        Ok(issued)
    }

    pub fn revoke(
        &self,
        user: &AuthenticatedUser,
        folder_id: &str,
        now: DateTime<Utc>,
    ) -> ShareResult<ShareHistoryEntry> {
        let revoked = self.folders.modify(folder_id, |folder| {
            folder.verify_ownership(user)?;
            revoke_link(folder, now)
        })?;

        tracing::info!(
            folder_id = %folder_id,
            token_prefix = %token_prefix(&revoked.token),
            "Share link revoked"
        );
        Ok(revoked)
    }

    pub fn history(
        &self,
        user: &AuthenticatedUser,
        folder_id: &str,
    ) -> ShareResult<Vec<ShareHistoryEntry>> {
        let folder = self.folders.get(folder_id)?;
        folder.verify_ownership(user)?;
        Ok(folder.sharing.history())
    }
}
