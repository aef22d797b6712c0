// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Folder Sharing
//!
//! Time-boxed public links over folders of cards.
//!
//! - [`token`]: token minting and expiry arithmetic
//! - [`lifecycle`]: per-folder link state machine and its append-only history
//! - [`gateway`]: token resolution and the redacted public view
//!
//! ## Link States
//!
//! ```text
//! NoActiveLink --generate--> LinkActive --revoke--> NoActiveLink
//!                               |   ^
//!                               +---+ regenerate (revoke old + activate new, one write)
//! ```
//!
//! Unknown, malformed and revoked tokens all resolve to the same
//! [`ShareError::TokenNotFound`]. Only expiry is reported separately.

pub mod gateway;
pub mod lifecycle;
pub mod token;

use thiserror::Error;

use crate::storage::StorageError;

pub use gateway::{DisclosureGateway, PublicCard, PublicFolder, PublicShareView};
pub use lifecycle::{public_url, IssuedLink, ShareHistoryEntry, ShareLinkState, ShareLinks};
pub use token::{calculate_expiry, generate_token, is_expired, ExpiryPolicy};

/// Errors raised by share link operations.
#[derive(Debug, Error)]
pub enum ShareError {
    /// Unknown, malformed or revoked token.
    #[error("share link not found")]
    TokenNotFound,

    #[error("share link has expired")]
    LinkExpired,

    #[error("folder has no cards to share")]
    EmptyFolder,

    #[error("folder has no active share link")]
    NoActiveLink,

    #[error("image unavailable")]
    ImageUnavailable,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type ShareResult<T> = Result<T, ShareError>;
