// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Token verification happens upstream. The identity provider's gateway
//! verifies the session and forwards the canonical user ID to this service.
//!
//! ## Auth Flow
//!
//! 1. Client authenticates with the identity provider
//! 2. The gateway verifies the session and sets `x-user-id`
//! 3. This service:
//!    - Reads `x-user-id` as an opaque, trusted owner identifier
//!    - Rejects owner routes when it is missing or empty
//!
//! ## Security
//!
//! - All `/v1/cards` and `/v1/folders` routes require an identity
//! - `/v1/public/share/*` and health routes never read it

pub mod claims;
pub mod error;
pub mod extractor;

pub use claims::AuthenticatedUser;
pub use error::AuthError;
pub use extractor::{Auth, USER_ID_HEADER};
