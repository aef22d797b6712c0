// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Card Vault - encrypted card storage with expiring share links
//!
//! Sensitive card fields and card photographs are sealed with AES-256-GCM
//! before they reach disk. Owners group cards into folders and expose a
//! folder through a time-boxed public link.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Caller identity from the upstream gateway
//! - `crypto` - Field and image ciphers, record sealing
//! - `share` - Share tokens, link lifecycle and the public gateway
//! - `storage` - JSON documents, image objects and the audit log

pub mod api;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod models;
pub mod share;
pub mod state;
pub mod storage;
