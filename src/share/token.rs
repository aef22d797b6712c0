// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Share token generation and expiry arithmetic.
//!
//! Tokens are 32 random bytes rendered as unpadded base64url (43 characters).
//! Expiry is given as a relative duration: `"<n>h"`, `"<n>d"` or `"never"`.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, TimeDelta, Utc};
use rand::RngCore;

/// Random bytes behind each token.
pub const TOKEN_BYTES: usize = 32;

/// Length of the encoded token.
pub const TOKEN_LEN: usize = 43;

/// Duration applied when a share request does not name one.
pub const DEFAULT_EXPIRY: &str = "7d";

/// Mint a fresh, unguessable share token.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    Base64UrlUnpadded::encode_string(&bytes)
}

/// Cheap shape check run before any storage lookup.
pub fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_LEN
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Parsed form of a relative duration string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryPolicy {
    /// Expires this long after creation.
    After(TimeDelta),
    /// Explicit `"never"`.
    Never,
    /// Malformed, zero or negative input. Treated as never expiring.
    Unrecognized,
}

impl ExpiryPolicy {
    pub fn parse(expires_in: &str) -> Self {
        let expires_in = expires_in.trim().to_ascii_lowercase();
        if expires_in == "never" {
            return ExpiryPolicy::Never;
        }

        let Some(unit) = expires_in.chars().last() else {
            return ExpiryPolicy::Unrecognized;
        };
        let digits = &expires_in[..expires_in.len() - unit.len_utf8()];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return ExpiryPolicy::Unrecognized;
        }
        let Ok(count) = digits.parse::<i64>() else {
            return ExpiryPolicy::Unrecognized;
        };
        if count <= 0 {
            return ExpiryPolicy::Unrecognized;
        }

        let delta = match unit {
            'h' => TimeDelta::try_hours(count),
            'd' => TimeDelta::try_days(count),
            _ => None,
        };
        delta.map_or(ExpiryPolicy::Unrecognized, ExpiryPolicy::After)
    }

    /// Absolute expiry for a link created at `now`. `None` means never.
    pub fn expires_at(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            ExpiryPolicy::After(delta) => now.checked_add_signed(delta),
            ExpiryPolicy::Never | ExpiryPolicy::Unrecognized => None,
        }
    }
}

/// Compute the expiry timestamp for `expires_in`.
///
/// Unrecognized durations fall back to "never" with a warning rather than
/// failing the request.
pub fn calculate_expiry(expires_in: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let policy = ExpiryPolicy::parse(expires_in);
    if policy == ExpiryPolicy::Unrecognized {
        tracing::warn!(
            expires_in = %expires_in,
            "Unrecognized share duration, link will not expire"
        );
    }

    let expires_at = policy.expires_at(now);
    if expires_at.is_none() && matches!(policy, ExpiryPolicy::After(_)) {
        tracing::warn!(expires_in = %expires_in, "Share duration overflows, link will not expire");
    }
    expires_at
}

/// `None` never expires; otherwise expired once strictly in the past.
pub fn is_expired(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    expires_at.is_some_and(|at| at < now)
}

/// First characters of a token, safe to put in logs.
pub fn token_prefix(token: &str) -> &str {
    token.get(..8).unwrap_or(token)
}
