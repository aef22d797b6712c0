// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::share::ShareError;
use crate::storage::StorageError;

/// Message for unknown and revoked share tokens alike.
pub const SHARE_NOT_FOUND: &str = "Share link not found";
pub const SHARE_EXPIRED: &str = "Share link has expired";
pub const IMAGE_UNAVAILABLE: &str = "Image unavailable";

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn gone(message: impl Into<String>) -> Self {
        Self::new(StatusCode::GONE, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Map an owner-facing storage failure.
    ///
    /// Permission failures read as not-found so resource IDs of other users
    /// cannot be probed.
    pub fn from_storage(error: StorageError, not_found: &str) -> Self {
        match error {
            StorageError::NotFound(_) | StorageError::PermissionDenied { .. } => {
                Self::not_found(not_found)
            }
            other => {
                tracing::error!(error = %other, "Storage operation failed");
                Self::internal("Storage error")
            }
        }
    }
}

impl From<ShareError> for ApiError {
    fn from(error: ShareError) -> Self {
        match error {
            ShareError::TokenNotFound => Self::not_found(SHARE_NOT_FOUND),
            ShareError::LinkExpired => Self::gone(SHARE_EXPIRED),
            ShareError::EmptyFolder => {
                Self::unprocessable("Add at least one card before sharing this folder")
            }
            ShareError::NoActiveLink => Self::conflict("Folder has no active share link"),
            ShareError::ImageUnavailable => Self::not_found(IMAGE_UNAVAILABLE),
            ShareError::Storage(e) => Self::from_storage(e, "Folder not found"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}
