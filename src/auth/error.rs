// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Rejection for owner routes called without a usable identity.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    MissingIdentity,
    /// Empty or not valid UTF-8
    #[error("Invalid user identity")]
    InvalidIdentity,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: &'static str,
}

impl AuthError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingIdentity => "missing_identity",
            AuthError::InvalidIdentity => "invalid_identity",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code(),
        };
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn missing_identity_returns_401() {
        let response = AuthError::MissingIdentity.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "missing_identity");
        assert_eq!(body["error"], "Authentication required");
    }

    #[tokio::test]
    async fn invalid_identity_returns_401() {
        let response = AuthError::InvalidIdentity.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
