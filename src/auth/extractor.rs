// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require an identity:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{AuthError, AuthenticatedUser};

/// Header carrying the verified user ID.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Extractor for authenticated users.
///
/// Works with any router state; the identity is read from the request only.
pub struct Auth(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // An upstream layer may already have resolved the user
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or(AuthError::MissingIdentity)?
            .to_str()
            .map_err(|_| AuthError::InvalidIdentity)?
            .trim();

        if user_id.is_empty() {
            return Err(AuthError::InvalidIdentity);
        }

        Ok(Auth(AuthenticatedUser::new(user_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request};

    async fn extract(request: Request<()>) -> Result<AuthenticatedUser, AuthError> {
        let (mut parts, _) = request.into_parts();
        Auth::from_request_parts(&mut parts, &())
            .await
            .map(|Auth(user)| user)
    }

    #[tokio::test]
    async fn reads_user_id_header() {
        let request = Request::builder()
            .header(USER_ID_HEADER, "user_abc")
            .body(())
            .unwrap();
        let user = extract(request).await.unwrap();
        assert_eq!(user.user_id, "user_abc");
    }

    #[tokio::test]
    async fn missing_header_rejected() {
        let request = Request::builder().body(()).unwrap();
        assert!(matches!(extract(request).await, Err(AuthError::MissingIdentity)));
    }

    #[tokio::test]
    async fn blank_header_rejected() {
        let request = Request::builder()
            .header(USER_ID_HEADER, "   ")
            .body(())
            .unwrap();
        assert!(matches!(extract(request).await, Err(AuthError::InvalidIdentity)));
    }

    #[tokio::test]
    async fn non_utf8_header_rejected() {
        let mut request = Request::builder().body(()).unwrap();
        request.headers_mut().insert(
            USER_ID_HEADER,
            HeaderValue::from_bytes(&[0xFF, 0xFE]).unwrap(),
        );
        assert!(matches!(extract(request).await, Err(AuthError::InvalidIdentity)));
    }

    #[tokio::test]
    async fn extension_takes_precedence() {
        let mut request = Request::builder()
            .header(USER_ID_HEADER, "header_user")
            .body(())
            .unwrap();
        request
            .extensions_mut()
            .insert(AuthenticatedUser::new("extension_user"));
        assert_eq!(extract(request).await.unwrap().user_id, "extension_user");
    }
}
