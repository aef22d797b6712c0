// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Unauthenticated share link endpoints.
//!
//! The token in the path is the only credential. Denials are audited with a
//! token prefix, never the full token.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;

use crate::{
    error::ApiError,
    share::{token::token_prefix, PublicShareView, ShareError},
    state::AppState,
    storage::{AuditEvent, AuditEventType, AuditRepository},
};

fn audit_denied(state: &AppState, token: &str, error: &ShareError) {
    AuditRepository::new(state.storage()).record(
        AuditEvent::new(AuditEventType::PublicViewDenied)
            .with_details(json!({ "token_prefix": token_prefix(token) }))
            .failed(error.to_string()),
    );
}

/// Redacted view of a shared folder.
#[utoipa::path(
    get,
    path = "/v1/public/share/{token}",
    params(("token" = String, Path, description = "Share token")),
    tag = "Public",
    responses(
        (status = 200, body = PublicShareView),
        (status = 404, description = "Unknown or revoked share link"),
        (status = 410, description = "Share link has expired")
    )
)]
pub async fn get_shared_folder(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<PublicShareView>, ApiError> {
    let gateway = state.gateway();
    let folder = match gateway.open(&token, Utc::now()) {
        Ok(folder) => folder,
        Err(e) => {
            audit_denied(&state, &token, &e);
            return Err(e.into());
        }
    };

    let view = gateway.render_public_view(&folder);
    AuditRepository::new(state.storage()).record(
        AuditEvent::new(AuditEventType::PublicViewServed)
            .with_resource("folder", &folder.id)
            .with_details(json!({
                "token_prefix": token_prefix(&token),
                "card_count": view.folder.card_count,
            })),
    );

    Ok(Json(view))
}

/// Decrypted image of one card in a shared folder.
#[utoipa::path(
    get,
    path = "/v1/public/share/{token}/cards/{card_id}/image",
    params(
        ("token" = String, Path, description = "Share token"),
        ("card_id" = String, Path, description = "Card ID")
    ),
    tag = "Public",
    responses(
        (status = 200, description = "JPEG bytes", content_type = "image/jpeg"),
        (status = 404, description = "Unknown link or image unavailable"),
        (status = 410, description = "Share link has expired")
    )
)]
pub async fn get_shared_image(
    State(state): State<AppState>,
    Path((token, card_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let bytes = state
        .gateway()
        .public_image(&token, &card_id, Utc::now())
        .inspect_err(|e| {
            if !matches!(e, ShareError::ImageUnavailable) {
                audit_denied(&state, &token, e);
            }
        })?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/jpeg"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        bytes,
    )
        .into_response())
}
