// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Card endpoints.
//!
//! Sensitive fields are sealed before anything is written; a record whose
//! fields cannot all be sealed is never stored. Reads decrypt best-effort.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;

use crate::{
    audit_log,
    auth::{Auth, AuthenticatedUser},
    crypto::{SensitiveField, SensitiveFields, SensitiveValue},
    error::{ApiError, IMAGE_UNAVAILABLE},
    models::{non_blank, Card, CreateCardRequest, ListCardsResponse, UpdateCardRequest, MAX_LABEL_LEN},
    state::AppState,
    storage::{
        card_image_object, encrypt_stored_image, get_decrypted_image, get_plain_image,
        AuditEventType, CardRepository, FolderRepository, OwnershipCheck, OwnershipEnforcer,
        StorageError, StoredCard, StoredImage,
    },
};

const CARD_NOT_FOUND: &str = "Card not found";
const STORE_FAILED: &str = "Failed to store card";

/// Owner-facing image endpoint for a card.
pub fn owner_image_path(card_id: &str) -> String {
    format!("/v1/cards/{card_id}/image")
}

/// Build the owner view of a stored card.
pub(crate) fn card_view(state: &AppState, card: &StoredCard) -> Card {
    let secrets = state.ciphers().records().open(&card.secrets);
    Card {
        id: card.id.clone(),
        category: card.category,
        holder_name: card.holder_name.clone(),
        bank_name: card.bank_name.clone(),
        card_name: card.card_name.clone(),
        number: secrets.plain(SensitiveField::Number),
        cvv: secrets.plain(SensitiveField::Cvv),
        expiry: secrets.plain(SensitiveField::Expiry),
        cvv_added_at: card.cvv_added_at,
        image_url: card.image.as_ref().map(|_| owner_image_path(&card.id)),
        image_encrypted: card.image.as_ref().is_some_and(StoredImage::is_sealed),
        created_at: card.created_at,
        updated_at: card.updated_at,
    }
}

fn validate_labels(labels: &[&Option<String>]) -> Result<(), ApiError> {
    let too_long = labels
        .iter()
        .filter_map(|label| label.as_deref())
        .any(|label| label.chars().count() > MAX_LABEL_LEN);
    if too_long {
        return Err(ApiError::bad_request(format!(
            "Labels must be at most {MAX_LABEL_LEN} characters"
        )));
    }
    Ok(())
}

fn seal(state: &AppState, fields: &SensitiveFields) -> Result<SensitiveFields, ApiError> {
    state.ciphers().records().seal(fields).map_err(|e| {
        tracing::error!(error = %e, "Failed to encrypt card fields");
        ApiError::internal(STORE_FAILED)
    })
}

fn load_owned(state: &AppState, user: &AuthenticatedUser, card_id: &str) -> Result<StoredCard, ApiError> {
    CardRepository::new(state.storage())
        .get(card_id)
        .verify_owner(user)
        .map_err(|e| ApiError::from_storage(e, CARD_NOT_FOUND))
}

/// Store a new card. Sensitive fields are encrypted before the write.
#[utoipa::path(
    post,
    path = "/v1/cards",
    request_body = CreateCardRequest,
    tag = "Cards",
    responses(
        (status = 201, description = "Card stored", body = Card),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Missing identity"),
        (status = 500, description = "Card could not be encrypted or stored")
    )
)]
pub async fn create_card(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateCardRequest>,
) -> Result<(StatusCode, Json<Card>), ApiError> {
    let holder_name = non_blank(request.holder_name);
    let bank_name = non_blank(request.bank_name);
    let card_name = non_blank(request.card_name);
    validate_labels(&[&holder_name, &bank_name, &card_name])?;

    let plain = SensitiveFields::from_plain(
        non_blank(request.number),
        non_blank(request.cvv),
        non_blank(request.expiry),
    );
    let secrets = seal(&state, &plain)?;

    let now = Utc::now();
    let card = StoredCard {
        id: uuid::Uuid::new_v4().to_string(),
        owner_user_id: user.user_id.clone(),
        category: request.category,
        holder_name,
        bank_name,
        card_name,
        cvv_added_at: plain.cvv.as_ref().map(|_| now),
        secrets,
        image: None,
        created_at: now,
        updated_at: now,
    };

    CardRepository::new(state.storage())
        .create(&card)
        .map_err(|e| {
            tracing::error!(card_id = %card.id, error = %e, "Failed to persist card");
            ApiError::internal(STORE_FAILED)
        })?;

    audit_log!(state.storage(), AuditEventType::CardCreated, user, "card", &card.id);
    tracing::info!(card_id = %card.id, category = ?card.category, "Card created");

    Ok((StatusCode::CREATED, Json(card_view(&state, &card))))
}

/// List the caller's cards, newest first.
#[utoipa::path(
    get,
    path = "/v1/cards",
    tag = "Cards",
    responses(
        (status = 200, body = ListCardsResponse),
        (status = 401, description = "Missing identity")
    )
)]
pub async fn list_cards(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<ListCardsResponse>, ApiError> {
    let cards = CardRepository::new(state.storage())
        .list_by_owner(&user.user_id)
        .map_err(|e| ApiError::from_storage(e, CARD_NOT_FOUND))?;

    Ok(Json(ListCardsResponse {
        cards: cards.iter().map(|card| card_view(&state, card)).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/v1/cards/{card_id}",
    params(("card_id" = String, Path, description = "Card ID")),
    tag = "Cards",
    responses(
        (status = 200, body = Card),
        (status = 404, description = "Card not found")
    )
)]
pub async fn get_card(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(card_id): Path<String>,
) -> Result<Json<Card>, ApiError> {
    let card = load_owned(&state, &user, &card_id)?;
    Ok(Json(card_view(&state, &card)))
}

/// Update a card. Only the sensitive fields named in the request are
/// re-encrypted; an empty string clears a field.
#[utoipa::path(
    put,
    path = "/v1/cards/{card_id}",
    params(("card_id" = String, Path, description = "Card ID")),
    request_body = UpdateCardRequest,
    tag = "Cards",
    responses(
        (status = 200, body = Card),
        (status = 404, description = "Card not found"),
        (status = 500, description = "Card could not be encrypted or stored")
    )
)]
pub async fn update_card(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(card_id): Path<String>,
    Json(request): Json<UpdateCardRequest>,
) -> Result<Json<Card>, ApiError> {
    validate_labels(&[&request.holder_name, &request.bank_name, &request.card_name])?;

    // Seal everything up front so a failure leaves the stored record untouched
    let touched = [
        (SensitiveField::Number, request.number),
        (SensitiveField::Cvv, request.cvv),
        (SensitiveField::Expiry, request.expiry),
    ];
    let mut replacements = SensitiveFields::default();
    for (field, value) in &touched {
        if let Some(value) = value {
            *replacements.slot_mut(*field) = Some(SensitiveValue::Plain(value.trim().to_string()));
        }
    }
    let sealed = seal(&state, &replacements)?;

    let now = Utc::now();
    let updated = CardRepository::new(state.storage()).modify(&card_id, |card| {
        card.verify_ownership(&user)?;

        for (field, value) in &touched {
            if value.is_none() {
                continue;
            }
            // Blank input stays Plain("") after sealing; treat it as a clear
            let replacement = sealed.get(*field).filter(|v| v.is_sealed()).cloned();
            if *field == SensitiveField::Cvv {
                card.cvv_added_at = replacement.as_ref().map(|_| now);
            }
            *card.secrets.slot_mut(*field) = replacement;
        }

        if let Some(category) = request.category {
            card.category = category;
        }
        if request.holder_name.is_some() {
            card.holder_name = non_blank(request.holder_name.clone());
        }
        if request.bank_name.is_some() {
            card.bank_name = non_blank(request.bank_name.clone());
        }
        if request.card_name.is_some() {
            card.card_name = non_blank(request.card_name.clone());
        }
        card.updated_at = now;
        Ok::<_, StorageError>(card.clone())
    });
    let updated = updated.map_err(|e| ApiError::from_storage(e, CARD_NOT_FOUND))?;

    audit_log!(state.storage(), AuditEventType::CardUpdated, user, "card", &card_id);
    Ok(Json(card_view(&state, &updated)))
}

/// Erase the CVV and its timestamp, leaving every other field untouched.
#[utoipa::path(
    delete,
    path = "/v1/cards/{card_id}/cvv",
    params(("card_id" = String, Path, description = "Card ID")),
    tag = "Cards",
    responses(
        (status = 200, body = Card),
        (status = 404, description = "Card not found")
    )
)]
pub async fn erase_cvv(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(card_id): Path<String>,
) -> Result<Json<Card>, ApiError> {
    let updated = CardRepository::new(state.storage())
        .modify(&card_id, |card| {
            card.verify_ownership(&user)?;
            card.erase_cvv(Utc::now());
            Ok::<_, StorageError>(card.clone())
        })
        .map_err(|e| ApiError::from_storage(e, CARD_NOT_FOUND))?;

    audit_log!(state.storage(), AuditEventType::CvvErased, user, "card", &card_id);
    Ok(Json(card_view(&state, &updated)))
}

/// Delete a card, its image and its folder memberships.
#[utoipa::path(
    delete,
    path = "/v1/cards/{card_id}",
    params(("card_id" = String, Path, description = "Card ID")),
    tag = "Cards",
    responses(
        (status = 204, description = "Card deleted"),
        (status = 404, description = "Card not found")
    )
)]
pub async fn delete_card(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(card_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let card = load_owned(&state, &user, &card_id)?;

    FolderRepository::new(state.storage())
        .remove_card_everywhere(&user.user_id, &card_id)
        .map_err(|e| ApiError::from_storage(e, CARD_NOT_FOUND))?;

    CardRepository::new(state.storage())
        .delete(&card_id)
        .map_err(|e| ApiError::from_storage(e, CARD_NOT_FOUND))?;

    if let Some(image) = &card.image {
        if let Err(e) = state.objects().delete(image.path()) {
            tracing::warn!(card_id = %card_id, error = %e, "Failed to delete card image");
        }
    }

    audit_log!(state.storage(), AuditEventType::CardDeleted, user, "card", &card_id);
    Ok(StatusCode::NO_CONTENT)
}

/// Upload a card photograph. The image is encrypted at rest before the
/// card record points at it.
#[utoipa::path(
    put,
    path = "/v1/cards/{card_id}/image",
    params(("card_id" = String, Path, description = "Card ID")),
    request_body(content = Vec<u8>, content_type = "image/jpeg"),
    tag = "Cards",
    responses(
        (status = 200, body = Card),
        (status = 400, description = "Empty image"),
        (status = 404, description = "Card not found"),
        (status = 500, description = "Image could not be encrypted or stored")
    )
)]
pub async fn upload_image(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(card_id): Path<String>,
    body: Bytes,
) -> Result<Json<Card>, ApiError> {
    if body.is_empty() {
        return Err(ApiError::bad_request("Image body is empty"));
    }
    load_owned(&state, &user, &card_id)?;

    let objects = state.objects();
    let plain_path = card_image_object(&card_id, &uuid::Uuid::new_v4().to_string());
    objects.upload(&plain_path, &body).map_err(|e| {
        tracing::error!(card_id = %card_id, error = %e, "Failed to upload card image");
        ApiError::internal("Failed to store image")
    })?;

    let sealed_path = match encrypt_stored_image(objects, state.ciphers().images(), &plain_path) {
        Ok(path) => path,
        Err(e) => {
            tracing::error!(card_id = %card_id, error = %e, "Failed to encrypt card image");
            if let Err(e) = objects.delete(&plain_path) {
                tracing::warn!(object = %plain_path, error = %e, "Failed to remove unencrypted upload");
            }
            return Err(ApiError::internal("Failed to store image"));
        }
    };

    let update = CardRepository::new(state.storage()).modify(&card_id, |card| {
        card.verify_ownership(&user)?;
        let previous = card.image.replace(StoredImage::Sealed(sealed_path.clone()));
        card.updated_at = Utc::now();
        Ok::<_, StorageError>((card.clone(), previous))
    });
    let (updated, previous) = match update {
        Ok(result) => result,
        Err(e) => {
            if let Err(e) = objects.delete(&sealed_path) {
                tracing::warn!(object = %sealed_path, error = %e, "Failed to remove orphaned image");
            }
            return Err(ApiError::from_storage(e, CARD_NOT_FOUND));
        }
    };

    if let Some(previous) = previous {
        if let Err(e) = objects.delete(previous.path()) {
            tracing::warn!(object = %previous.path(), error = %e, "Failed to delete replaced image");
        }
    }

    audit_log!(state.storage(), AuditEventType::ImageEncrypted, user, "card", &card_id);
    Ok(Json(card_view(&state, &updated)))
}

/// Decrypted card photograph for its owner.
#[utoipa::path(
    get,
    path = "/v1/cards/{card_id}/image",
    params(("card_id" = String, Path, description = "Card ID")),
    tag = "Cards",
    responses(
        (status = 200, description = "JPEG bytes", content_type = "image/jpeg"),
        (status = 404, description = "Card not found or image unavailable")
    )
)]
pub async fn get_image(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(card_id): Path<String>,
) -> Result<Response, ApiError> {
    let card = load_owned(&state, &user, &card_id)?;
    let image = card
        .image
        .ok_or_else(|| ApiError::not_found(IMAGE_UNAVAILABLE))?;

    let bytes = match &image {
        StoredImage::Sealed(path) => {
            get_decrypted_image(state.objects(), state.ciphers().images(), path)
        }
        StoredImage::Plain(path) => get_plain_image(state.objects(), path),
    }
    .map_err(|e| {
        tracing::warn!(card_id = %card_id, error = %e, "Card image unavailable");
        ApiError::not_found(IMAGE_UNAVAILABLE)
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/jpeg"),
            (header::CACHE_CONTROL, "private, no-store"),
        ],
        bytes,
    )
        .into_response())
}
