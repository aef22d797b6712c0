// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Folder and share link endpoints for the folder owner.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::json;

use crate::{
    audit_log,
    auth::{Auth, AuthenticatedUser},
    error::ApiError,
    models::{
        non_blank, AddFolderCardRequest, CreateFolderRequest, CreateShareLinkRequest, Folder,
        ListFoldersResponse, ShareHistoryResponse, ShareLink, UpdateFolderRequest, MAX_LABEL_LEN,
    },
    share::{public_url, token::DEFAULT_EXPIRY, ShareHistoryEntry, ShareLinks},
    state::AppState,
    storage::{
        AuditEvent, AuditEventType, AuditRepository, CardRepository, FolderRepository,
        OwnershipCheck, OwnershipEnforcer, ShareFolder, StorageError,
    },
};

const FOLDER_NOT_FOUND: &str = "Folder not found";

fn folder_view(folder: &ShareFolder) -> Folder {
    Folder {
        id: folder.id.clone(),
        name: folder.name.clone(),
        description: folder.description.clone(),
        card_ids: folder.card_ids.clone(),
        is_public: folder.sharing.is_public(),
        share_token: folder.sharing.share_token().map(str::to_string),
        expires_at: folder.sharing.expires_at(),
        created_at: folder.created_at,
        updated_at: folder.updated_at,
    }
}

fn validate_name(name: &str) -> Result<String, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Folder name is required"));
    }
    if name.chars().count() > MAX_LABEL_LEN {
        return Err(ApiError::bad_request(format!(
            "Folder name must be at most {MAX_LABEL_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

/// Failure inside a folder edit: either storage or a rejected request.
enum EditError {
    Storage(StorageError),
    Rejected(ApiError),
}

impl From<StorageError> for EditError {
    fn from(error: StorageError) -> Self {
        Self::Storage(error)
    }
}

/// Apply `mutate` to a folder the caller owns. Nothing is written on error.
fn modify_owned<F>(
    state: &AppState,
    user: &AuthenticatedUser,
    folder_id: &str,
    mutate: F,
) -> Result<ShareFolder, ApiError>
where
    F: FnOnce(&mut ShareFolder) -> Result<(), ApiError>,
{
    FolderRepository::new(state.storage())
        .modify(folder_id, |folder| {
            folder.verify_ownership(user)?;
            mutate(folder).map_err(EditError::Rejected)?;
            folder.updated_at = Utc::now();
            Ok(folder.clone())
        })
        .map_err(|e| match e {
            EditError::Storage(e) => ApiError::from_storage(e, FOLDER_NOT_FOUND),
            EditError::Rejected(e) => e,
        })
}

#[utoipa::path(
    post,
    path = "/v1/folders",
    request_body = CreateFolderRequest,
    tag = "Folders",
    responses(
        (status = 201, body = Folder),
        (status = 400, description = "Invalid folder name")
    )
)]
pub async fn create_folder(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateFolderRequest>,
) -> Result<(StatusCode, Json<Folder>), ApiError> {
    let name = validate_name(&request.name)?;
    let folder = ShareFolder::new(
        uuid::Uuid::new_v4().to_string(),
        user.user_id.clone(),
        name,
        non_blank(request.description),
        Utc::now(),
    );

    FolderRepository::new(state.storage())
        .create(&folder)
        .map_err(|e| ApiError::from_storage(e, FOLDER_NOT_FOUND))?;

    audit_log!(state.storage(), AuditEventType::FolderCreated, user, "folder", &folder.id);
    Ok((StatusCode::CREATED, Json(folder_view(&folder))))
}

#[utoipa::path(
    get,
    path = "/v1/folders",
    tag = "Folders",
    responses((status = 200, body = ListFoldersResponse))
)]
pub async fn list_folders(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<ListFoldersResponse>, ApiError> {
    let folders = FolderRepository::new(state.storage())
        .list_by_owner(&user.user_id)
        .map_err(|e| ApiError::from_storage(e, FOLDER_NOT_FOUND))?;

    Ok(Json(ListFoldersResponse {
        folders: folders.iter().map(folder_view).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/v1/folders/{folder_id}",
    params(("folder_id" = String, Path, description = "Folder ID")),
    tag = "Folders",
    responses(
        (status = 200, body = Folder),
        (status = 404, description = "Folder not found")
    )
)]
pub async fn get_folder(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(folder_id): Path<String>,
) -> Result<Json<Folder>, ApiError> {
    let folder = FolderRepository::new(state.storage())
        .get(&folder_id)
        .verify_owner(&user)
        .map_err(|e| ApiError::from_storage(e, FOLDER_NOT_FOUND))?;
    Ok(Json(folder_view(&folder)))
}

#[utoipa::path(
    patch,
    path = "/v1/folders/{folder_id}",
    params(("folder_id" = String, Path, description = "Folder ID")),
    request_body = UpdateFolderRequest,
    tag = "Folders",
    responses(
        (status = 200, body = Folder),
        (status = 400, description = "Invalid folder name"),
        (status = 404, description = "Folder not found")
    )
)]
pub async fn update_folder(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(folder_id): Path<String>,
    Json(request): Json<UpdateFolderRequest>,
) -> Result<Json<Folder>, ApiError> {
    let name = request.name.as_deref().map(validate_name).transpose()?;

    let folder = modify_owned(&state, &user, &folder_id, |folder| {
        if let Some(name) = name {
            folder.name = name;
        }
        if request.description.is_some() {
            folder.description = non_blank(request.description);
        }
        Ok(())
    })?;
    Ok(Json(folder_view(&folder)))
}

/// Delete a folder. Its share history goes with it; member cards are kept.
#[utoipa::path(
    delete,
    path = "/v1/folders/{folder_id}",
    params(("folder_id" = String, Path, description = "Folder ID")),
    tag = "Folders",
    responses(
        (status = 204, description = "Folder deleted"),
        (status = 404, description = "Folder not found")
    )
)]
pub async fn delete_folder(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(folder_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let repo = FolderRepository::new(state.storage());
    repo.get(&folder_id)
        .verify_owner(&user)
        .and_then(|_| repo.delete(&folder_id))
        .map_err(|e| ApiError::from_storage(e, FOLDER_NOT_FOUND))?;

    audit_log!(state.storage(), AuditEventType::FolderDeleted, user, "folder", &folder_id);
    Ok(StatusCode::NO_CONTENT)
}

/// Add one of the caller's cards to a folder. Adding twice is a no-op.
#[utoipa::path(
    post,
    path = "/v1/folders/{folder_id}/cards",
    params(("folder_id" = String, Path, description = "Folder ID")),
    request_body = AddFolderCardRequest,
    tag = "Folders",
    responses(
        (status = 200, body = Folder),
        (status = 404, description = "Folder or card not found")
    )
)]
pub async fn add_folder_card(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(folder_id): Path<String>,
    Json(request): Json<AddFolderCardRequest>,
) -> Result<Json<Folder>, ApiError> {
    CardRepository::new(state.storage())
        .get(&request.card_id)
        .verify_owner(&user)
        .map_err(|e| ApiError::from_storage(e, "Card not found"))?;

    let folder = modify_owned(&state, &user, &folder_id, |folder| {
        folder.insert_card(request.card_id.clone());
        Ok(())
    })?;
    Ok(Json(folder_view(&folder)))
}

#[utoipa::path(
    delete,
    path = "/v1/folders/{folder_id}/cards/{card_id}",
    params(
        ("folder_id" = String, Path, description = "Folder ID"),
        ("card_id" = String, Path, description = "Card ID")
    ),
    tag = "Folders",
    responses(
        (status = 200, body = Folder),
        (status = 404, description = "Folder not found or card not in folder")
    )
)]
pub async fn remove_folder_card(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path((folder_id, card_id)): Path<(String, String)>,
) -> Result<Json<Folder>, ApiError> {
    let folder = modify_owned(&state, &user, &folder_id, |folder| {
        if folder.remove_card(&card_id) {
            Ok(())
        } else {
            Err(ApiError::not_found("Card is not in this folder"))
        }
    })?;
    Ok(Json(folder_view(&folder)))
}

/// Generate a public share link, revoking any active one.
#[utoipa::path(
    post,
    path = "/v1/folders/{folder_id}/share",
    params(("folder_id" = String, Path, description = "Folder ID")),
    request_body = CreateShareLinkRequest,
    tag = "Sharing",
    responses(
        (status = 201, body = ShareLink),
        (status = 404, description = "Folder not found"),
        (status = 422, description = "Folder has no cards")
    )
)]
pub async fn create_share_link(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(folder_id): Path<String>,
    request: Option<Json<CreateShareLinkRequest>>,
) -> Result<(StatusCode, Json<ShareLink>), ApiError> {
    let expires_in = request
        .and_then(|Json(request)| non_blank(request.expires_in))
        .unwrap_or_else(|| DEFAULT_EXPIRY.to_string());

    let issued = ShareLinks::new(FolderRepository::new(state.storage())).generate(
        &user,
        &folder_id,
        &expires_in,
        Utc::now(),
    )?;

    let share_url = public_url(&state.share_settings().public_base_url, &issued.token)
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build share URL");
            ApiError::internal("Failed to build share URL")
        })?;

    AuditRepository::new(state.storage()).record(
        AuditEvent::new(AuditEventType::ShareLinkGenerated)
            .with_user(&user.user_id)
            .with_resource("folder", &folder_id)
            .with_details(json!({
                "token_prefix": crate::share::token::token_prefix(&issued.token),
                "expires_in": expires_in,
                "expires_at": issued.expires_at,
            })),
    );

    Ok((
        StatusCode::CREATED,
        Json(ShareLink {
            share_url: share_url.to_string(),
            token: issued.token,
            expires_at: issued.expires_at,
        }),
    ))
}

/// Revoke the active share link.
#[utoipa::path(
    delete,
    path = "/v1/folders/{folder_id}/share",
    params(("folder_id" = String, Path, description = "Folder ID")),
    tag = "Sharing",
    responses(
        (status = 200, description = "Revoked entry", body = ShareHistoryEntry),
        (status = 404, description = "Folder not found"),
        (status = 409, description = "No active share link")
    )
)]
pub async fn revoke_share_link(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(folder_id): Path<String>,
) -> Result<Json<ShareHistoryEntry>, ApiError> {
    let revoked = ShareLinks::new(FolderRepository::new(state.storage())).revoke(
        &user,
        &folder_id,
        Utc::now(),
    )?;

    AuditRepository::new(state.storage()).record(
        AuditEvent::new(AuditEventType::ShareLinkRevoked)
            .with_user(&user.user_id)
            .with_resource("folder", &folder_id)
            .with_details(json!({
                "token_prefix": crate::share::token::token_prefix(&revoked.token),
            })),
    );

    Ok(Json(revoked))
}

/// All links ever issued for the folder, newest first.
#[utoipa::path(
    get,
    path = "/v1/folders/{folder_id}/share/history",
    params(("folder_id" = String, Path, description = "Folder ID")),
    tag = "Sharing",
    responses(
        (status = 200, body = ShareHistoryResponse),
        (status = 404, description = "Folder not found")
    )
)]
pub async fn share_history(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(folder_id): Path<String>,
) -> Result<Json<ShareHistoryResponse>, ApiError> {
    let history = ShareLinks::new(FolderRepository::new(state.storage()))
        .history(&user, &folder_id)?;
    Ok(Json(ShareHistoryResponse { history }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::cards::create_card;
    use crate::models::CreateCardRequest;
    use crate::state::test_support::test_app;
    use crate::storage::CardCategory;

    fn auth(user_id: &str) -> Auth {
        Auth(AuthenticatedUser::new(user_id))
    }

    async fn folder(state: &AppState, user: &str) -> Folder {
        let (_, Json(folder)) = create_folder(
            auth(user),
            State(state.clone()),
            Json(CreateFolderRequest {
                name: "  Travel ".to_string(),
                description: None,
            }),
        )
        .await
        .unwrap();
        folder
    }

    async fn card(state: &AppState, user: &str) -> String {
        let (_, Json(card)) = create_card(
            auth(user),
            State(state.clone()),
            Json(CreateCardRequest {
                category: CardCategory::Debit,
                holder_name: None,
                bank_name: None,
                card_name: None,
                number: Some("4111111111111111".to_string()),
                cvv: None,
                expiry: None,
            }),
        )
        .await
        .unwrap();
        card.id
    }

    async fn share(state: &AppState, user: &str, folder_id: &str, expires_in: Option<&str>) -> Result<ShareLink, ApiError> {
        create_share_link(
            auth(user),
            State(state.clone()),
            Path(folder_id.to_string()),
            Some(Json(CreateShareLinkRequest {
                expires_in: expires_in.map(str::to_string),
            })),
        )
        .await
        .map(|(_, Json(link))| link)
    }

    #[tokio::test]
    async fn create_folder_trims_and_validates_name() {
        let app = test_app();
        let created = folder(&app.state, "user-1").await;
        assert_eq!(created.name, "Travel");
        assert!(!created.is_public);
        assert!(created.card_ids.is_empty());

        let err = create_folder(
            auth("user-1"),
            State(app.state.clone()),
            Json(CreateFolderRequest {
                name: "   ".to_string(),
                description: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn add_card_requires_owned_card() {
        let app = test_app();
        let folder = folder(&app.state, "user-1").await;
        let foreign = card(&app.state, "user-2").await;

        let err = add_folder_card(
            auth("user-1"),
            State(app.state.clone()),
            Path(folder.id.clone()),
            Json(AddFolderCardRequest { card_id: foreign }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let own = card(&app.state, "user-1").await;
        for _ in 0..2 {
            let Json(updated) = add_folder_card(
                auth("user-1"),
                State(app.state.clone()),
                Path(folder.id.clone()),
                Json(AddFolderCardRequest { card_id: own.clone() }),
            )
            .await
            .unwrap();
            assert_eq!(updated.card_ids.len(), 1);
        }
        let Json(loaded) = get_folder(auth("user-1"), State(app.state.clone()), Path(folder.id))
            .await
            .unwrap();
        assert_eq!(loaded.card_ids, vec![own]);
    }

    #[tokio::test]
    async fn empty_folder_share_rejected() {
        let app = test_app();
        let folder = folder(&app.state, "user-1").await;

        let err = share(&app.state, "user-1", &folder.id, Some("24h")).await.unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);

        let Json(history) = share_history(auth("user-1"), State(app.state.clone()), Path(folder.id))
            .await
            .unwrap();
        assert!(history.history.is_empty());
    }

    #[tokio::test]
    async fn share_lifecycle_through_handlers() {
        let app = test_app();
        let folder = folder(&app.state, "user-1").await;
        let card_id = card(&app.state, "user-1").await;
        let Json(updated) = add_folder_card(
            auth("user-1"),
            State(app.state.clone()),
            Path(folder.id.clone()),
            Json(AddFolderCardRequest { card_id: card_id.clone() }),
        )
        .await
        .unwrap();
        assert_eq!(updated.card_ids, vec![card_id]);

        let first = share(&app.state, "user-1", &folder.id, None).await.unwrap();
        assert_eq!(
            first.share_url,
            format!("https://vault.example.com/share/{}", first.token)
        );
        assert!(first.expires_at.is_some());

        let second = share(&app.state, "user-1", &folder.id, Some("never")).await.unwrap();
        assert!(second.expires_at.is_none());

        let Json(loaded) = get_folder(auth("user-1"), State(app.state.clone()), Path(folder.id.clone()))
            .await
            .unwrap();
        assert!(loaded.is_public);
        assert_eq!(loaded.share_token.as_deref(), Some(second.token.as_str()));

        let Json(revoked) =
            revoke_share_link(auth("user-1"), State(app.state.clone()), Path(folder.id.clone()))
                .await
                .unwrap();
        assert_eq!(revoked.token, second.token);

        let err = revoke_share_link(auth("user-1"), State(app.state.clone()), Path(folder.id.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);

        let Json(history) = share_history(auth("user-1"), State(app.state.clone()), Path(folder.id))
            .await
            .unwrap();
        assert_eq!(history.history.len(), 2);
        assert!(history.history.iter().all(|entry| !entry.is_active));
        assert!(history.history.iter().all(|entry| entry.revoked_at.is_some()));
    }

    #[tokio::test]
    async fn other_users_cannot_share() {
        let app = test_app();
        let folder = folder(&app.state, "user-1").await;

        let err = share(&app.state, "user-2", &folder.id, None).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err = share_history(auth("user-2"), State(app.state.clone()), Path(folder.id))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn remove_missing_member_is_not_found() {
        let app = test_app();
        let folder = folder(&app.state, "user-1").await;

        let err = remove_folder_card(
            auth("user-1"),
            State(app.state.clone()),
            Path((folder.id.clone(), "ghost".to_string())),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Card is not in this folder");
    }

    #[tokio::test]
    async fn update_and_delete_folder() {
        let app = test_app();
        let folder = folder(&app.state, "user-1").await;

        let Json(updated) = update_folder(
            auth("user-1"),
            State(app.state.clone()),
            Path(folder.id.clone()),
            Json(UpdateFolderRequest {
                name: Some("Work".to_string()),
                description: Some("Corporate cards".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Work");
        assert_eq!(updated.description.as_deref(), Some("Corporate cards"));

        let status = delete_folder(auth("user-1"), State(app.state.clone()), Path(folder.id.clone()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let err = get_folder(auth("user-1"), State(app.state.clone()), Path(folder.id))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
