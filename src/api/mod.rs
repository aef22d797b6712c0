// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        AddFolderCardRequest, Card, CreateCardRequest, CreateFolderRequest,
        CreateShareLinkRequest, Folder, ListCardsResponse, ListFoldersResponse, ShareHistoryResponse,
        ShareLink, UpdateCardRequest, UpdateFolderRequest,
    },
    share::{PublicCard, PublicFolder, PublicShareView, ShareHistoryEntry},
    state::AppState,
    storage::CardCategory,
};

pub mod cards;
pub mod folders;
pub mod health;
pub mod public;

/// Largest accepted card image upload.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/cards", get(cards::list_cards).post(cards::create_card))
        .route(
            "/cards/{card_id}",
            get(cards::get_card)
                .put(cards::update_card)
                .delete(cards::delete_card),
        )
        .route("/cards/{card_id}/cvv", delete(cards::erase_cvv))
        .route(
            "/cards/{card_id}/image",
            get(cards::get_image)
                .put(cards::upload_image)
                .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES)),
        )
        .route(
            "/folders",
            get(folders::list_folders).post(folders::create_folder),
        )
        .route(
            "/folders/{folder_id}",
            get(folders::get_folder)
                .patch(folders::update_folder)
                .delete(folders::delete_folder),
        )
        .route("/folders/{folder_id}/cards", post(folders::add_folder_card))
        .route(
            "/folders/{folder_id}/cards/{card_id}",
            delete(folders::remove_folder_card),
        )
        .route(
            "/folders/{folder_id}/share",
            post(folders::create_share_link).delete(folders::revoke_share_link),
        )
        .route(
            "/folders/{folder_id}/share/history",
            get(folders::share_history),
        )
        .route("/public/share/{token}", get(public::get_shared_folder))
        .route(
            "/public/share/{token}/cards/{card_id}/image",
            get(public::get_shared_image),
        )
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        cards::create_card,
        cards::list_cards,
        cards::get_card,
        cards::update_card,
        cards::delete_card,
        cards::erase_cvv,
        cards::upload_image,
        cards::get_image,
        folders::create_folder,
        folders::list_folders,
        folders::get_folder,
        folders::update_folder,
        folders::delete_folder,
        folders::add_folder_card,
        folders::remove_folder_card,
        folders::create_share_link,
        folders::revoke_share_link,
        folders::share_history,
        public::get_shared_folder,
        public::get_shared_image,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            CardCategory,
            Card,
            CreateCardRequest,
            UpdateCardRequest,
            ListCardsResponse,
            Folder,
            CreateFolderRequest,
            UpdateFolderRequest,
            AddFolderCardRequest,
            ListFoldersResponse,
            CreateShareLinkRequest,
            ShareLink,
            ShareHistoryEntry,
            ShareHistoryResponse,
            PublicShareView,
            PublicFolder,
            PublicCard,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Cards", description = "Card storage with encrypted sensitive fields"),
        (name = "Folders", description = "Folders of cards"),
        (name = "Sharing", description = "Share link generation, revocation and history"),
        (name = "Public", description = "Unauthenticated share link access"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::test_app;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn owner_routes_require_identity() {
        let app = test_app();
        let response = router(app.state.clone())
            .oneshot(Request::get("/v1/cards").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn create_card_over_http() {
        let app = test_app();
        let response = router(app.state.clone())
            .oneshot(
                Request::post("/v1/cards")
                    .header("x-user-id", "user-1")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"category":"credit","number":"4111111111111111"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(response.headers().contains_key("x-request-id"));

        let card = body_json(response).await;
        assert_eq!(card["category"], "credit");
        assert_eq!(card["number"], "4111111111111111");
    }

    #[tokio::test]
    async fn unknown_share_token_is_not_found() {
        let app = test_app();
        let response = router(app.state.clone())
            .oneshot(
                Request::get("/v1/public/share/does-not-exist")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "error": "Share link not found" })
        );
    }

    #[tokio::test]
    async fn health_and_docs_are_served() {
        let app = test_app();
        for uri in ["/health", "/health/live", "/health/ready", "/api-doc/openapi.json"] {
            let response = router(app.state.clone())
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
        }
    }
}
