//! Vault entry endpoints. Every route resolves the bearer token first and
//! only ever touches the authenticated owner's entries.

use crate::api::handlers::require_auth;
use crate::auth::AuthService;
use crate::store::{NewVaultEntry, SharedStore, StoreError, UserStore, VaultEntry};
use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct NewEntryRequest {
    site: String,
    #[serde(rename = "entryUsername")]
    username: String,
    #[serde(rename = "secretValue")]
    secret_value: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct DeleteEntryResponse {
    message: String,
}

#[utoipa::path(
    get,
    path = "/passwords",
    responses(
        (status = 200, description = "The caller's entries in insertion order", body = [VaultEntry]),
        (status = 401, description = "Access token required"),
        (status = 403, description = "Invalid or expired token"),
        (status = 404, description = "Unknown user", body = String),
    ),
    tag = "vault"
)]
#[instrument(skip_all)]
pub async fn list_entries(
    headers: HeaderMap,
    store: Extension<SharedStore>,
    auth: Extension<Arc<AuthService>>,
) -> impl IntoResponse {
    let user_id = match require_auth(&headers, &auth) {
        Ok(user_id) => user_id,
        Err((status, message)) => return (status, message).into_response(),
    };

    match store.list_entries(user_id).await {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),

        Err(StoreError::NotFound) => {
            (StatusCode::NOT_FOUND, "User not found".to_string()).into_response()
        }

        Err(err) => {
            error!("Failed to list vault entries: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/passwords",
    request_body = NewEntryRequest,
    responses(
        (status = 201, description = "Entry saved", body = VaultEntry),
        (status = 400, description = "Validation error", body = String),
        (status = 401, description = "Access token required"),
        (status = 403, description = "Invalid or expired token"),
        (status = 404, description = "Unknown user", body = String),
    ),
    tag = "vault"
)]
#[instrument(skip_all)]
pub async fn add_entry(
    headers: HeaderMap,
    store: Extension<SharedStore>,
    auth: Extension<Arc<AuthService>>,
    payload: Option<Json<NewEntryRequest>>,
) -> impl IntoResponse {
    let user_id = match require_auth(&headers, &auth) {
        Ok(user_id) => user_id,
        Err((status, message)) => return (status, message).into_response(),
    };

    let request: NewEntryRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    if request.site.is_empty() || request.username.is_empty() || request.secret_value.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            "All fields are required".to_string(),
        )
            .into_response();
    }

    let entry = NewVaultEntry {
        site: request.site,
        username: request.username,
        secret_value: request.secret_value,
    };

    match store.append_entry(user_id, entry).await {
        Ok(entry) => (StatusCode::CREATED, Json(entry)).into_response(),

        Err(StoreError::NotFound) => {
            (StatusCode::NOT_FOUND, "User not found".to_string()).into_response()
        }

        Err(err) => {
            error!("Failed to save vault entry: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/passwords/{id}",
    params(
        ("id" = Uuid, Path, description = "Entry id")
    ),
    responses(
        (status = 200, description = "Entry deleted (idempotent)", body = DeleteEntryResponse),
        (status = 401, description = "Access token required"),
        (status = 403, description = "Invalid or expired token"),
        (status = 404, description = "Unknown user", body = String),
    ),
    tag = "vault"
)]
#[instrument(skip_all)]
pub async fn delete_entry(
    headers: HeaderMap,
    store: Extension<SharedStore>,
    auth: Extension<Arc<AuthService>>,
    Path(entry_id): Path<Uuid>,
) -> impl IntoResponse {
    let user_id = match require_auth(&headers, &auth) {
        Ok(user_id) => user_id,
        Err((status, message)) => return (status, message).into_response(),
    };

    match store.remove_entry(user_id, entry_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(DeleteEntryResponse {
                message: "Password deleted successfully".to_string(),
            }),
        )
            .into_response(),

        Err(StoreError::NotFound) => {
            (StatusCode::NOT_FOUND, "User not found".to_string()).into_response()
        }

        Err(err) => {
            error!("Failed to delete vault entry: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
                .into_response()
        }
    }
}
