use crate::auth::{AuthError, AuthService};
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Verify2faRequest {
    username: String,
    code: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Verify2faResponse {
    message: String,
    username: String,
}

#[utoipa::path(
    post,
    path = "/verify-2fa",
    request_body = Verify2faRequest,
    responses(
        (status = 200, description = "2FA enrollment confirmed", body = Verify2faResponse),
        (status = 400, description = "Validation error or invalid code", body = String),
        (status = 404, description = "Unknown user", body = String),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn verify_2fa(
    auth: Extension<Arc<AuthService>>,
    payload: Option<Json<Verify2faRequest>>,
) -> impl IntoResponse {
    let request: Verify2faRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    debug!("2FA enrollment confirmation for {}", request.username);

    match auth
        .confirm_enrollment(&request.username, &request.code)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(Verify2faResponse {
                message: "2FA setup completed successfully".to_string(),
                username: request.username,
            }),
        )
            .into_response(),

        Err(AuthError::Validation(message)) => {
            (StatusCode::BAD_REQUEST, message).into_response()
        }

        Err(AuthError::UserNotFound) => {
            (StatusCode::NOT_FOUND, "User not found".to_string()).into_response()
        }

        Err(AuthError::InvalidCode) => {
            (StatusCode::BAD_REQUEST, "Invalid 2FA code".to_string()).into_response()
        }

        Err(err) => {
            error!("2FA verification failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
                .into_response()
        }
    }
}
