use crate::auth::{AuthError, AuthService};
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    username: String,
    password: String,
    code: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    message: String,
    #[serde(rename = "sessionToken")]
    session_token: String,
    username: String,
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Validation error", body = String),
        (status = 401, description = "Invalid credentials or 2FA code", body = String),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login(
    auth: Extension<Arc<AuthService>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    match auth
        .login(&request.username, &request.password, &request.code)
        .await
    {
        Ok(session) => (
            StatusCode::OK,
            Json(LoginResponse {
                message: "Login successful".to_string(),
                session_token: session.token,
                username: session.username,
            }),
        )
            .into_response(),

        Err(AuthError::Validation(message)) => {
            (StatusCode::BAD_REQUEST, message).into_response()
        }

        // Unknown username and wrong password share one message on purpose.
        Err(AuthError::InvalidCredentials) => {
            debug!("login rejected for {}", request.username);
            (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string()).into_response()
        }

        Err(AuthError::InvalidCode) => {
            (StatusCode::UNAUTHORIZED, "Invalid 2FA code".to_string()).into_response()
        }

        Err(err) => {
            error!("Login failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
                .into_response()
        }
    }
}
