use crate::auth::{AuthError, AuthService};
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    username: String,
    password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterResponse {
    message: String,
    #[serde(rename = "secretBase32")]
    secret_base32: String,
    #[serde(rename = "enrollmentURI")]
    enrollment_uri: String,
}

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful, 2FA enrollment pending", body = RegisterResponse),
        (status = 400, description = "Validation error or username already exists", body = String),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn register(
    auth: Extension<Arc<AuthService>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let request: RegisterRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    debug!("registration attempt for {}", request.username);

    match auth.register(&request.username, &request.password).await {
        Ok(enrollment) => (
            StatusCode::CREATED,
            Json(RegisterResponse {
                message: "User registered successfully. Please setup 2FA.".to_string(),
                secret_base32: enrollment.secret_base32,
                enrollment_uri: enrollment.uri,
            }),
        )
            .into_response(),

        Err(AuthError::Validation(message)) => {
            (StatusCode::BAD_REQUEST, message).into_response()
        }

        Err(AuthError::UsernameTaken) => (
            StatusCode::BAD_REQUEST,
            "Username already exists".to_string(),
        )
            .into_response(),

        Err(err) => {
            error!("Registration failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
                .into_response()
        }
    }
}
