use crate::store::{SharedStore, UserStore};
use crate::GIT_COMMIT_HASH;
use axum::{
    extract::Extension,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    store: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Store is reachable", body = Health),
        (status = 503, description = "Store is unreachable", body = Health)
    ),
    tag = "health"
)]
// axum handler for health
pub async fn health(store: Extension<SharedStore>) -> impl IntoResponse {
    let result = store.ping().await;

    if let Err(err) = &result {
        error!("Store health check failed: {err}");
    }

    let health = Health {
        commit: GIT_COMMIT_HASH.to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: if result.is_ok() {
            "ok".to_string()
        } else {
            "error".to_string()
        },
    };

    let short_hash = if health.commit.len() > 7 {
        &health.commit[0..7]
    } else {
        ""
    };

    let mut headers = HeaderMap::new();
    if let Ok(value) = format!("{}:{}:{}", health.name, health.version, short_hash)
        .parse::<HeaderValue>()
    {
        debug!("X-App header: {:?}", value);
        headers.insert("X-App", value);
    }

    let status = if result.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, headers, Json(health))
}
