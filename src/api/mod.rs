use crate::{
    auth::AuthService,
    cli::globals::GlobalArgs,
    store::{memory::MemoryStore, postgres::PgStore, SharedStore},
};
use anyhow::{anyhow, Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    Extension, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use url::Url;
use utoipa_axum::router::OpenApiRouter;

pub(crate) mod handlers;
// OpenAPI router wiring and route registration live in openapi.rs.
mod openapi;

pub use openapi::openapi;

/// Build the API router with all documented routes registered.
#[must_use]
pub fn router() -> OpenApiRouter {
    openapi::api_router()
}

/// Assemble the application: routes, layers, and shared state.
///
/// # Errors
/// Returns an error if the configured frontend origin is not a valid URL.
pub fn app(store: SharedStore, globals: &GlobalArgs) -> Result<Router> {
    let auth = Arc::new(AuthService::new(store.clone(), globals));

    let frontend_origin = frontend_origin(&globals.frontend_url)?;
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_origin(AllowOrigin::exact(frontend_origin))
        .allow_credentials(true);

    let (router, _openapi) = router().split_for_parts();
    let app = router.layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static("x-request-id"),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(cors)
            .layer(Extension(globals.clone()))
            .layer(Extension(store))
            .layer(Extension(auth)),
    );

    Ok(app)
}

/// Start the server
///
/// The DSN picks the store backend: `memory:` keeps everything in-process,
/// anything else is treated as a Postgres connection string.
///
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, dsn: &str, globals: &GlobalArgs) -> Result<()> {
    let store: SharedStore = if dsn.starts_with("memory:") {
        Arc::new(MemoryStore::new())
    } else {
        let store = PgStore::connect(dsn).await?;
        store.migrate().await?;
        Arc::new(store)
    };

    let app = app(store, globals)?;

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

fn frontend_origin(frontend_url: &str) -> Result<HeaderValue> {
    let parsed =
        Url::parse(frontend_url).with_context(|| format!("Invalid frontend URL: {frontend_url}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("Frontend URL must include a valid host: {frontend_url}"))?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build frontend origin header")
}
