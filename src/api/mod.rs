//! API layer - HTTP handlers and routing
//!
//! This module contains the HTTP API of the weblog back office.
//! It includes:
//! - Admin model registry
//! - Tag, series, entry, quotation, blogmark and photo endpoints
//! - Health check
//! - Static serving of uploaded photos under /media

pub mod admin;
pub mod blogmarks;
pub mod common;
pub mod entries;
pub mod health;
pub mod middleware;
pub mod photos;
pub mod quotations;
pub mod series;
pub mod tags;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::{MediaConfig, ServerConfig};

pub use middleware::{ApiError, AppState};

/// Room left for the non-file multipart parts of a photo upload
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the main API router
pub fn build_api_router(state: AppState, media: &MediaConfig) -> Router<AppState> {
    let upload_limit = usize::try_from(media.max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    // Admin routes (need the admin token)
    let admin_routes = Router::new()
        .nest("/admin", admin::router())
        .nest("/admin/tags", tags::router())
        .nest("/admin/series", series::router())
        .nest("/admin/entries", entries::router())
        .nest("/admin/quotations", quotations::router())
        .nest("/admin/blogmarks", blogmarks::router())
        .nest(
            "/admin/photos",
            photos::router().layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_admin,
        ));

    // Public routes
    Router::new()
        .route("/health", get(health::health))
        .merge(admin_routes)
}

/// Build the complete router with middleware
pub fn build_router(
    state: AppState,
    server: &ServerConfig,
    media: &MediaConfig,
) -> anyhow::Result<Router> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);
    let cors = if server.cors_origin == "*" {
        cors.allow_origin(Any)
    } else {
        let origin = server
            .cors_origin
            .parse::<HeaderValue>()
            .with_context(|| format!("Invalid CORS origin: {}", server.cors_origin))?;
        cors.allow_origin(origin)
    };

    let media_prefix = format!("/{}", media.url_prefix.trim_matches('/'));
    anyhow::ensure!(
        media_prefix != "/" && media_prefix != "/api",
        "Media URL prefix {:?} would shadow other routes",
        media.url_prefix
    );

    Ok(Router::new()
        .nest("/api/v1", build_api_router(state.clone(), media))
        .nest_service(&media_prefix, ServeDir::new(&media.path))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state))
}
