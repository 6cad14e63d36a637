//! Blogmark API endpoints
//!
//! - GET/POST /api/v1/admin/blogmarks
//! - GET /api/v1/admin/blogmarks/dates
//! - GET/PUT/DELETE /api/v1/admin/blogmarks/{id}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::common::{ChangelistQuery, ListResponse, Row};
use crate::api::middleware::{ApiError, AppState};
use crate::models::{Blogmark, CreateBlogmarkInput, DateBuckets, UpdateBlogmarkInput};

/// Build the blogmarks router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_blogmarks).post(create_blogmark))
        .route("/dates", get(blogmark_dates))
        .route(
            "/{id}",
            get(get_blogmark).put(update_blogmark).delete(delete_blogmark),
        )
}

async fn list_blogmarks(
    State(state): State<AppState>,
    Query(query): Query<ChangelistQuery>,
) -> Result<Json<ListResponse<Row<Blogmark>>>, ApiError> {
    let page = state
        .blogmark_service
        .list(&query.filter(), &query.params())
        .await?;
    Ok(Json(ListResponse::from_page(page, Row::from)))
}

async fn blogmark_dates(
    State(state): State<AppState>,
    Query(query): Query<ChangelistQuery>,
) -> Result<Json<DateBuckets>, ApiError> {
    let buckets = state.blogmark_service.dates(&query.filter()).await?;
    Ok(Json(buckets))
}

async fn get_blogmark(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Blogmark>, ApiError> {
    state
        .blogmark_service
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Blogmark with ID {} not found", id)))
}

async fn create_blogmark(
    State(state): State<AppState>,
    Json(body): Json<CreateBlogmarkInput>,
) -> Result<(StatusCode, Json<Blogmark>), ApiError> {
    let blogmark = state.blogmark_service.create(&body).await?;
    Ok((StatusCode::CREATED, Json(blogmark)))
}

async fn update_blogmark(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateBlogmarkInput>,
) -> Result<Json<Blogmark>, ApiError> {
    let blogmark = state.blogmark_service.update(id, &body).await?;
    Ok(Json(blogmark))
}

async fn delete_blogmark(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.blogmark_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
