//! Tag API endpoints
//!
//! Handles HTTP requests for tag management:
//! - GET /api/v1/admin/tags - List tags, or search them with `?q=`
//! - POST /api/v1/admin/tags - Create a tag
//! - GET/PUT/DELETE /api/v1/admin/tags/{id}
//!
//! A search returns the shortest matching tags first, so typing `py` offers
//! `py` and `python` before `pytest-asyncio`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::{default_page, default_per_page, ListResponse};
use crate::api::middleware::{ApiError, AppState};
use crate::models::{ListParams, Tag, TagInput};

/// Query parameters for the tag list
#[derive(Debug, Deserialize)]
pub struct TagListQuery {
    /// Search term; when present the result is the ranked search
    pub q: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

/// Build the tags router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tags).post(create_tag))
        .route("/{id}", get(get_tag).put(update_tag).delete(delete_tag))
}

/// GET /api/v1/admin/tags - List or search tags
async fn list_tags(
    State(state): State<AppState>,
    Query(query): Query<TagListQuery>,
) -> Result<Json<ListResponse<Tag>>, ApiError> {
    let params = ListParams::new(query.page, query.per_page);
    let page = match &query.q {
        Some(term) => state.tag_service.search(term, &params).await?,
        None => state.tag_service.list(&params).await?,
    };
    Ok(Json(ListResponse::from_page(page, |tag| tag)))
}

/// GET /api/v1/admin/tags/{id}
async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Tag>, ApiError> {
    state
        .tag_service
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Tag with ID {} not found", id)))
}

/// POST /api/v1/admin/tags
async fn create_tag(
    State(state): State<AppState>,
    Json(body): Json<TagInput>,
) -> Result<(StatusCode, Json<Tag>), ApiError> {
    let tag = state.tag_service.create(&body).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

/// PUT /api/v1/admin/tags/{id}
async fn update_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<TagInput>,
) -> Result<Json<Tag>, ApiError> {
    let tag = state.tag_service.update(id, &body).await?;
    Ok(Json(tag))
}

/// DELETE /api/v1/admin/tags/{id}
///
/// Removes the tag from every record it was attached to; the records stay.
async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.tag_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
