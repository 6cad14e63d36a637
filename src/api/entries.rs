//! Entry API endpoints
//!
//! - GET /api/v1/admin/entries - Changelist (`q`, `year`, `month`, `day`, paging)
//! - GET /api/v1/admin/entries/dates - Date drill-down
//! - POST /api/v1/admin/entries - Create an entry
//! - GET/PUT/DELETE /api/v1/admin/entries/{id}
//!
//! Bodies that are not well-formed markup are rejected with a
//! `VALIDATION_ERROR` carrying the parser message.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::common::{ChangelistQuery, ListResponse, Row};
use crate::api::middleware::{ApiError, AppState};
use crate::models::{CreateEntryInput, DateBuckets, Entry, UpdateEntryInput};

/// Build the entries router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_entries).post(create_entry))
        .route("/dates", get(entry_dates))
        .route("/{id}", get(get_entry).put(update_entry).delete(delete_entry))
}

/// GET /api/v1/admin/entries
async fn list_entries(
    State(state): State<AppState>,
    Query(query): Query<ChangelistQuery>,
) -> Result<Json<ListResponse<Row<Entry>>>, ApiError> {
    let page = state
        .entry_service
        .list(&query.filter(), &query.params())
        .await?;
    Ok(Json(ListResponse::from_page(page, Row::from)))
}

/// GET /api/v1/admin/entries/dates
async fn entry_dates(
    State(state): State<AppState>,
    Query(query): Query<ChangelistQuery>,
) -> Result<Json<DateBuckets>, ApiError> {
    let buckets = state.entry_service.dates(&query.filter()).await?;
    Ok(Json(buckets))
}

/// GET /api/v1/admin/entries/{id}
async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Entry>, ApiError> {
    state
        .entry_service
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Entry with ID {} not found", id)))
}

/// POST /api/v1/admin/entries
async fn create_entry(
    State(state): State<AppState>,
    Json(body): Json<CreateEntryInput>,
) -> Result<(StatusCode, Json<Entry>), ApiError> {
    let entry = state.entry_service.create(&body).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// PUT /api/v1/admin/entries/{id}
async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateEntryInput>,
) -> Result<Json<Entry>, ApiError> {
    let entry = state.entry_service.update(id, &body).await?;
    Ok(Json(entry))
}

/// DELETE /api/v1/admin/entries/{id}
async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.entry_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
