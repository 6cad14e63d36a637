//! Series API endpoints
//!
//! - GET/POST /api/v1/admin/series
//! - GET/PUT/DELETE /api/v1/admin/series/{id}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::api::common::{AdminPaginationQuery, ListResponse};
use crate::api::middleware::{ApiError, AppState};
use crate::models::{CreateSeriesInput, Series, UpdateSeriesInput};

/// A series row with its display string
#[derive(Debug, Serialize)]
pub struct SeriesRow {
    pub display: String,
    #[serde(flatten)]
    pub series: Series,
}

impl From<Series> for SeriesRow {
    fn from(series: Series) -> Self {
        Self {
            display: series.title.clone(),
            series,
        }
    }
}

/// Build the series router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_series).post(create_series))
        .route("/{id}", get(get_series).put(update_series).delete(delete_series))
}

/// GET /api/v1/admin/series - List series by title
async fn list_series(
    State(state): State<AppState>,
    Query(query): Query<AdminPaginationQuery>,
) -> Result<Json<ListResponse<SeriesRow>>, ApiError> {
    let page = state.series_service.list(&query.params()).await?;
    Ok(Json(ListResponse::from_page(page, SeriesRow::from)))
}

/// GET /api/v1/admin/series/{id}
async fn get_series(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Series>, ApiError> {
    state
        .series_service
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Series with ID {} not found", id)))
}

/// POST /api/v1/admin/series
async fn create_series(
    State(state): State<AppState>,
    Json(body): Json<CreateSeriesInput>,
) -> Result<(StatusCode, Json<Series>), ApiError> {
    let series = state.series_service.create(&body).await?;
    Ok((StatusCode::CREATED, Json(series)))
}

/// PUT /api/v1/admin/series/{id}
async fn update_series(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateSeriesInput>,
) -> Result<Json<Series>, ApiError> {
    let series = state.series_service.update(id, &body).await?;
    Ok(Json(series))
}

/// DELETE /api/v1/admin/series/{id}
///
/// Entries in the series are kept and detached from it.
async fn delete_series(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.series_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
