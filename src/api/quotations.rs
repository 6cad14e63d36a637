//! Quotation API endpoints
//!
//! - GET/POST /api/v1/admin/quotations
//! - GET /api/v1/admin/quotations/dates
//! - GET/PUT/DELETE /api/v1/admin/quotations/{id}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::common::{ChangelistQuery, ListResponse, Row};
use crate::api::middleware::{ApiError, AppState};
use crate::models::{CreateQuotationInput, DateBuckets, Quotation, UpdateQuotationInput};

/// Build the quotations router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_quotations).post(create_quotation))
        .route("/dates", get(quotation_dates))
        .route(
            "/{id}",
            get(get_quotation).put(update_quotation).delete(delete_quotation),
        )
}

async fn list_quotations(
    State(state): State<AppState>,
    Query(query): Query<ChangelistQuery>,
) -> Result<Json<ListResponse<Row<Quotation>>>, ApiError> {
    let page = state
        .quotation_service
        .list(&query.filter(), &query.params())
        .await?;
    Ok(Json(ListResponse::from_page(page, Row::from)))
}

async fn quotation_dates(
    State(state): State<AppState>,
    Query(query): Query<ChangelistQuery>,
) -> Result<Json<DateBuckets>, ApiError> {
    let buckets = state.quotation_service.dates(&query.filter()).await?;
    Ok(Json(buckets))
}

async fn get_quotation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Quotation>, ApiError> {
    state
        .quotation_service
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Quotation with ID {} not found", id)))
}

async fn create_quotation(
    State(state): State<AppState>,
    Json(body): Json<CreateQuotationInput>,
) -> Result<(StatusCode, Json<Quotation>), ApiError> {
    let quotation = state.quotation_service.create(&body).await?;
    Ok((StatusCode::CREATED, Json(quotation)))
}

async fn update_quotation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateQuotationInput>,
) -> Result<Json<Quotation>, ApiError> {
    let quotation = state.quotation_service.update(id, &body).await?;
    Ok(Json(quotation))
}

async fn delete_quotation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.quotation_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
