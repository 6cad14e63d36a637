//! Photo API endpoints
//!
//! - GET /api/v1/admin/photos - Changelist
//! - GET /api/v1/admin/photos/dates - Date drill-down
//! - POST /api/v1/admin/photos - Upload (multipart/form-data)
//! - GET/PUT/DELETE /api/v1/admin/photos/{id}
//!
//! The upload form carries a `file` part plus `title`, `slug`, `created`
//! (RFC 3339) and `tags`. Tags may be sent as repeated parts or as one
//! comma separated value.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::common::{ChangelistQuery, ListResponse};
use crate::api::middleware::{ApiError, AppState};
use crate::models::{Content, CreatePhotoInput, DateBuckets, Photo, UpdatePhotoInput};
use crate::services::{PhotoService, PhotoUpload};

/// A photo with the public URL of its image
#[derive(Debug, Serialize)]
pub struct PhotoResponse {
    pub display: String,
    pub url: String,
    #[serde(flatten)]
    pub photo: Photo,
}

impl PhotoResponse {
    fn new(service: &PhotoService, photo: Photo) -> Self {
        Self {
            display: photo.display().to_string(),
            url: service.url_for(&photo),
            photo,
        }
    }
}

/// Build the photos router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_photos).post(upload_photo))
        .route("/dates", get(photo_dates))
        .route("/{id}", get(get_photo).put(update_photo).delete(delete_photo))
}

async fn list_photos(
    State(state): State<AppState>,
    Query(query): Query<ChangelistQuery>,
) -> Result<Json<ListResponse<PhotoResponse>>, ApiError> {
    let service = &state.photo_service;
    let page = service.list(&query.filter(), &query.params()).await?;
    Ok(Json(ListResponse::from_page(page, |photo| {
        PhotoResponse::new(service, photo)
    })))
}

async fn photo_dates(
    State(state): State<AppState>,
    Query(query): Query<ChangelistQuery>,
) -> Result<Json<DateBuckets>, ApiError> {
    let buckets = state.photo_service.dates(&query.filter()).await?;
    Ok(Json(buckets))
}

async fn get_photo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PhotoResponse>, ApiError> {
    let photo = state
        .photo_service
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Photo with ID {} not found", id)))?;
    Ok(Json(PhotoResponse::new(&state.photo_service, photo)))
}

/// POST /api/v1/admin/photos - Upload a photo
async fn upload_photo(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<PhotoResponse>), ApiError> {
    let mut input = CreatePhotoInput::default();
    let mut upload: Option<PhotoUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation_error(format!("Failed to read multipart: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "file" {
            let file_name = field
                .file_name()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string());
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::validation_error(format!("Failed to read file: {}", e)))?;
            upload = Some(PhotoUpload {
                file_name,
                content_type,
                data: data.to_vec(),
            });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ApiError::validation_error(format!("Failed to read {}: {}", name, e)))?;
        match name.as_str() {
            "title" => input.title = value,
            "slug" => input.slug = value,
            "created" => input.created = Some(parse_created(&value)?),
            "tags" => input.tags.extend(split_tags(&value)),
            _ => {}
        }
    }

    let upload = upload.ok_or_else(|| {
        ApiError::with_details(
            "VALIDATION_ERROR",
            "No file provided",
            serde_json::json!({ "field": "file" }),
        )
    })?;

    let photo = state.photo_service.create(&input, &upload).await?;
    Ok((
        StatusCode::CREATED,
        Json(PhotoResponse::new(&state.photo_service, photo)),
    ))
}

/// PUT /api/v1/admin/photos/{id} - Update metadata; the image is immutable
async fn update_photo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdatePhotoInput>,
) -> Result<Json<PhotoResponse>, ApiError> {
    let photo = state.photo_service.update(id, &body).await?;
    Ok(Json(PhotoResponse::new(&state.photo_service, photo)))
}

/// DELETE /api/v1/admin/photos/{id} - Delete the record and its file
async fn delete_photo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.photo_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_created(value: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ApiError::validation_error(format!("Invalid created timestamp: {}", e)))
}

fn split_tags(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
}
