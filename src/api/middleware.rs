//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The JSON error body and service error mapping
//! - Admin bearer-token guard

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::config::Config;
use crate::db::repositories::{
    SqlxBlogmarkRepository, SqlxEntryRepository, SqlxPhotoRepository, SqlxQuotationRepository,
    SqlxSeriesRepository, SqlxTagRepository,
};
use crate::db::DynDatabasePool;
use crate::services::{
    BlogmarkService, ContentServiceError, EntryService, PhotoService, QuotationService,
    SeriesService, SeriesServiceError, TagService, TagServiceError,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub tag_service: Arc<TagService>,
    pub series_service: Arc<SeriesService>,
    pub entry_service: Arc<EntryService>,
    pub quotation_service: Arc<QuotationService>,
    pub blogmark_service: Arc<BlogmarkService>,
    pub photo_service: Arc<PhotoService>,
    /// SHA-256 of the configured admin token; `None` locks the admin API
    pub admin_token_digest: Option<[u8; 32]>,
}

impl AppState {
    /// Wire repositories and services over a migrated pool
    pub fn new(pool: DynDatabasePool, config: &Config) -> Self {
        let series_repo = SqlxSeriesRepository::boxed(pool.clone());
        let tag_service = Arc::new(TagService::new(SqlxTagRepository::boxed(pool.clone())));

        let entry_service = Arc::new(EntryService::new(
            SqlxEntryRepository::boxed(pool.clone()),
            series_repo.clone(),
            tag_service.clone(),
        ));
        let quotation_service = Arc::new(QuotationService::new(
            SqlxQuotationRepository::boxed(pool.clone()),
            tag_service.clone(),
        ));
        let blogmark_service = Arc::new(BlogmarkService::new(
            SqlxBlogmarkRepository::boxed(pool.clone()),
            tag_service.clone(),
        ));
        let photo_service = Arc::new(PhotoService::new(
            SqlxPhotoRepository::boxed(pool.clone()),
            tag_service.clone(),
            config.media.clone(),
        ));

        let admin_token_digest = config
            .admin
            .token
            .as_deref()
            .filter(|token| !token.is_empty())
            .map(token_digest);

        Self {
            pool,
            tag_service,
            series_service: Arc::new(SeriesService::new(series_repo)),
            entry_service,
            quotation_service,
            blogmark_service,
            photo_service,
            admin_token_digest,
        }
    }
}

fn token_digest(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

fn internal(err: anyhow::Error) -> ApiError {
    tracing::error!("Internal error: {:#}", err);
    ApiError::internal_error("Internal server error")
}

impl From<TagServiceError> for ApiError {
    fn from(err: TagServiceError) -> Self {
        match err {
            TagServiceError::NotFound(msg) => Self::not_found(msg),
            TagServiceError::ValidationError(msg) => Self::validation_error(msg),
            TagServiceError::Duplicate(msg) => Self::conflict(msg),
            TagServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<SeriesServiceError> for ApiError {
    fn from(err: SeriesServiceError) -> Self {
        match err {
            SeriesServiceError::NotFound(msg) => Self::not_found(msg),
            SeriesServiceError::ValidationError(msg) => Self::validation_error(msg),
            SeriesServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<ContentServiceError> for ApiError {
    fn from(err: ContentServiceError) -> Self {
        match err {
            ContentServiceError::NotFound(msg) => Self::not_found(msg),
            ContentServiceError::ValidationError(msg) => Self::validation_error(msg),
            ContentServiceError::InternalError(e) => internal(e),
        }
    }
}

/// Extract the bearer token from the Authorization header
fn extract_bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// Admin authorization middleware
///
/// Tokens are compared by SHA-256 digest so the comparison length never
/// depends on the submitted value.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let expected = state
        .admin_token_digest
        .ok_or_else(|| ApiError::forbidden("Admin API is disabled: no admin token configured"))?;

    let token = extract_bearer_token(&request)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    if token_digest(token) != expected {
        tracing::debug!("Rejected admin request to {}", request.uri().path());
        return Err(ApiError::unauthorized("Invalid authentication token"));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn create_request_with_auth(value: &str) -> Request {
        Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_extract_bearer_token() {
        let request = create_request_with_auth("Bearer secret-123");
        assert_eq!(extract_bearer_token(&request), Some("secret-123"));
    }

    #[test]
    fn test_extract_bearer_token_invalid_scheme() {
        let request = create_request_with_auth("Basic invalid");
        assert!(extract_bearer_token(&request).is_none());
    }

    #[test]
    fn test_extract_bearer_token_none() {
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        assert!(extract_bearer_token(&request).is_none());
    }

    #[test]
    fn test_token_digest() {
        assert_eq!(token_digest("a"), token_digest("a"));
        assert_ne!(token_digest("a"), token_digest("b"));
    }

    #[test]
    fn test_api_error_status() {
        assert_eq!(ApiError::unauthorized("x").status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::validation_error("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::conflict("x").status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::internal_error("x").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_api_error_with_details() {
        let details = serde_json::json!({"field": "body"});
        let error = ApiError::with_details("VALIDATION_ERROR", "Invalid", details.clone());
        assert_eq!(error.error.details, Some(details));
    }

    #[test]
    fn test_service_errors_map_to_codes() {
        let err: ApiError = TagServiceError::Duplicate("python".to_string()).into();
        assert_eq!(err.error.code, "CONFLICT");

        let err: ApiError = ContentServiceError::ValidationError("bad body".to_string()).into();
        assert_eq!(err.error.code, "VALIDATION_ERROR");
        assert_eq!(err.error.message, "bad body");

        let err: ApiError = SeriesServiceError::InternalError(anyhow::anyhow!("db down")).into();
        assert_eq!(err.error.code, "INTERNAL_ERROR");
        assert!(!err.error.message.contains("db down"));
    }
}
