//! Series service
//!
//! A series groups entries. Its slug is prepopulated from the title, and
//! deleting a series leaves its entries in place without a series.

use crate::db::repositories::SeriesRepository;
use crate::models::{
    CreateSeriesInput, ListParams, PagedResult, Series, UpdateSeriesInput, SERIES_SLUG_MAX_LENGTH,
};
use crate::services::fields;
use crate::services::slug::{resolve_slug, validate_slug};
use anyhow::Context;
use std::sync::Arc;

/// Error types for series service operations
#[derive(Debug, thiserror::Error)]
pub enum SeriesServiceError {
    #[error("Series not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Series service
pub struct SeriesService {
    repo: Arc<dyn SeriesRepository>,
}

impl SeriesService {
    pub fn new(repo: Arc<dyn SeriesRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, params: &ListParams) -> Result<PagedResult<Series>, SeriesServiceError> {
        self.repo
            .list(params)
            .await
            .context("Failed to list series")
            .map_err(Into::into)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Series>, SeriesServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get series by ID")
            .map_err(Into::into)
    }

    /// Create a series; a missing slug is derived from the title
    pub async fn create(&self, input: &CreateSeriesInput) -> Result<Series, SeriesServiceError> {
        fields::require("title", &input.title).map_err(SeriesServiceError::ValidationError)?;
        let slug = resolve_slug(
            input.slug.as_deref(),
            Some(&input.title),
            SERIES_SLUG_MAX_LENGTH,
        )
        .map_err(SeriesServiceError::ValidationError)?;

        let series = Series::new(input.title.clone(), slug, input.description.clone());
        let created = self
            .repo
            .create(&series)
            .await
            .context("Failed to create series")?;

        tracing::info!("Created series {} ({})", created.slug, created.id);
        Ok(created)
    }

    pub async fn update(
        &self,
        id: i64,
        input: &UpdateSeriesInput,
    ) -> Result<Series, SeriesServiceError> {
        let mut series = self.require(id).await?;

        if let Some(title) = &input.title {
            fields::require("title", title).map_err(SeriesServiceError::ValidationError)?;
            series.title = title.clone();
        }
        if let Some(slug) = &input.slug {
            let slug = slug.trim();
            validate_slug("slug", slug, SERIES_SLUG_MAX_LENGTH)
                .map_err(SeriesServiceError::ValidationError)?;
            series.slug = slug.to_string();
        }
        if let Some(description) = &input.description {
            series.description = description.clone();
        }

        self.repo
            .update(&series)
            .await
            .context("Failed to update series")
            .map_err(Into::into)
    }

    /// Delete a series; its entries keep existing with no series
    pub async fn delete(&self, id: i64) -> Result<(), SeriesServiceError> {
        let series = self.require(id).await?;
        let detached = self
            .repo
            .count_entries(id)
            .await
            .context("Failed to count series entries")?;

        self.repo
            .delete(series.id)
            .await
            .context("Failed to delete series")?;

        tracing::info!(
            "Deleted series {} ({}), detached {} entries",
            series.slug,
            series.id,
            detached
        );
        Ok(())
    }

    async fn require(&self, id: i64) -> Result<Series, SeriesServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get series")?
            .ok_or_else(|| SeriesServiceError::NotFound(format!("Series with ID {} not found", id)))
    }
}
