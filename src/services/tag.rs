//! Tag service
//!
//! Implements business logic for tag management:
//! - Length-ranked tag search for the admin changelist
//! - Create or reuse tags when content records are tagged
//! - Tag CRUD with uniqueness checks

use crate::db::repositories::TagRepository;
use crate::models::{ListParams, PagedResult, Tag, TagInput, TAG_MAX_LENGTH};
use crate::services::slug::validate_slug;
use anyhow::Context;
use std::sync::Arc;

/// Error types for tag service operations
#[derive(Debug, thiserror::Error)]
pub enum TagServiceError {
    /// Tag not found
    #[error("Tag not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Another tag already has this value
    #[error("Tag already exists: {0}")]
    Duplicate(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Tag service for managing blog tags
pub struct TagService {
    repo: Arc<dyn TagRepository>,
}

impl TagService {
    /// Create a new tag service
    pub fn new(repo: Arc<dyn TagRepository>) -> Self {
        Self { repo }
    }

    /// Search tags for the admin changelist.
    ///
    /// The term is trimmed; a blank term yields no results at all. Otherwise
    /// tags containing the term (case-insensitive) are paged shortest first,
    /// so exact and near-exact matches lead.
    pub async fn search(
        &self,
        term: &str,
        params: &ListParams,
    ) -> Result<PagedResult<Tag>, TagServiceError> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(PagedResult::new(Vec::new(), 0, params));
        }

        self.repo
            .search(term, params)
            .await
            .context("Failed to search tags")
            .map_err(Into::into)
    }

    /// List all tags alphabetically
    pub async fn list(&self, params: &ListParams) -> Result<PagedResult<Tag>, TagServiceError> {
        self.repo
            .list(params)
            .await
            .context("Failed to list tags")
            .map_err(Into::into)
    }

    /// Get tag by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Tag>, TagServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get tag by ID")
            .map_err(Into::into)
    }

    /// Create a new tag
    ///
    /// # Errors
    /// - `ValidationError` if the value is not a slug of at most 50 characters
    /// - `Duplicate` if the tag already exists
    pub async fn create(&self, input: &TagInput) -> Result<Tag, TagServiceError> {
        let value = normalize_tag(&input.tag)?;

        if self
            .repo
            .get_by_tag(&value)
            .await
            .context("Failed to check existing tag")?
            .is_some()
        {
            return Err(TagServiceError::Duplicate(value));
        }

        let created = self
            .repo
            .create(&Tag::new(value))
            .await
            .context("Failed to create tag")?;

        tracing::info!("Created tag {} ({})", created.tag, created.id);
        Ok(created)
    }

    /// Create a new tag or get the existing one with the same value
    pub async fn create_or_get(&self, value: &str) -> Result<Tag, TagServiceError> {
        let value = normalize_tag(value)?;
        self.find_or_create(&value).await
    }

    /// Resolve the tag values submitted with a content record.
    ///
    /// Every value is validated before any tag is created, so a rejected
    /// list leaves the tag table untouched. Duplicates collapse.
    pub async fn resolve(&self, values: &[String]) -> Result<Vec<Tag>, TagServiceError> {
        let mut normalized: Vec<String> = Vec::with_capacity(values.len());
        for value in values {
            let value = normalize_tag(value)?;
            if !normalized.contains(&value) {
                normalized.push(value);
            }
        }

        let mut tags = Vec::with_capacity(normalized.len());
        for value in &normalized {
            tags.push(self.find_or_create(value).await?);
        }
        Ok(tags)
    }

    /// Rename a tag
    ///
    /// # Errors
    /// - `NotFound` if the tag doesn't exist
    /// - `Duplicate` if a different tag already has the new value
    pub async fn update(&self, id: i64, input: &TagInput) -> Result<Tag, TagServiceError> {
        let mut tag = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get tag")?
            .ok_or_else(|| TagServiceError::NotFound(format!("Tag with ID {} not found", id)))?;

        let value = normalize_tag(&input.tag)?;
        if let Some(existing) = self
            .repo
            .get_by_tag(&value)
            .await
            .context("Failed to check existing tag")?
        {
            if existing.id != id {
                return Err(TagServiceError::Duplicate(value));
            }
        }

        tag.tag = value;
        self.repo
            .update(&tag)
            .await
            .context("Failed to update tag")
            .map_err(Into::into)
    }

    /// Delete a tag
    ///
    /// Removes the tag and its associations; tagged records are kept.
    ///
    /// # Errors
    /// - `NotFound` if the tag doesn't exist
    pub async fn delete(&self, id: i64) -> Result<(), TagServiceError> {
        let tag = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get tag")?
            .ok_or_else(|| TagServiceError::NotFound(format!("Tag with ID {} not found", id)))?;

        self.repo
            .delete(tag.id)
            .await
            .context("Failed to delete tag")?;

        tracing::info!("Deleted tag {} ({})", tag.tag, tag.id);
        Ok(())
    }

    async fn find_or_create(&self, value: &str) -> Result<Tag, TagServiceError> {
        if let Some(existing) = self
            .repo
            .get_by_tag(value)
            .await
            .context("Failed to check existing tag")?
        {
            return Ok(existing);
        }

        match self.repo.create(&Tag::new(value.to_string())).await {
            Ok(created) => Ok(created),
            Err(err) => {
                // A concurrent request may have inserted the same value
                match self
                    .repo
                    .get_by_tag(value)
                    .await
                    .context("Failed to check existing tag")?
                {
                    Some(existing) => Ok(existing),
                    None => Err(err.context("Failed to create tag").into()),
                }
            }
        }
    }
}

/// Trim a submitted tag value and check it is a valid tag slug
pub fn normalize_tag(value: &str) -> Result<String, TagServiceError> {
    let value = value.trim();
    validate_slug("tag", value, TAG_MAX_LENGTH).map_err(TagServiceError::ValidationError)?;
    Ok(value.to_string())
}
