//! Entry service
//!
//! Implements business logic for blog entries:
//! - Body markup check (the body must be well-formed XML inside a root element)
//! - Series reference check
//! - Slug prepopulation from the title
//! - Tag resolution (create or reuse)

use crate::db::repositories::{EntryRepository, SeriesRepository};
use crate::models::{
    ContentFilter, ContentMeta, CreateEntryInput, DateBuckets, Entry, ListParams, PagedResult,
    UpdateEntryInput, CONTENT_SLUG_MAX_LENGTH, ENTRY_TITLE_MAX_LENGTH,
};
use crate::services::content::{check_content_slug, check_filter, invalid, ContentServiceError};
use crate::services::fields;
use crate::services::markup::validate_entry_body;
use crate::services::slug::resolve_slug;
use crate::services::tag::TagService;
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// Entry service
pub struct EntryService {
    repo: Arc<dyn EntryRepository>,
    series_repo: Arc<dyn SeriesRepository>,
    tag_service: Arc<TagService>,
}

impl EntryService {
    pub fn new(
        repo: Arc<dyn EntryRepository>,
        series_repo: Arc<dyn SeriesRepository>,
        tag_service: Arc<TagService>,
    ) -> Self {
        Self {
            repo,
            series_repo,
            tag_service,
        }
    }

    /// List entries newest first, filtered by search words and date
    pub async fn list(
        &self,
        filter: &ContentFilter,
        params: &ListParams,
    ) -> Result<PagedResult<Entry>, ContentServiceError> {
        check_filter(filter)?;
        self.repo
            .list(filter, params)
            .await
            .context("Failed to list entries")
            .map_err(Into::into)
    }

    /// Distinct years, months or days that have entries
    pub async fn dates(&self, filter: &ContentFilter) -> Result<DateBuckets, ContentServiceError> {
        check_filter(filter)?;
        let created = self
            .repo
            .created_dates(filter)
            .await
            .context("Failed to list entry dates")?;
        Ok(filter.date.buckets(&created))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Entry>, ContentServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get entry by ID")
            .map_err(Into::into)
    }

    /// Create an entry
    ///
    /// Nothing is written, tags included, unless every check passes.
    ///
    /// # Errors
    /// - `ValidationError` for a malformed body, a blank or oversized field,
    ///   an unknown series, a bad slug or a bad tag
    pub async fn create(&self, input: &CreateEntryInput) -> Result<Entry, ContentServiceError> {
        fields::max_length("title", &input.title, ENTRY_TITLE_MAX_LENGTH).map_err(invalid)?;
        self.check_body(&input.body)?;
        self.check_series(input.series_id).await?;
        let slug = resolve_slug(
            input.slug.as_deref(),
            Some(&input.title),
            CONTENT_SLUG_MAX_LENGTH,
        )
        .map_err(invalid)?;

        let tags = self.tag_service.resolve(&input.tags).await?;
        let entry = Entry {
            id: 0,
            meta: ContentMeta {
                created: input.created.unwrap_or_else(Utc::now),
                slug,
                tags,
            },
            title: input.title.clone(),
            body: input.body.clone(),
            tweet_html: fields::blank_to_none(input.tweet_html.clone()),
            extra_head_html: fields::blank_to_none(input.extra_head_html.clone()),
            series_id: input.series_id,
        };

        let created = self
            .repo
            .create(&entry)
            .await
            .context("Failed to create entry")?;

        tracing::info!("Created entry {} ({})", created.meta.slug, created.id);
        Ok(created)
    }

    /// Partially update an entry; omitted fields are left unchanged
    pub async fn update(
        &self,
        id: i64,
        input: &UpdateEntryInput,
    ) -> Result<Entry, ContentServiceError> {
        let mut entry = self.require(id).await?;

        if let Some(title) = &input.title {
            fields::max_length("title", title, ENTRY_TITLE_MAX_LENGTH).map_err(invalid)?;
            entry.title = title.clone();
        }
        if let Some(body) = &input.body {
            self.check_body(body)?;
            entry.body = body.clone();
        }
        if let Some(tweet_html) = &input.tweet_html {
            entry.tweet_html = fields::blank_to_none(tweet_html.clone());
        }
        if let Some(extra_head_html) = &input.extra_head_html {
            entry.extra_head_html = fields::blank_to_none(extra_head_html.clone());
        }
        if let Some(series_id) = input.series_id {
            self.check_series(series_id).await?;
            entry.series_id = series_id;
        }
        if let Some(slug) = &input.slug {
            entry.meta.slug = check_content_slug(slug)?;
        }
        if let Some(created) = input.created {
            entry.meta.created = created;
        }
        if let Some(tags) = &input.tags {
            entry.meta.tags = self.tag_service.resolve(tags).await?;
        }

        self.repo
            .update(&entry)
            .await
            .context("Failed to update entry")
            .map_err(Into::into)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ContentServiceError> {
        let entry = self.require(id).await?;
        self.repo
            .delete(entry.id)
            .await
            .context("Failed to delete entry")?;

        tracing::info!("Deleted entry {} ({})", entry.meta.slug, entry.id);
        Ok(())
    }

    fn check_body(&self, body: &str) -> Result<(), ContentServiceError> {
        fields::require("body", body).map_err(invalid)?;
        validate_entry_body(body).map_err(|message| {
            tracing::debug!("Rejected entry body: {}", message);
            invalid(message)
        })
    }

    async fn check_series(&self, series_id: Option<i64>) -> Result<(), ContentServiceError> {
        let Some(series_id) = series_id else {
            return Ok(());
        };
        let exists = self
            .series_repo
            .exists(series_id)
            .await
            .context("Failed to check series")?;
        if !exists {
            return Err(invalid(format!("series {} does not exist", series_id)));
        }
        Ok(())
    }

    async fn require(&self, id: i64) -> Result<Entry, ContentServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get entry")?
            .ok_or_else(|| ContentServiceError::NotFound(format!("Entry with ID {} not found", id)))
    }
}
