//! Quotation service
//!
//! Quotations take their prepopulated slug from the source.

use crate::db::repositories::QuotationRepository;
use crate::models::{
    ContentFilter, ContentMeta, CreateQuotationInput, DateBuckets, ListParams, PagedResult,
    Quotation, UpdateQuotationInput, CONTENT_SLUG_MAX_LENGTH, QUOTATION_SOURCE_MAX_LENGTH,
};
use crate::services::content::{check_content_slug, check_filter, invalid, ContentServiceError};
use crate::services::fields;
use crate::services::slug::resolve_slug;
use crate::services::tag::TagService;
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// Quotation service
pub struct QuotationService {
    repo: Arc<dyn QuotationRepository>,
    tag_service: Arc<TagService>,
}

impl QuotationService {
    pub fn new(repo: Arc<dyn QuotationRepository>, tag_service: Arc<TagService>) -> Self {
        Self { repo, tag_service }
    }

    pub async fn list(
        &self,
        filter: &ContentFilter,
        params: &ListParams,
    ) -> Result<PagedResult<Quotation>, ContentServiceError> {
        check_filter(filter)?;
        self.repo
            .list(filter, params)
            .await
            .context("Failed to list quotations")
            .map_err(Into::into)
    }

    pub async fn dates(&self, filter: &ContentFilter) -> Result<DateBuckets, ContentServiceError> {
        check_filter(filter)?;
        let created = self
            .repo
            .created_dates(filter)
            .await
            .context("Failed to list quotation dates")?;
        Ok(filter.date.buckets(&created))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Quotation>, ContentServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get quotation by ID")
            .map_err(Into::into)
    }

    pub async fn create(
        &self,
        input: &CreateQuotationInput,
    ) -> Result<Quotation, ContentServiceError> {
        fields::require("quotation", &input.quotation).map_err(invalid)?;
        check_source(&input.source)?;
        let slug = resolve_slug(
            input.slug.as_deref(),
            Some(&input.source),
            CONTENT_SLUG_MAX_LENGTH,
        )
        .map_err(invalid)?;

        let tags = self.tag_service.resolve(&input.tags).await?;
        let quotation = Quotation {
            id: 0,
            meta: ContentMeta {
                created: input.created.unwrap_or_else(Utc::now),
                slug,
                tags,
            },
            quotation: input.quotation.clone(),
            source: input.source.clone(),
            source_url: fields::blank_to_none(input.source_url.clone()),
        };

        let created = self
            .repo
            .create(&quotation)
            .await
            .context("Failed to create quotation")?;

        tracing::info!("Created quotation {} ({})", created.meta.slug, created.id);
        Ok(created)
    }

    pub async fn update(
        &self,
        id: i64,
        input: &UpdateQuotationInput,
    ) -> Result<Quotation, ContentServiceError> {
        let mut quotation = self.require(id).await?;

        if let Some(text) = &input.quotation {
            fields::require("quotation", text).map_err(invalid)?;
            quotation.quotation = text.clone();
        }
        if let Some(source) = &input.source {
            check_source(source)?;
            quotation.source = source.clone();
        }
        if let Some(source_url) = &input.source_url {
            quotation.source_url = fields::blank_to_none(source_url.clone());
        }
        if let Some(slug) = &input.slug {
            quotation.meta.slug = check_content_slug(slug)?;
        }
        if let Some(created) = input.created {
            quotation.meta.created = created;
        }
        if let Some(tags) = &input.tags {
            quotation.meta.tags = self.tag_service.resolve(tags).await?;
        }

        self.repo
            .update(&quotation)
            .await
            .context("Failed to update quotation")
            .map_err(Into::into)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ContentServiceError> {
        let quotation = self.require(id).await?;
        self.repo
            .delete(quotation.id)
            .await
            .context("Failed to delete quotation")?;

        tracing::info!("Deleted quotation {} ({})", quotation.meta.slug, quotation.id);
        Ok(())
    }

    async fn require(&self, id: i64) -> Result<Quotation, ContentServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get quotation")?
            .ok_or_else(|| {
                ContentServiceError::NotFound(format!("Quotation with ID {} not found", id))
            })
    }
}

fn check_source(source: &str) -> Result<(), ContentServiceError> {
    fields::require("source", source).map_err(invalid)?;
    fields::max_length("source", source, QUOTATION_SOURCE_MAX_LENGTH).map_err(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxQuotationRepository, SqlxTagRepository};
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_service() -> QuotationService {
        let pool = create_test_pool()
            .await
            .expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let tags = Arc::new(TagService::new(SqlxTagRepository::boxed(pool.clone())));
        QuotationService::new(SqlxQuotationRepository::boxed(pool), tags)
    }

    fn input(quotation: &str, source: &str) -> CreateQuotationInput {
        CreateQuotationInput {
            quotation: quotation.to_string(),
            source: source.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_prepopulates_slug_from_source() {
        let service = setup_test_service().await;

        let created = service
            .create(&input("Premature optimization...", "Donald Knuth"))
            .await
            .unwrap();

        assert_eq!(created.meta.slug, "donald-knuth");
        assert_eq!(created.source_url, None);
    }

    #[tokio::test]
    async fn test_create_validation() {
        let service = setup_test_service().await;

        assert!(matches!(
            service.create(&input("", "Someone")).await,
            Err(ContentServiceError::ValidationError(_))
        ));
        assert!(matches!(
            service.create(&input("Words", " ")).await,
            Err(ContentServiceError::ValidationError(_))
        ));
        let long_source = "s".repeat(QUOTATION_SOURCE_MAX_LENGTH + 1);
        assert!(matches!(
            service.create(&input("Words", &long_source)).await,
            Err(ContentServiceError::ValidationError(_))
        ));
        let mut bad_tag = input("Words", "Someone");
        bad_tag.tags = vec!["not a slug".to_string()];
        assert!(matches!(
            service.create(&bad_tag).await,
            Err(ContentServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_update_quotation() {
        let service = setup_test_service().await;
        let mut create = input("Words", "Someone");
        create.source_url = Some("https://example.com/talk".to_string());
        let created = service.create(&create).await.unwrap();

        let updated = service
            .update(
                created.id,
                &UpdateQuotationInput {
                    source_url: Some(None),
                    slug: Some("renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.source_url, None);
        assert_eq!(updated.meta.slug, "renamed");
        assert_eq!(updated.source, "Someone");

        assert!(matches!(
            service
                .update(
                    created.id,
                    &UpdateQuotationInput {
                        slug: Some(String::new()),
                        ..Default::default()
                    }
                )
                .await,
            Err(ContentServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_quotation() {
        let service = setup_test_service().await;
        let created = service.create(&input("Words", "Someone")).await.unwrap();

        service.delete(created.id).await.unwrap();

        assert!(service.get_by_id(created.id).await.unwrap().is_none());
    }
}
