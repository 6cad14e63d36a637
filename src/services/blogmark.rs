//! Blogmark service
//!
//! Links must be absolute http(s) URLs. The slug is prepopulated from the
//! link title.

use crate::db::repositories::BlogmarkRepository;
use crate::models::{
    Blogmark, ContentFilter, ContentMeta, CreateBlogmarkInput, DateBuckets, ListParams,
    PagedResult, UpdateBlogmarkInput, CONTENT_SLUG_MAX_LENGTH, LINK_TITLE_MAX_LENGTH,
    LINK_URL_MAX_LENGTH, VIA_TITLE_MAX_LENGTH, VIA_URL_MAX_LENGTH,
};
use crate::services::content::{check_content_slug, check_filter, invalid, ContentServiceError};
use crate::services::fields;
use crate::services::slug::resolve_slug;
use crate::services::tag::TagService;
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// Blogmark service
pub struct BlogmarkService {
    repo: Arc<dyn BlogmarkRepository>,
    tag_service: Arc<TagService>,
}

impl BlogmarkService {
    pub fn new(repo: Arc<dyn BlogmarkRepository>, tag_service: Arc<TagService>) -> Self {
        Self { repo, tag_service }
    }

    pub async fn list(
        &self,
        filter: &ContentFilter,
        params: &ListParams,
    ) -> Result<PagedResult<Blogmark>, ContentServiceError> {
        check_filter(filter)?;
        self.repo
            .list(filter, params)
            .await
            .context("Failed to list blogmarks")
            .map_err(Into::into)
    }

    pub async fn dates(&self, filter: &ContentFilter) -> Result<DateBuckets, ContentServiceError> {
        check_filter(filter)?;
        let created = self
            .repo
            .created_dates(filter)
            .await
            .context("Failed to list blogmark dates")?;
        Ok(filter.date.buckets(&created))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Blogmark>, ContentServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get blogmark by ID")
            .map_err(Into::into)
    }

    pub async fn create(&self, input: &CreateBlogmarkInput) -> Result<Blogmark, ContentServiceError> {
        check_link_url(&input.link_url)?;
        check_link_title(&input.link_title)?;
        let via_url = fields::blank_to_none(input.via_url.clone());
        let via_title = fields::blank_to_none(input.via_title.clone());
        check_via(via_url.as_deref(), via_title.as_deref())?;
        fields::require("commentary", &input.commentary).map_err(invalid)?;
        let slug = resolve_slug(
            input.slug.as_deref(),
            Some(&input.link_title),
            CONTENT_SLUG_MAX_LENGTH,
        )
        .map_err(invalid)?;

        let tags = self.tag_service.resolve(&input.tags).await?;
        let blogmark = Blogmark {
            id: 0,
            meta: ContentMeta {
                created: input.created.unwrap_or_else(Utc::now),
                slug,
                tags,
            },
            link_url: input.link_url.trim().to_string(),
            link_title: input.link_title.clone(),
            via_url,
            via_title,
            commentary: input.commentary.clone(),
        };

        let created = self
            .repo
            .create(&blogmark)
            .await
            .context("Failed to create blogmark")?;

        tracing::info!("Created blogmark {} ({})", created.meta.slug, created.id);
        Ok(created)
    }

    pub async fn update(
        &self,
        id: i64,
        input: &UpdateBlogmarkInput,
    ) -> Result<Blogmark, ContentServiceError> {
        let mut blogmark = self.require(id).await?;

        if let Some(link_url) = &input.link_url {
            check_link_url(link_url)?;
            blogmark.link_url = link_url.trim().to_string();
        }
        if let Some(link_title) = &input.link_title {
            check_link_title(link_title)?;
            blogmark.link_title = link_title.clone();
        }
        if let Some(via_url) = &input.via_url {
            blogmark.via_url = fields::blank_to_none(via_url.clone());
        }
        if let Some(via_title) = &input.via_title {
            blogmark.via_title = fields::blank_to_none(via_title.clone());
        }
        check_via(blogmark.via_url.as_deref(), blogmark.via_title.as_deref())?;
        if let Some(commentary) = &input.commentary {
            fields::require("commentary", commentary).map_err(invalid)?;
            blogmark.commentary = commentary.clone();
        }
        if let Some(slug) = &input.slug {
            blogmark.meta.slug = check_content_slug(slug)?;
        }
        if let Some(created) = input.created {
            blogmark.meta.created = created;
        }
        if let Some(tags) = &input.tags {
            blogmark.meta.tags = self.tag_service.resolve(tags).await?;
        }

        self.repo
            .update(&blogmark)
            .await
            .context("Failed to update blogmark")
            .map_err(Into::into)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ContentServiceError> {
        let blogmark = self.require(id).await?;
        self.repo
            .delete(blogmark.id)
            .await
            .context("Failed to delete blogmark")?;

        tracing::info!("Deleted blogmark {} ({})", blogmark.meta.slug, blogmark.id);
        Ok(())
    }

    async fn require(&self, id: i64) -> Result<Blogmark, ContentServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get blogmark")?
            .ok_or_else(|| {
                ContentServiceError::NotFound(format!("Blogmark with ID {} not found", id))
            })
    }
}

fn check_link_url(link_url: &str) -> Result<(), ContentServiceError> {
    let link_url = link_url.trim();
    fields::require("link_url", link_url).map_err(invalid)?;
    fields::max_length("link_url", link_url, LINK_URL_MAX_LENGTH).map_err(invalid)?;
    fields::http_url("link_url", link_url).map_err(invalid)
}

fn check_link_title(link_title: &str) -> Result<(), ContentServiceError> {
    fields::require("link_title", link_title).map_err(invalid)?;
    fields::max_length("link_title", link_title, LINK_TITLE_MAX_LENGTH).map_err(invalid)
}

fn check_via(via_url: Option<&str>, via_title: Option<&str>) -> Result<(), ContentServiceError> {
    if let Some(via_url) = via_url {
        fields::max_length("via_url", via_url, VIA_URL_MAX_LENGTH).map_err(invalid)?;
        fields::http_url("via_url", via_url).map_err(invalid)?;
    }
    if let Some(via_title) = via_title {
        fields::max_length("via_title", via_title, VIA_TITLE_MAX_LENGTH).map_err(invalid)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxBlogmarkRepository, SqlxTagRepository};
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_service() -> BlogmarkService {
        let pool = create_test_pool()
            .await
            .expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let tags = Arc::new(TagService::new(SqlxTagRepository::boxed(pool.clone())));
        BlogmarkService::new(SqlxBlogmarkRepository::boxed(pool), tags)
    }

    fn input(link_url: &str, link_title: &str) -> CreateBlogmarkInput {
        CreateBlogmarkInput {
            link_url: link_url.to_string(),
            link_title: link_title.to_string(),
            commentary: "Worth a read".to_string(),
            ..Default::default()
        }
    }

    fn assert_invalid(result: Result<Blogmark, ContentServiceError>) {
        assert!(
            matches!(result, Err(ContentServiceError::ValidationError(_))),
            "expected validation error, got {:?}",
            result
        );
    }

    #[tokio::test]
    async fn test_create_blogmark() {
        let service = setup_test_service().await;
        let mut create = input("https://example.com/post", "An Example Post");
        create.via_url = Some("https://news.example.org/item?id=1".to_string());
        create.via_title = Some("Example News".to_string());
        create.tags = vec!["links".to_string()];

        let created = service.create(&create).await.unwrap();

        assert_eq!(created.meta.slug, "an-example-post");
        assert_eq!(created.via_title.as_deref(), Some("Example News"));
        assert_eq!(created.meta.tags[0].tag, "links");
    }

    #[tokio::test]
    async fn test_create_rejects_bad_urls() {
        let service = setup_test_service().await;

        assert_invalid(service.create(&input("not a url", "Title")).await);
        assert_invalid(service.create(&input("ftp://example.com/", "Title")).await);

        let mut long_via = input("https://example.com/", "Title");
        long_via.via_url = Some(format!("https://example.com/{}", "v".repeat(200)));
        assert_invalid(service.create(&long_via).await);

        let mut bad_via = input("https://example.com/", "Title");
        bad_via.via_url = Some("mailto:someone@example.com".to_string());
        assert_invalid(service.create(&bad_via).await);
    }

    #[tokio::test]
    async fn test_create_requires_fields() {
        let service = setup_test_service().await;

        assert_invalid(service.create(&input("https://example.com/", "")).await);
        let mut no_commentary = input("https://example.com/", "Title");
        no_commentary.commentary = " ".to_string();
        assert_invalid(service.create(&no_commentary).await);
    }

    #[tokio::test]
    async fn test_blank_via_is_stored_as_none() {
        let service = setup_test_service().await;
        let mut create = input("https://example.com/", "Title");
        create.via_url = Some("".to_string());
        create.via_title = Some("  ".to_string());

        let created = service.create(&create).await.unwrap();

        assert_eq!(created.via_url, None);
        assert_eq!(created.via_title, None);
    }

    #[tokio::test]
    async fn test_update_blogmark() {
        let service = setup_test_service().await;
        let created = service
            .create(&input("https://example.com/", "Title"))
            .await
            .unwrap();

        let updated = service
            .update(
                created.id,
                &UpdateBlogmarkInput {
                    link_title: Some("Better title".to_string()),
                    via_url: Some(Some("https://via.example/".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.link_title, "Better title");
        assert_eq!(updated.via_url.as_deref(), Some("https://via.example/"));
        assert_eq!(updated.meta.slug, "title");

        assert_invalid(
            service
                .update(
                    created.id,
                    &UpdateBlogmarkInput {
                        link_url: Some("nope".to_string()),
                        ..Default::default()
                    },
                )
                .await,
        );
    }

    #[tokio::test]
    async fn test_delete_blogmark() {
        let service = setup_test_service().await;
        let created = service
            .create(&input("https://example.com/", "Title"))
            .await
            .unwrap();

        service.delete(created.id).await.unwrap();

        assert!(matches!(
            service.delete(created.id).await,
            Err(ContentServiceError::NotFound(_))
        ));
    }
}
