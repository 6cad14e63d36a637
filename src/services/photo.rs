//! Photo service
//!
//! Handles photo uploads and metadata. Image files are written under the
//! media root at `photos/YYYY/MM/<uuid>.<ext>`, keyed by upload time, and
//! removed again when the photo is deleted.

use crate::config::MediaConfig;
use crate::db::repositories::PhotoRepository;
use crate::models::{
    upload_dir, ContentFilter, ContentMeta, CreatePhotoInput, DateBuckets, ListParams,
    PagedResult, Photo, UpdatePhotoInput, CONTENT_SLUG_MAX_LENGTH,
};
use crate::services::content::{check_content_slug, check_filter, invalid, ContentServiceError};
use crate::services::slug::resolve_slug;
use crate::services::tag::TagService;
use anyhow::Context;
use chrono::Utc;
use image::ImageFormat;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use uuid::Uuid;

/// An uploaded image as received from the client
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Photo service
pub struct PhotoService {
    repo: Arc<dyn PhotoRepository>,
    tag_service: Arc<TagService>,
    media: MediaConfig,
}

impl PhotoService {
    pub fn new(
        repo: Arc<dyn PhotoRepository>,
        tag_service: Arc<TagService>,
        media: MediaConfig,
    ) -> Self {
        Self {
            repo,
            tag_service,
            media,
        }
    }

    /// Public URL of a photo's image file
    pub fn url_for(&self, photo: &Photo) -> String {
        self.media.url_for(&photo.photo)
    }

    /// Absolute location of a stored file
    pub fn file_path(&self, relative: &str) -> PathBuf {
        self.media.path.join(relative)
    }

    pub async fn list(
        &self,
        filter: &ContentFilter,
        params: &ListParams,
    ) -> Result<PagedResult<Photo>, ContentServiceError> {
        check_filter(filter)?;
        self.repo
            .list(filter, params)
            .await
            .context("Failed to list photos")
            .map_err(Into::into)
    }

    pub async fn dates(&self, filter: &ContentFilter) -> Result<DateBuckets, ContentServiceError> {
        check_filter(filter)?;
        let created = self
            .repo
            .created_dates(filter)
            .await
            .context("Failed to list photo dates")?;
        Ok(filter.date.buckets(&created))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Photo>, ContentServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get photo by ID")
            .map_err(Into::into)
    }

    /// Store an uploaded image and create its photo record
    ///
    /// # Errors
    /// - `ValidationError` for a missing, oversized or disallowed file, a
    ///   missing or bad slug, or a bad tag
    pub async fn create(
        &self,
        input: &CreatePhotoInput,
        upload: &PhotoUpload,
    ) -> Result<Photo, ContentServiceError> {
        self.check_upload(upload)?;
        check_image(upload).await?;
        // Photos have no field to derive a slug from
        let slug =
            resolve_slug(Some(&input.slug), None, CONTENT_SLUG_MAX_LENGTH).map_err(invalid)?;
        let tags = self.tag_service.resolve(&input.tags).await?;

        let relative = self.store_file(upload).await?;
        let photo = Photo {
            id: 0,
            meta: ContentMeta {
                created: input.created.unwrap_or_else(Utc::now),
                slug,
                tags,
            },
            photo: relative.clone(),
            title: input.title.clone(),
        };

        match self.repo.create(&photo).await {
            Ok(created) => {
                tracing::info!("Created photo {} ({}) at {}", created.meta.slug, created.id, relative);
                Ok(created)
            }
            Err(err) => {
                self.remove_file(&relative).await;
                Err(err.context("Failed to create photo").into())
            }
        }
    }

    /// Update photo metadata; the image itself cannot be replaced
    pub async fn update(
        &self,
        id: i64,
        input: &UpdatePhotoInput,
    ) -> Result<Photo, ContentServiceError> {
        let mut photo = self.require(id).await?;

        if let Some(title) = &input.title {
            photo.title = title.clone();
        }
        if let Some(slug) = &input.slug {
            photo.meta.slug = check_content_slug(slug)?;
        }
        if let Some(created) = input.created {
            photo.meta.created = created;
        }
        if let Some(tags) = &input.tags {
            photo.meta.tags = self.tag_service.resolve(tags).await?;
        }

        self.repo
            .update(&photo)
            .await
            .context("Failed to update photo")
            .map_err(Into::into)
    }

    /// Delete a photo record and its image file
    pub async fn delete(&self, id: i64) -> Result<(), ContentServiceError> {
        let photo = self.require(id).await?;
        self.repo
            .delete(photo.id)
            .await
            .context("Failed to delete photo")?;
        self.remove_file(&photo.photo).await;

        tracing::info!("Deleted photo {} ({})", photo.meta.slug, photo.id);
        Ok(())
    }

    fn check_upload(&self, upload: &PhotoUpload) -> Result<(), ContentServiceError> {
        if upload.data.is_empty() {
            return Err(invalid(format!("{} is empty", upload.file_name)));
        }
        if !self.media.is_type_allowed(&upload.content_type) {
            return Err(invalid(format!(
                "Invalid file type: {}. Allowed types: {:?}",
                upload.content_type, self.media.allowed_types
            )));
        }
        if upload.data.len() as u64 > self.media.max_file_size {
            return Err(invalid(format!(
                "File too large. Maximum size: {} bytes ({} MB)",
                self.media.max_file_size,
                self.media.max_file_size / 1024 / 1024
            )));
        }
        Ok(())
    }

    /// Write the file and return its path relative to the media root
    async fn store_file(&self, upload: &PhotoUpload) -> Result<String, ContentServiceError> {
        let dir = upload_dir(Utc::now());
        let file_name = format!(
            "{}.{}",
            Uuid::new_v4(),
            self.media.get_extension(&upload.content_type)
        );
        let relative = format!("{}/{}", dir, file_name);

        let absolute_dir = self.media.path.join(&dir);
        fs::create_dir_all(&absolute_dir)
            .await
            .with_context(|| format!("Failed to create upload dir {:?}", absolute_dir))?;
        fs::write(self.file_path(&relative), &upload.data)
            .await
            .with_context(|| format!("Failed to save photo {}", relative))?;

        Ok(relative)
    }

    async fn remove_file(&self, relative: &str) {
        if let Err(e) = fs::remove_file(self.file_path(relative)).await {
            tracing::warn!("Failed to remove photo file {}: {}", relative, e);
        }
    }

    async fn require(&self, id: i64) -> Result<Photo, ContentServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get photo")?
            .ok_or_else(|| ContentServiceError::NotFound(format!("Photo with ID {} not found", id)))
    }
}

/// Decode an upload to make sure it is the image its content type claims.
///
/// Decoding runs on the blocking pool since a full-size photo can take a
/// while.
async fn check_image(upload: &PhotoUpload) -> Result<(), ContentServiceError> {
    let format = image::guess_format(&upload.data)
        .map_err(|_| invalid(format!("{} is not a valid image", upload.file_name)))?;
    if let Some(declared) = ImageFormat::from_mime_type(&upload.content_type) {
        if declared != format {
            return Err(invalid(format!(
                "{} is a {} image, not {}",
                upload.file_name,
                format.to_mime_type(),
                upload.content_type
            )));
        }
    }

    let data = upload.data.clone();
    tokio::task::spawn_blocking(move || image::load_from_memory_with_format(&data, format))
        .await
        .context("Image decoding task failed")?
        .map(|_| ())
        .map_err(|err| invalid(format!("{} is not a valid image: {}", upload.file_name, err)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxPhotoRepository, SqlxTagRepository};
    use crate::db::{create_test_pool, migrations};
    use tempfile::TempDir;

    async fn setup_test_service() -> (TempDir, PhotoService) {
        let pool = create_test_pool()
            .await
            .expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let media_dir = TempDir::new().expect("Failed to create media dir");
        let media = MediaConfig {
            path: media_dir.path().to_path_buf(),
            max_file_size: 64 * 1024,
            ..Default::default()
        };
        let tags = Arc::new(TagService::new(SqlxTagRepository::boxed(pool.clone())));
        let service = PhotoService::new(SqlxPhotoRepository::boxed(pool), tags, media);
        (media_dir, service)
    }

    fn upload(content_type: &str, data: Vec<u8>) -> PhotoUpload {
        PhotoUpload {
            file_name: "pelican.jpg".to_string(),
            content_type: content_type.to_string(),
            data,
        }
    }

    fn image_bytes(format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        image::RgbImage::new(2, 2)
            .write_to(&mut std::io::Cursor::new(&mut bytes), format)
            .unwrap();
        bytes
    }

    fn image_upload(format: ImageFormat) -> PhotoUpload {
        upload(format.to_mime_type(), image_bytes(format))
    }

    fn input(slug: &str) -> CreatePhotoInput {
        CreatePhotoInput {
            title: "Pelican".to_string(),
            slug: slug.to_string(),
            created: None,
            tags: vec!["birds".to_string()],
        }
    }

    #[tokio::test]
    async fn test_create_photo_writes_file() {
        let (_media, service) = setup_test_service().await;

        let jpeg = image_upload(ImageFormat::Jpeg);
        let photo = service.create(&input("pelican"), &jpeg).await.unwrap();

        let expected_dir = upload_dir(Utc::now());
        assert!(photo.photo.starts_with(&expected_dir));
        assert!(photo.photo.ends_with(".jpg"));
        let stored = fs::read(service.file_path(&photo.photo)).await.unwrap();
        assert_eq!(stored, jpeg.data);
        assert_eq!(service.url_for(&photo), format!("/media/{}", photo.photo));
        assert_eq!(photo.meta.tags[0].tag, "birds");
    }

    #[tokio::test]
    async fn test_create_photo_requires_slug() {
        let (_media, service) = setup_test_service().await;

        let result = service
            .create(&input(""), &image_upload(ImageFormat::Png))
            .await;

        assert!(matches!(result, Err(ContentServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_create_photo_rejects_bad_uploads() {
        let (media, service) = setup_test_service().await;

        for bad in [
            upload("text/plain", b"text".to_vec()),
            upload("image/jpeg", Vec::new()),
            upload("image/jpeg", vec![0xFF; 64 * 1024 + 1]),
        ] {
            let result = service.create(&input("pelican"), &bad).await;
            assert!(matches!(result, Err(ContentServiceError::ValidationError(_))));
        }
        // Nothing was written
        assert!(!media.path().join("photos").exists());
    }

    #[tokio::test]
    async fn test_create_photo_rejects_data_that_is_not_an_image() {
        let (media, service) = setup_test_service().await;
        let png = image_bytes(ImageFormat::Png);

        for bad in [
            upload("image/jpeg", vec![0xFF; 16]),
            upload("image/png", b"\x89PNG\r\n\x1a\nnot really a png".to_vec()),
            upload("image/png", png[..png.len() / 2].to_vec()),
            upload("image/jpeg", png.clone()),
        ] {
            let result = service.create(&input("pelican"), &bad).await;
            assert!(
                matches!(result, Err(ContentServiceError::ValidationError(_))),
                "accepted {} bytes declared as {}",
                bad.data.len(),
                bad.content_type
            );
        }
        assert!(!media.path().join("photos").exists());
    }

    #[tokio::test]
    async fn test_update_photo_metadata() {
        let (_media, service) = setup_test_service().await;
        let photo = service
            .create(&input("pelican"), &image_upload(ImageFormat::Png))
            .await
            .unwrap();

        let updated = service
            .update(
                photo.id,
                &UpdatePhotoInput {
                    title: Some(String::new()),
                    tags: Some(vec![]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "");
        assert!(updated.meta.tags.is_empty());
        assert_eq!(updated.photo, photo.photo);
    }

    #[tokio::test]
    async fn test_delete_photo_removes_file() {
        let (_media, service) = setup_test_service().await;
        let photo = service
            .create(&input("pelican"), &image_upload(ImageFormat::Jpeg))
            .await
            .unwrap();
        let path = service.file_path(&photo.photo);
        assert!(path.exists());

        service.delete(photo.id).await.unwrap();

        assert!(!path.exists());
        assert!(service.get_by_id(photo.id).await.unwrap().is_none());
    }
}
