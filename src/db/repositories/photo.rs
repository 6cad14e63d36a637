//! Photo repository
//!
//! Stores photo metadata; the image files are managed by the photo service.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ContentFilter, ContentMeta, ListParams, PagedResult, Photo};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use super::listing::{
    fetch_created_mysql, fetch_created_sqlite, fetch_page_mysql, fetch_page_sqlite, SearchFields,
    TaggedTable, WhereClause,
};
use super::tag::{replace_tags_mysql, replace_tags_sqlite, tags_for_mysql, tags_for_sqlite};

const TAGGED: TaggedTable = TaggedTable::Photos;

pub const PHOTO_SEARCH: SearchFields = SearchFields {
    tagged: TAGGED,
    columns: &["title"],
};

const COLUMNS: &str = "c.id, c.created, c.slug, c.photo, c.title";

/// Photo repository trait
#[async_trait]
pub trait PhotoRepository: Send + Sync {
    async fn create(&self, photo: &Photo) -> Result<Photo>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Photo>>;

    async fn list(&self, filter: &ContentFilter, params: &ListParams) -> Result<PagedResult<Photo>>;

    async fn created_dates(&self, filter: &ContentFilter) -> Result<Vec<DateTime<Utc>>>;

    /// Update metadata; the stored file path is left untouched
    async fn update(&self, photo: &Photo) -> Result<Photo>;

    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based photo repository implementation
pub struct SqlxPhotoRepository {
    pool: DynDatabasePool,
}

impl SqlxPhotoRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PhotoRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PhotoRepository for SqlxPhotoRepository {
    async fn create(&self, photo: &Photo) -> Result<Photo> {
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => create_photo_sqlite(self.pool.sqlite()?, photo).await?,
            DatabaseDriver::Mysql => create_photo_mysql(self.pool.mysql()?, photo).await?,
        };
        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow!("Photo {} missing after insert", id))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Photo>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_photo_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_photo_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn list(&self, filter: &ContentFilter, params: &ListParams) -> Result<PagedResult<Photo>> {
        let clause = WhereClause::for_filter(&PHOTO_SEARCH, filter)?;
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_photos_sqlite(self.pool.sqlite()?, &clause, params).await,
            DatabaseDriver::Mysql => list_photos_mysql(self.pool.mysql()?, &clause, params).await,
        }
    }

    async fn created_dates(&self, filter: &ContentFilter) -> Result<Vec<DateTime<Utc>>> {
        let clause = WhereClause::for_filter(&PHOTO_SEARCH, filter)?;
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                fetch_created_sqlite(self.pool.sqlite()?, TAGGED.table(), &clause).await
            }
            DatabaseDriver::Mysql => {
                fetch_created_mysql(self.pool.mysql()?, TAGGED.table(), &clause).await
            }
        }
    }

    async fn update(&self, photo: &Photo) -> Result<Photo> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_photo_sqlite(self.pool.sqlite()?, photo).await?,
            DatabaseDriver::Mysql => update_photo_mysql(self.pool.mysql()?, photo).await?,
        }
        self.get_by_id(photo.id)
            .await?
            .ok_or_else(|| anyhow!("Photo {} not found", photo.id))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let sql = "DELETE FROM photos WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to delete photo")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to delete photo")?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_photo_sqlite(pool: &SqlitePool, photo: &Photo) -> Result<i64> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query("INSERT INTO photos (created, slug, photo, title) VALUES (?, ?, ?, ?)")
        .bind(photo.meta.created)
        .bind(&photo.meta.slug)
        .bind(&photo.photo)
        .bind(&photo.title)
        .execute(&mut *tx)
        .await
        .context("Failed to create photo")?;

    let id = result.last_insert_rowid();
    replace_tags_sqlite(&mut tx, TAGGED, id, &photo.meta.tag_ids()).await?;

    tx.commit().await.context("Failed to commit photo")?;
    Ok(id)
}

async fn get_photo_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Photo>> {
    let sql = format!("SELECT {} FROM photos c WHERE c.id = ?", COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get photo by ID")?;

    match row {
        Some(row) => {
            let mut photo = row_to_photo_sqlite(&row);
            photo.meta.tags = tags_for_sqlite(pool, TAGGED, photo.id).await?;
            Ok(Some(photo))
        }
        None => Ok(None),
    }
}

async fn list_photos_sqlite(
    pool: &SqlitePool,
    clause: &WhereClause,
    params: &ListParams,
) -> Result<PagedResult<Photo>> {
    let (rows, total) = fetch_page_sqlite(pool, TAGGED.table(), COLUMNS, clause, params).await?;

    let mut photos = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut photo = row_to_photo_sqlite(row);
        photo.meta.tags = tags_for_sqlite(pool, TAGGED, photo.id).await?;
        photos.push(photo);
    }

    Ok(PagedResult::new(photos, total, params))
}

async fn update_photo_sqlite(pool: &SqlitePool, photo: &Photo) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query("UPDATE photos SET created = ?, slug = ?, title = ? WHERE id = ?")
        .bind(photo.meta.created)
        .bind(&photo.meta.slug)
        .bind(&photo.title)
        .bind(photo.id)
        .execute(&mut *tx)
        .await
        .context("Failed to update photo")?;

    replace_tags_sqlite(&mut tx, TAGGED, photo.id, &photo.meta.tag_ids()).await?;

    tx.commit().await.context("Failed to commit photo")?;
    Ok(())
}

fn row_to_photo_sqlite(row: &sqlx::sqlite::SqliteRow) -> Photo {
    Photo {
        id: row.get("id"),
        meta: ContentMeta {
            created: row.get("created"),
            slug: row.get("slug"),
            tags: Vec::new(),
        },
        photo: row.get("photo"),
        title: row.get("title"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_photo_mysql(pool: &MySqlPool, photo: &Photo) -> Result<i64> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query("INSERT INTO photos (created, slug, photo, title) VALUES (?, ?, ?, ?)")
        .bind(photo.meta.created)
        .bind(&photo.meta.slug)
        .bind(&photo.photo)
        .bind(&photo.title)
        .execute(&mut *tx)
        .await
        .context("Failed to create photo")?;

    let id = result.last_insert_id() as i64;
    replace_tags_mysql(&mut tx, TAGGED, id, &photo.meta.tag_ids()).await?;

    tx.commit().await.context("Failed to commit photo")?;
    Ok(id)
}

async fn get_photo_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Photo>> {
    let sql = format!("SELECT {} FROM photos c WHERE c.id = ?", COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get photo by ID")?;

    match row {
        Some(row) => {
            let mut photo = row_to_photo_mysql(&row);
            photo.meta.tags = tags_for_mysql(pool, TAGGED, photo.id).await?;
            Ok(Some(photo))
        }
        None => Ok(None),
    }
}

async fn list_photos_mysql(
    pool: &MySqlPool,
    clause: &WhereClause,
    params: &ListParams,
) -> Result<PagedResult<Photo>> {
    let (rows, total) = fetch_page_mysql(pool, TAGGED.table(), COLUMNS, clause, params).await?;

    let mut photos = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut photo = row_to_photo_mysql(row);
        photo.meta.tags = tags_for_mysql(pool, TAGGED, photo.id).await?;
        photos.push(photo);
    }

    Ok(PagedResult::new(photos, total, params))
}

async fn update_photo_mysql(pool: &MySqlPool, photo: &Photo) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query("UPDATE photos SET created = ?, slug = ?, title = ? WHERE id = ?")
        .bind(photo.meta.created)
        .bind(&photo.meta.slug)
        .bind(&photo.title)
        .bind(photo.id)
        .execute(&mut *tx)
        .await
        .context("Failed to update photo")?;

    replace_tags_mysql(&mut tx, TAGGED, photo.id, &photo.meta.tag_ids()).await?;

    tx.commit().await.context("Failed to commit photo")?;
    Ok(())
}

fn row_to_photo_mysql(row: &sqlx::mysql::MySqlRow) -> Photo {
    Photo {
        id: row.get("id"),
        meta: ContentMeta {
            created: row.get("created"),
            slug: row.get("slug"),
            tags: Vec::new(),
        },
        photo: row.get("photo"),
        title: row.get("title"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxPhotoRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxPhotoRepository::new(pool)
    }

    fn photo(title: &str) -> Photo {
        Photo {
            id: 0,
            meta: ContentMeta::new("pelican".to_string()),
            photo: "photos/2024/03/abc.jpg".to_string(),
            title: title.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_photo_with_blank_title() {
        let repo = setup_test_repo().await;

        let created = repo.create(&photo("")).await.expect("Failed to create photo");

        assert_eq!(created.title, "");
        assert_eq!(created.photo, "photos/2024/03/abc.jpg");
    }

    #[tokio::test]
    async fn test_update_keeps_file_path() {
        let repo = setup_test_repo().await;
        let mut created = repo.create(&photo("Pelican")).await.unwrap();

        created.title = "Brown pelican".to_string();
        created.photo = "photos/elsewhere.jpg".to_string();
        let updated = repo.update(&created).await.unwrap();

        assert_eq!(updated.title, "Brown pelican");
        assert_eq!(updated.photo, "photos/2024/03/abc.jpg");
    }

    #[tokio::test]
    async fn test_search_and_delete_photo() {
        let repo = setup_test_repo().await;
        let pelican = repo.create(&photo("Pelican at dusk")).await.unwrap();
        repo.create(&photo("Heron")).await.unwrap();

        let filter = ContentFilter {
            q: Some("pelican".to_string()),
            ..Default::default()
        };
        let page = repo.list(&filter, &ListParams::default()).await.unwrap();
        assert_eq!(page.total, 1);

        repo.delete(pelican.id).await.unwrap();
        let page = repo.list(&filter, &ListParams::default()).await.unwrap();
        assert_eq!(page.total, 0);
    }
}
