//! Blogmark repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Blogmark, ContentFilter, ContentMeta, ListParams, PagedResult};
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

const TAGGED: TaggedTable = TaggedTable::Blogmarks;

pub const BLOGMARK_SEARCH: SearchFields = SearchFields {
    tagged: TAGGED,
    columns: &["commentary"],
};

const COLUMNS: &str =
    "c.id, c.created, c.slug, c.link_url, c.link_title, c.via_url, c.via_title, c.commentary";

/// Blogmark repository trait
#[async_trait]
pub trait BlogmarkRepository: Send + Sync {
    async fn create(&self, blogmark: &Blogmark) -> Result<Blogmark>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Blogmark>>;

    async fn list(&self, filter: &ContentFilter, params: &ListParams)
        -> Result<PagedResult<Blogmark>>;

    async fn created_dates(&self, filter: &ContentFilter) -> Result<Vec<DateTime<Utc>>>;

    async fn update(&self, blogmark: &Blogmark) -> Result<Blogmark>;

    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based blogmark repository implementation
pub struct SqlxBlogmarkRepository {
    pool: DynDatabasePool,
}

impl SqlxBlogmarkRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn BlogmarkRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl BlogmarkRepository for SqlxBlogmarkRepository {
    async fn create(&self, blogmark: &Blogmark) -> Result<Blogmark> {
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => create_blogmark_sqlite(self.pool.sqlite()?, blogmark).await?,
            DatabaseDriver::Mysql => create_blogmark_mysql(self.pool.mysql()?, blogmark).await?,
        };
        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow!("Blogmark {} missing after insert", id))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Blogmark>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_blogmark_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_blogmark_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn list(
        &self,
        filter: &ContentFilter,
        params: &ListParams,
    ) -> Result<PagedResult<Blogmark>> {
        let clause = WhereClause::for_filter(&BLOGMARK_SEARCH, filter)?;
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_blogmarks_sqlite(self.pool.sqlite()?, &clause, params).await,
            DatabaseDriver::Mysql => list_blogmarks_mysql(self.pool.mysql()?, &clause, params).await,
        }
    }

    async fn created_dates(&self, filter: &ContentFilter) -> Result<Vec<DateTime<Utc>>> {
        let clause = WhereClause::for_filter(&BLOGMARK_SEARCH, filter)?;
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                fetch_created_sqlite(self.pool.sqlite()?, TAGGED.table(), &clause).await
            }
            DatabaseDriver::Mysql => {
                fetch_created_mysql(self.pool.mysql()?, TAGGED.table(), &clause).await
            }
        }
    }

    async fn update(&self, blogmark: &Blogmark) -> Result<Blogmark> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_blogmark_sqlite(self.pool.sqlite()?, blogmark).await?,
            DatabaseDriver::Mysql => update_blogmark_mysql(self.pool.mysql()?, blogmark).await?,
        }
        self.get_by_id(blogmark.id)
            .await?
            .ok_or_else(|| anyhow!("Blogmark {} not found", blogmark.id))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let sql = "DELETE FROM blogmarks WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to delete blogmark")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to delete blogmark")?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_blogmark_sqlite(pool: &SqlitePool, blogmark: &Blogmark) -> Result<i64> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        r#"
        INSERT INTO blogmarks (created, slug, link_url, link_title, via_url, via_title, commentary)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(blogmark.meta.created)
    .bind(&blogmark.meta.slug)
    .bind(&blogmark.link_url)
    .bind(&blogmark.link_title)
    .bind(&blogmark.via_url)
    .bind(&blogmark.via_title)
    .bind(&blogmark.commentary)
    .execute(&mut *tx)
    .await
    .context("Failed to create blogmark")?;

    let id = result.last_insert_rowid();
    replace_tags_sqlite(&mut tx, TAGGED, id, &blogmark.meta.tag_ids()).await?;

    tx.commit().await.context("Failed to commit blogmark")?;
    Ok(id)
}

async fn get_blogmark_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Blogmark>> {
    let sql = format!("SELECT {} FROM blogmarks c WHERE c.id = ?", COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get blogmark by ID")?;

    match row {
        Some(row) => {
            let mut blogmark = row_to_blogmark_sqlite(&row);
            blogmark.meta.tags = tags_for_sqlite(pool, TAGGED, blogmark.id).await?;
            Ok(Some(blogmark))
        }
        None => Ok(None),
    }
}

async fn list_blogmarks_sqlite(
    pool: &SqlitePool,
    clause: &WhereClause,
    params: &ListParams,
) -> Result<PagedResult<Blogmark>> {
    let (rows, total) = fetch_page_sqlite(pool, TAGGED.table(), COLUMNS, clause, params).await?;

    let mut blogmarks = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut blogmark = row_to_blogmark_sqlite(row);
        blogmark.meta.tags = tags_for_sqlite(pool, TAGGED, blogmark.id).await?;
        blogmarks.push(blogmark);
    }

    Ok(PagedResult::new(blogmarks, total, params))
}

async fn update_blogmark_sqlite(pool: &SqlitePool, blogmark: &Blogmark) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query(
        r#"
        UPDATE blogmarks
        SET created = ?, slug = ?, link_url = ?, link_title = ?, via_url = ?,
            via_title = ?, commentary = ?
        WHERE id = ?
        "#,
    )
    .bind(blogmark.meta.created)
    .bind(&blogmark.meta.slug)
    .bind(&blogmark.link_url)
    .bind(&blogmark.link_title)
    .bind(&blogmark.via_url)
    .bind(&blogmark.via_title)
    .bind(&blogmark.commentary)
    .bind(blogmark.id)
    .execute(&mut *tx)
    .await
    .context("Failed to update blogmark")?;

    replace_tags_sqlite(&mut tx, TAGGED, blogmark.id, &blogmark.meta.tag_ids()).await?;

    tx.commit().await.context("Failed to commit blogmark")?;
    Ok(())
}

fn row_to_blogmark_sqlite(row: &sqlx::sqlite::SqliteRow) -> Blogmark {
    Blogmark {
        id: row.get("id"),
        meta: ContentMeta {
            created: row.get("created"),
            slug: row.get("slug"),
            tags: Vec::new(),
        },
        link_url: row.get("link_url"),
        link_title: row.get("link_title"),
        via_url: row.get("via_url"),
        via_title: row.get("via_title"),
        commentary: row.get("commentary"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_blogmark_mysql(pool: &MySqlPool, blogmark: &Blogmark) -> Result<i64> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        r#"
        INSERT INTO blogmarks (created, slug, link_url, link_title, via_url, via_title, commentary)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(blogmark.meta.created)
    .bind(&blogmark.meta.slug)
    .bind(&blogmark.link_url)
    .bind(&blogmark.link_title)
    .bind(&blogmark.via_url)
    .bind(&blogmark.via_title)
    .bind(&blogmark.commentary)
    .execute(&mut *tx)
    .await
    .context("Failed to create blogmark")?;

    let id = result.last_insert_id() as i64;
    replace_tags_mysql(&mut tx, TAGGED, id, &blogmark.meta.tag_ids()).await?;

    tx.commit().await.context("Failed to commit blogmark")?;
    Ok(id)
}

async fn get_blogmark_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Blogmark>> {
    let sql = format!("SELECT {} FROM blogmarks c WHERE c.id = ?", COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get blogmark by ID")?;

    match row {
        Some(row) => {
            let mut blogmark = row_to_blogmark_mysql(&row);
            blogmark.meta.tags = tags_for_mysql(pool, TAGGED, blogmark.id).await?;
            Ok(Some(blogmark))
        }
        None => Ok(None),
    }
}

async fn list_blogmarks_mysql(
    pool: &MySqlPool,
    clause: &WhereClause,
    params: &ListParams,
) -> Result<PagedResult<Blogmark>> {
    let (rows, total) = fetch_page_mysql(pool, TAGGED.table(), COLUMNS, clause, params).await?;

    let mut blogmarks = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut blogmark = row_to_blogmark_mysql(row);
        blogmark.meta.tags = tags_for_mysql(pool, TAGGED, blogmark.id).await?;
        blogmarks.push(blogmark);
    }

    Ok(PagedResult::new(blogmarks, total, params))
}

async fn update_blogmark_mysql(pool: &MySqlPool, blogmark: &Blogmark) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query(
        r#"
        UPDATE blogmarks
        SET created = ?, slug = ?, link_url = ?, link_title = ?, via_url = ?,
            via_title = ?, commentary = ?
        WHERE id = ?
        "#,
    )
    .bind(blogmark.meta.created)
    .bind(&blogmark.meta.slug)
    .bind(&blogmark.link_url)
    .bind(&blogmark.link_title)
    .bind(&blogmark.via_url)
    .bind(&blogmark.via_title)
    .bind(&blogmark.commentary)
    .bind(blogmark.id)
    .execute(&mut *tx)
    .await
    .context("Failed to update blogmark")?;

    replace_tags_mysql(&mut tx, TAGGED, blogmark.id, &blogmark.meta.tag_ids()).await?;

    tx.commit().await.context("Failed to commit blogmark")?;
    Ok(())
}

fn row_to_blogmark_mysql(row: &sqlx::mysql::MySqlRow) -> Blogmark {
    Blogmark {
        id: row.get("id"),
        meta: ContentMeta {
            created: row.get("created"),
            slug: row.get("slug"),
            tags: Vec::new(),
        },
        link_url: row.get("link_url"),
        link_title: row.get("link_title"),
        via_url: row.get("via_url"),
        via_title: row.get("via_title"),
        commentary: row.get("commentary"),
    }
}
