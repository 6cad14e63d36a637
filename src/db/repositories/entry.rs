//! Entry repository
//!
//! Database operations for blog entries and their tag links.
//!
//! This module provides:
//! - `EntryRepository` trait defining the interface for entry data access
//! - `SqlxEntryRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ContentFilter, ContentMeta, Entry, ListParams, PagedResult};
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

const TAGGED: TaggedTable = TaggedTable::Entries;

/// Entries are searched by title, body and tags
pub const ENTRY_SEARCH: SearchFields = SearchFields {
    tagged: TAGGED,
    columns: &["title", "body"],
};

const COLUMNS: &str =
    "c.id, c.created, c.slug, c.title, c.body, c.tweet_html, c.extra_head_html, c.series_id";

/// Entry repository trait
#[async_trait]
pub trait EntryRepository: Send + Sync {
    /// Insert an entry together with its tag links
    async fn create(&self, entry: &Entry) -> Result<Entry>;

    /// Get entry by ID, tags included
    async fn get_by_id(&self, id: i64) -> Result<Option<Entry>>;

    /// List entries matching the filter, newest first
    async fn list(&self, filter: &ContentFilter, params: &ListParams) -> Result<PagedResult<Entry>>;

    /// Creation timestamps of every entry matching the filter
    async fn created_dates(&self, filter: &ContentFilter) -> Result<Vec<DateTime<Utc>>>;

    /// Overwrite an entry and replace its tag links
    async fn update(&self, entry: &Entry) -> Result<Entry>;

    /// Delete an entry; its tag links go with it
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based entry repository implementation
pub struct SqlxEntryRepository {
    pool: DynDatabasePool,
}

impl SqlxEntryRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn EntryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl EntryRepository for SqlxEntryRepository {
    async fn create(&self, entry: &Entry) -> Result<Entry> {
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => create_entry_sqlite(self.pool.sqlite()?, entry).await?,
            DatabaseDriver::Mysql => create_entry_mysql(self.pool.mysql()?, entry).await?,
        };
        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow!("Entry {} missing after insert", id))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Entry>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_entry_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_entry_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn list(&self, filter: &ContentFilter, params: &ListParams) -> Result<PagedResult<Entry>> {
        let clause = WhereClause::for_filter(&ENTRY_SEARCH, filter)?;
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_entries_sqlite(self.pool.sqlite()?, &clause, params).await,
            DatabaseDriver::Mysql => list_entries_mysql(self.pool.mysql()?, &clause, params).await,
        }
    }

    async fn created_dates(&self, filter: &ContentFilter) -> Result<Vec<DateTime<Utc>>> {
        let clause = WhereClause::for_filter(&ENTRY_SEARCH, filter)?;
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                fetch_created_sqlite(self.pool.sqlite()?, TAGGED.table(), &clause).await
            }
            DatabaseDriver::Mysql => {
                fetch_created_mysql(self.pool.mysql()?, TAGGED.table(), &clause).await
            }
        }
    }

    async fn update(&self, entry: &Entry) -> Result<Entry> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_entry_sqlite(self.pool.sqlite()?, entry).await?,
            DatabaseDriver::Mysql => update_entry_mysql(self.pool.mysql()?, entry).await?,
        }
        self.get_by_id(entry.id)
            .await?
            .ok_or_else(|| anyhow!("Entry {} not found", entry.id))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let sql = "DELETE FROM entries WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to delete entry")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to delete entry")?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_entry_sqlite(pool: &SqlitePool, entry: &Entry) -> Result<i64> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        r#"
        INSERT INTO entries (created, slug, title, body, tweet_html, extra_head_html, series_id)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.meta.created)
    .bind(&entry.meta.slug)
    .bind(&entry.title)
    .bind(&entry.body)
    .bind(&entry.tweet_html)
    .bind(&entry.extra_head_html)
    .bind(entry.series_id)
    .execute(&mut *tx)
    .await
    .context("Failed to create entry")?;

    let id = result.last_insert_rowid();
    replace_tags_sqlite(&mut tx, TAGGED, id, &entry.meta.tag_ids()).await?;

    tx.commit().await.context("Failed to commit entry")?;
    Ok(id)
}

async fn get_entry_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Entry>> {
    let sql = format!("SELECT {} FROM entries c WHERE c.id = ?", COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get entry by ID")?;

    match row {
        Some(row) => {
            let mut entry = row_to_entry_sqlite(&row);
            entry.meta.tags = tags_for_sqlite(pool, TAGGED, entry.id).await?;
            Ok(Some(entry))
        }
        None => Ok(None),
    }
}

async fn list_entries_sqlite(
    pool: &SqlitePool,
    clause: &WhereClause,
    params: &ListParams,
) -> Result<PagedResult<Entry>> {
    let (rows, total) = fetch_page_sqlite(pool, TAGGED.table(), COLUMNS, clause, params).await?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut entry = row_to_entry_sqlite(row);
        entry.meta.tags = tags_for_sqlite(pool, TAGGED, entry.id).await?;
        entries.push(entry);
    }

    Ok(PagedResult::new(entries, total, params))
}

async fn update_entry_sqlite(pool: &SqlitePool, entry: &Entry) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query(
        r#"
        UPDATE entries
        SET created = ?, slug = ?, title = ?, body = ?, tweet_html = ?,
            extra_head_html = ?, series_id = ?
        WHERE id = ?
        "#,
    )
    .bind(entry.meta.created)
    .bind(&entry.meta.slug)
    .bind(&entry.title)
    .bind(&entry.body)
    .bind(&entry.tweet_html)
    .bind(&entry.extra_head_html)
    .bind(entry.series_id)
    .bind(entry.id)
    .execute(&mut *tx)
    .await
    .context("Failed to update entry")?;

    replace_tags_sqlite(&mut tx, TAGGED, entry.id, &entry.meta.tag_ids()).await?;

    tx.commit().await.context("Failed to commit entry")?;
    Ok(())
}

fn row_to_entry_sqlite(row: &sqlx::sqlite::SqliteRow) -> Entry {
    Entry {
        id: row.get("id"),
        meta: ContentMeta {
            created: row.get("created"),
            slug: row.get("slug"),
            tags: Vec::new(),
        },
        title: row.get("title"),
        body: row.get("body"),
        tweet_html: row.get("tweet_html"),
        extra_head_html: row.get("extra_head_html"),
        series_id: row.get("series_id"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_entry_mysql(pool: &MySqlPool, entry: &Entry) -> Result<i64> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        r#"
        INSERT INTO entries (created, slug, title, body, tweet_html, extra_head_html, series_id)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.meta.created)
    .bind(&entry.meta.slug)
    .bind(&entry.title)
    .bind(&entry.body)
    .bind(&entry.tweet_html)
    .bind(&entry.extra_head_html)
    .bind(entry.series_id)
    .execute(&mut *tx)
    .await
    .context("Failed to create entry")?;

    let id = result.last_insert_id() as i64;
    replace_tags_mysql(&mut tx, TAGGED, id, &entry.meta.tag_ids()).await?;

    tx.commit().await.context("Failed to commit entry")?;
    Ok(id)
}

async fn get_entry_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Entry>> {
    let sql = format!("SELECT {} FROM entries c WHERE c.id = ?", COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get entry by ID")?;

    match row {
        Some(row) => {
            let mut entry = row_to_entry_mysql(&row);
            entry.meta.tags = tags_for_mysql(pool, TAGGED, entry.id).await?;
            Ok(Some(entry))
        }
        None => Ok(None),
    }
}

async fn list_entries_mysql(
    pool: &MySqlPool,
    clause: &WhereClause,
    params: &ListParams,
) -> Result<PagedResult<Entry>> {
    let (rows, total) = fetch_page_mysql(pool, TAGGED.table(), COLUMNS, clause, params).await?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut entry = row_to_entry_mysql(row);
        entry.meta.tags = tags_for_mysql(pool, TAGGED, entry.id).await?;
        entries.push(entry);
    }

    Ok(PagedResult::new(entries, total, params))
}

async fn update_entry_mysql(pool: &MySqlPool, entry: &Entry) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query(
        r#"
        UPDATE entries
        SET created = ?, slug = ?, title = ?, body = ?, tweet_html = ?,
            extra_head_html = ?, series_id = ?
        WHERE id = ?
        "#,
    )
    .bind(entry.meta.created)
    .bind(&entry.meta.slug)
    .bind(&entry.title)
    .bind(&entry.body)
    .bind(&entry.tweet_html)
    .bind(&entry.extra_head_html)
    .bind(entry.series_id)
    .bind(entry.id)
    .execute(&mut *tx)
    .await
    .context("Failed to update entry")?;

    replace_tags_mysql(&mut tx, TAGGED, entry.id, &entry.meta.tag_ids()).await?;

    tx.commit().await.context("Failed to commit entry")?;
    Ok(())
}

fn row_to_entry_mysql(row: &sqlx::mysql::MySqlRow) -> Entry {
    Entry {
        id: row.get("id"),
        meta: ContentMeta {
            created: row.get("created"),
            slug: row.get("slug"),
            tags: Vec::new(),
        },
        title: row.get("title"),
        body: row.get("body"),
        tweet_html: row.get("tweet_html"),
        extra_head_html: row.get("extra_head_html"),
        series_id: row.get("series_id"),
    }
}
