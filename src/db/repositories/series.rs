//! Series repository
//!
//! Database operations for series. Deleting a series detaches its entries
//! rather than deleting them.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ListParams, PagedResult, Series};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Series repository trait
#[async_trait]
pub trait SeriesRepository: Send + Sync {
    /// Create a new series
    async fn create(&self, series: &Series) -> Result<Series>;

    /// Get series by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Series>>;

    /// List series by title
    async fn list(&self, params: &ListParams) -> Result<PagedResult<Series>>;

    /// Update an existing series
    async fn update(&self, series: &Series) -> Result<Series>;

    /// Delete a series, clearing `series_id` on its entries
    async fn delete(&self, id: i64) -> Result<()>;

    /// Whether a series with this ID exists
    async fn exists(&self, id: i64) -> Result<bool>;

    /// Number of entries in a series
    async fn count_entries(&self, id: i64) -> Result<i64>;
}

/// SQLx-based series repository implementation
pub struct SqlxSeriesRepository {
    pool: DynDatabasePool,
}

impl SqlxSeriesRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SeriesRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SeriesRepository for SqlxSeriesRepository {
    async fn create(&self, series: &Series) -> Result<Series> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_series_sqlite(self.pool.sqlite()?, series).await,
            DatabaseDriver::Mysql => create_series_mysql(self.pool.mysql()?, series).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Series>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_series_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_series_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn list(&self, params: &ListParams) -> Result<PagedResult<Series>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_series_sqlite(self.pool.sqlite()?, params).await,
            DatabaseDriver::Mysql => list_series_mysql(self.pool.mysql()?, params).await,
        }
    }

    async fn update(&self, series: &Series) -> Result<Series> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_series_sqlite(self.pool.sqlite()?, series).await,
            DatabaseDriver::Mysql => update_series_mysql(self.pool.mysql()?, series).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_series_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_series_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        Ok(self.get_by_id(id).await?.is_some())
    }

    async fn count_entries(&self, id: i64) -> Result<i64> {
        let sql = "SELECT COUNT(*) as count FROM entries WHERE series_id = ?";
        let count = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(id)
                .fetch_one(self.pool.sqlite()?)
                .await
                .context("Failed to count series entries")?
                .get("count"),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(id)
                .fetch_one(self.pool.mysql()?)
                .await
                .context("Failed to count series entries")?
                .get("count"),
        };
        Ok(count)
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_series_sqlite(pool: &SqlitePool, series: &Series) -> Result<Series> {
    let result = sqlx::query("INSERT INTO series (title, slug, description) VALUES (?, ?, ?)")
        .bind(&series.title)
        .bind(&series.slug)
        .bind(&series.description)
        .execute(pool)
        .await
        .context("Failed to create series")?;

    Ok(Series {
        id: result.last_insert_rowid(),
        ..series.clone()
    })
}

async fn get_series_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Series>> {
    let row = sqlx::query("SELECT id, title, slug, description FROM series WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get series by ID")?;

    Ok(row.map(|row| row_to_series_sqlite(&row)))
}

async fn list_series_sqlite(pool: &SqlitePool, params: &ListParams) -> Result<PagedResult<Series>> {
    let total: i64 = sqlx::query("SELECT COUNT(*) as count FROM series")
        .fetch_one(pool)
        .await
        .context("Failed to count series")?
        .get("count");

    let rows = sqlx::query(
        "SELECT id, title, slug, description FROM series ORDER BY title, id LIMIT ? OFFSET ?",
    )
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await
    .context("Failed to list series")?;

    let items = rows.iter().map(row_to_series_sqlite).collect();
    Ok(PagedResult::new(items, total, params))
}

async fn update_series_sqlite(pool: &SqlitePool, series: &Series) -> Result<Series> {
    sqlx::query("UPDATE series SET title = ?, slug = ?, description = ? WHERE id = ?")
        .bind(&series.title)
        .bind(&series.slug)
        .bind(&series.description)
        .bind(series.id)
        .execute(pool)
        .await
        .context("Failed to update series")?;

    Ok(series.clone())
}

async fn delete_series_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query("UPDATE entries SET series_id = NULL WHERE series_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to detach entries from series")?;

    sqlx::query("DELETE FROM series WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete series")?;

    tx.commit().await.context("Failed to commit series delete")?;
    Ok(())
}

fn row_to_series_sqlite(row: &sqlx::sqlite::SqliteRow) -> Series {
    Series {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        description: row.get("description"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_series_mysql(pool: &MySqlPool, series: &Series) -> Result<Series> {
    let result = sqlx::query("INSERT INTO series (title, slug, description) VALUES (?, ?, ?)")
        .bind(&series.title)
        .bind(&series.slug)
        .bind(&series.description)
        .execute(pool)
        .await
        .context("Failed to create series")?;

    Ok(Series {
        id: result.last_insert_id() as i64,
        ..series.clone()
    })
}

async fn get_series_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Series>> {
    let row = sqlx::query("SELECT id, title, slug, description FROM series WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get series by ID")?;

    Ok(row.map(|row| row_to_series_mysql(&row)))
}

async fn list_series_mysql(pool: &MySqlPool, params: &ListParams) -> Result<PagedResult<Series>> {
    let total: i64 = sqlx::query("SELECT COUNT(*) as count FROM series")
        .fetch_one(pool)
        .await
        .context("Failed to count series")?
        .get("count");

    let rows = sqlx::query(
        "SELECT id, title, slug, description FROM series ORDER BY title, id LIMIT ? OFFSET ?",
    )
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await
    .context("Failed to list series")?;

    let items = rows.iter().map(row_to_series_mysql).collect();
    Ok(PagedResult::new(items, total, params))
}

async fn update_series_mysql(pool: &MySqlPool, series: &Series) -> Result<Series> {
    sqlx::query("UPDATE series SET title = ?, slug = ?, description = ? WHERE id = ?")
        .bind(&series.title)
        .bind(&series.slug)
        .bind(&series.description)
        .bind(series.id)
        .execute(pool)
        .await
        .context("Failed to update series")?;

    Ok(series.clone())
}

async fn delete_series_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query("UPDATE entries SET series_id = NULL WHERE series_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to detach entries from series")?;

    sqlx::query("DELETE FROM series WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete series")?;

    tx.commit().await.context("Failed to commit series delete")?;
    Ok(())
}

fn row_to_series_mysql(row: &sqlx::mysql::MySqlRow) -> Series {
    Series {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        description: row.get("description"),
    }
}
