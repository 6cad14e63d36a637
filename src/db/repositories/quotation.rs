//! Quotation repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ContentFilter, ContentMeta, ListParams, PagedResult, Quotation};
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

const TAGGED: TaggedTable = TaggedTable::Quotations;

pub const QUOTATION_SEARCH: SearchFields = SearchFields {
    tagged: TAGGED,
    columns: &["quotation"],
};

const COLUMNS: &str = "c.id, c.created, c.slug, c.quotation, c.source, c.source_url";

/// Quotation repository trait
#[async_trait]
pub trait QuotationRepository: Send + Sync {
    async fn create(&self, quotation: &Quotation) -> Result<Quotation>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Quotation>>;

    async fn list(
        &self,
        filter: &ContentFilter,
        params: &ListParams,
    ) -> Result<PagedResult<Quotation>>;

    async fn created_dates(&self, filter: &ContentFilter) -> Result<Vec<DateTime<Utc>>>;

    async fn update(&self, quotation: &Quotation) -> Result<Quotation>;

    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based quotation repository implementation
pub struct SqlxQuotationRepository {
    pool: DynDatabasePool,
}

impl SqlxQuotationRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn QuotationRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl QuotationRepository for SqlxQuotationRepository {
    async fn create(&self, quotation: &Quotation) -> Result<Quotation> {
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => create_quotation_sqlite(self.pool.sqlite()?, quotation).await?,
            DatabaseDriver::Mysql => create_quotation_mysql(self.pool.mysql()?, quotation).await?,
        };
        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow!("Quotation {} missing after insert", id))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Quotation>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_quotation_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_quotation_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn list(
        &self,
        filter: &ContentFilter,
        params: &ListParams,
    ) -> Result<PagedResult<Quotation>> {
        let clause = WhereClause::for_filter(&QUOTATION_SEARCH, filter)?;
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_quotations_sqlite(self.pool.sqlite()?, &clause, params).await
            }
            DatabaseDriver::Mysql => list_quotations_mysql(self.pool.mysql()?, &clause, params).await,
        }
    }

    async fn created_dates(&self, filter: &ContentFilter) -> Result<Vec<DateTime<Utc>>> {
        let clause = WhereClause::for_filter(&QUOTATION_SEARCH, filter)?;
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                fetch_created_sqlite(self.pool.sqlite()?, TAGGED.table(), &clause).await
            }
            DatabaseDriver::Mysql => {
                fetch_created_mysql(self.pool.mysql()?, TAGGED.table(), &clause).await
            }
        }
    }

    async fn update(&self, quotation: &Quotation) -> Result<Quotation> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_quotation_sqlite(self.pool.sqlite()?, quotation).await?,
            DatabaseDriver::Mysql => update_quotation_mysql(self.pool.mysql()?, quotation).await?,
        }
        self.get_by_id(quotation.id)
            .await?
            .ok_or_else(|| anyhow!("Quotation {} not found", quotation.id))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let sql = "DELETE FROM quotations WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to delete quotation")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to delete quotation")?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_quotation_sqlite(pool: &SqlitePool, quotation: &Quotation) -> Result<i64> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        "INSERT INTO quotations (created, slug, quotation, source, source_url) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(quotation.meta.created)
    .bind(&quotation.meta.slug)
    .bind(&quotation.quotation)
    .bind(&quotation.source)
    .bind(&quotation.source_url)
    .execute(&mut *tx)
    .await
    .context("Failed to create quotation")?;

    let id = result.last_insert_rowid();
    replace_tags_sqlite(&mut tx, TAGGED, id, &quotation.meta.tag_ids()).await?;

    tx.commit().await.context("Failed to commit quotation")?;
    Ok(id)
}

async fn get_quotation_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Quotation>> {
    let sql = format!("SELECT {} FROM quotations c WHERE c.id = ?", COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get quotation by ID")?;

    match row {
        Some(row) => {
            let mut quotation = row_to_quotation_sqlite(&row);
            quotation.meta.tags = tags_for_sqlite(pool, TAGGED, quotation.id).await?;
            Ok(Some(quotation))
        }
        None => Ok(None),
    }
}

async fn list_quotations_sqlite(
    pool: &SqlitePool,
    clause: &WhereClause,
    params: &ListParams,
) -> Result<PagedResult<Quotation>> {
    let (rows, total) = fetch_page_sqlite(pool, TAGGED.table(), COLUMNS, clause, params).await?;

    let mut quotations = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut quotation = row_to_quotation_sqlite(row);
        quotation.meta.tags = tags_for_sqlite(pool, TAGGED, quotation.id).await?;
        quotations.push(quotation);
    }

    Ok(PagedResult::new(quotations, total, params))
}

async fn update_quotation_sqlite(pool: &SqlitePool, quotation: &Quotation) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query(
        "UPDATE quotations SET created = ?, slug = ?, quotation = ?, source = ?, source_url = ? WHERE id = ?",
    )
    .bind(quotation.meta.created)
    .bind(&quotation.meta.slug)
    .bind(&quotation.quotation)
    .bind(&quotation.source)
    .bind(&quotation.source_url)
    .bind(quotation.id)
    .execute(&mut *tx)
    .await
    .context("Failed to update quotation")?;

    replace_tags_sqlite(&mut tx, TAGGED, quotation.id, &quotation.meta.tag_ids()).await?;

    tx.commit().await.context("Failed to commit quotation")?;
    Ok(())
}

fn row_to_quotation_sqlite(row: &sqlx::sqlite::SqliteRow) -> Quotation {
    Quotation {
        id: row.get("id"),
        meta: ContentMeta {
            created: row.get("created"),
            slug: row.get("slug"),
            tags: Vec::new(),
        },
        quotation: row.get("quotation"),
        source: row.get("source"),
        source_url: row.get("source_url"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_quotation_mysql(pool: &MySqlPool, quotation: &Quotation) -> Result<i64> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        "INSERT INTO quotations (created, slug, quotation, source, source_url) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(quotation.meta.created)
    .bind(&quotation.meta.slug)
    .bind(&quotation.quotation)
    .bind(&quotation.source)
    .bind(&quotation.source_url)
    .execute(&mut *tx)
    .await
    .context("Failed to create quotation")?;

    let id = result.last_insert_id() as i64;
    replace_tags_mysql(&mut tx, TAGGED, id, &quotation.meta.tag_ids()).await?;

    tx.commit().await.context("Failed to commit quotation")?;
    Ok(id)
}

async fn get_quotation_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Quotation>> {
    let sql = format!("SELECT {} FROM quotations c WHERE c.id = ?", COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get quotation by ID")?;

    match row {
        Some(row) => {
            let mut quotation = row_to_quotation_mysql(&row);
            quotation.meta.tags = tags_for_mysql(pool, TAGGED, quotation.id).await?;
            Ok(Some(quotation))
        }
        None => Ok(None),
    }
}

async fn list_quotations_mysql(
    pool: &MySqlPool,
    clause: &WhereClause,
    params: &ListParams,
) -> Result<PagedResult<Quotation>> {
    let (rows, total) = fetch_page_mysql(pool, TAGGED.table(), COLUMNS, clause, params).await?;

    let mut quotations = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut quotation = row_to_quotation_mysql(row);
        quotation.meta.tags = tags_for_mysql(pool, TAGGED, quotation.id).await?;
        quotations.push(quotation);
    }

    Ok(PagedResult::new(quotations, total, params))
}

async fn update_quotation_mysql(pool: &MySqlPool, quotation: &Quotation) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query(
        "UPDATE quotations SET created = ?, slug = ?, quotation = ?, source = ?, source_url = ? WHERE id = ?",
    )
    .bind(quotation.meta.created)
    .bind(&quotation.meta.slug)
    .bind(&quotation.quotation)
    .bind(&quotation.source)
    .bind(&quotation.source_url)
    .bind(quotation.id)
    .execute(&mut *tx)
    .await
    .context("Failed to update quotation")?;

    replace_tags_mysql(&mut tx, TAGGED, quotation.id, &quotation.meta.tag_ids()).await?;

    tx.commit().await.context("Failed to commit quotation")?;
    Ok(())
}

fn row_to_quotation_mysql(row: &sqlx::mysql::MySqlRow) -> Quotation {
    Quotation {
        id: row.get("id"),
        meta: ContentMeta {
            created: row.get("created"),
            slug: row.get("slug"),
            tags: Vec::new(),
        },
        quotation: row.get("quotation"),
        source: row.get("source"),
        source_url: row.get("source_url"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxTagRepository, TagRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::Tag;

    async fn setup() -> (SqlxQuotationRepository, SqlxTagRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        (
            SqlxQuotationRepository::new(pool.clone()),
            SqlxTagRepository::new(pool),
        )
    }

    fn quotation(text: &str, source: &str) -> Quotation {
        Quotation {
            id: 0,
            meta: ContentMeta::new("q".to_string()),
            quotation: text.to_string(),
            source: source.to_string(),
            source_url: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_quotation() {
        let (repo, tags) = setup().await;
        let tag = tags.create(&Tag::new("quotes".to_string())).await.unwrap();

        let mut input = quotation("Simple is better", "Tim");
        input.source_url = Some("https://example.com/".to_string());
        input.meta.tags = vec![tag];
        let created = repo.create(&input).await.expect("Failed to create quotation");

        let found = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found.quotation, "Simple is better");
        assert_eq!(found.source_url.as_deref(), Some("https://example.com/"));
        assert_eq!(found.meta.tags.len(), 1);
    }

    #[tokio::test]
    async fn test_search_only_looks_at_quotation_text_and_tags() {
        let (repo, _tags) = setup().await;
        repo.create(&quotation("Readability counts", "Zen")).await.unwrap();
        repo.create(&quotation("Nothing here", "Readability author")).await.unwrap();

        let filter = ContentFilter {
            q: Some("readability".to_string()),
            ..Default::default()
        };
        let page = repo.list(&filter, &ListParams::default()).await.unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].source, "Zen");
    }

    #[tokio::test]
    async fn test_update_clears_source_url() {
        let (repo, _tags) = setup().await;
        let mut input = quotation("Q", "S");
        input.source_url = Some("https://example.com/".to_string());
        let mut created = repo.create(&input).await.unwrap();

        created.source_url = None;
        let updated = repo.update(&created).await.unwrap();

        assert_eq!(updated.source_url, None);
    }

    #[tokio::test]
    async fn test_delete_quotation() {
        let (repo, _tags) = setup().await;
        let created = repo.create(&quotation("Q", "S")).await.unwrap();

        repo.delete(created.id).await.unwrap();

        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }
}
