//! Tag repository
//!
//! Database operations for tags and for the join tables linking tags to
//! content records.
//!
//! This module provides:
//! - `TagRepository` trait defining the interface for tag data access
//! - `SqlxTagRepository` implementing the trait for SQLite and MySQL
//! - link helpers used by the content repositories inside their transactions

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ListParams, PagedResult, Tag};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlConnection, MySqlPool, Row, SqliteConnection, SqlitePool};
use std::sync::Arc;

use super::listing::{contains_pattern, TaggedTable};

/// Tag repository trait
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Create a new tag
    async fn create(&self, tag: &Tag) -> Result<Tag>;

    /// Get tag by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Tag>>;

    /// Get tag by its value
    async fn get_by_tag(&self, tag: &str) -> Result<Option<Tag>>;

    /// List tags alphabetically
    async fn list(&self, params: &ListParams) -> Result<PagedResult<Tag>>;

    /// One page of the tags containing `term` (case-insensitive), shortest
    /// first. `total` counts every match.
    ///
    /// Ties are broken alphabetically; no other ranking is applied.
    async fn search(&self, term: &str, params: &ListParams) -> Result<PagedResult<Tag>>;

    /// Rename a tag
    async fn update(&self, tag: &Tag) -> Result<Tag>;

    /// Delete a tag and its links; tagged records are kept
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based tag repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxTagRepository {
    pool: DynDatabasePool,
}

impl SqlxTagRepository {
    /// Create a new SQLx tag repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TagRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TagRepository for SqlxTagRepository {
    async fn create(&self, tag: &Tag) -> Result<Tag> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_tag_sqlite(self.pool.sqlite()?, tag).await,
            DatabaseDriver::Mysql => create_tag_mysql(self.pool.mysql()?, tag).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_tag_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_tag_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn get_by_tag(&self, tag: &str) -> Result<Option<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_tag_by_value_sqlite(self.pool.sqlite()?, tag).await,
            DatabaseDriver::Mysql => get_tag_by_value_mysql(self.pool.mysql()?, tag).await,
        }
    }

    async fn list(&self, params: &ListParams) -> Result<PagedResult<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_tags_sqlite(self.pool.sqlite()?, params).await,
            DatabaseDriver::Mysql => list_tags_mysql(self.pool.mysql()?, params).await,
        }
    }

    async fn search(&self, term: &str, params: &ListParams) -> Result<PagedResult<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => search_tags_sqlite(self.pool.sqlite()?, term, params).await,
            DatabaseDriver::Mysql => search_tags_mysql(self.pool.mysql()?, term, params).await,
        }
    }

    async fn update(&self, tag: &Tag) -> Result<Tag> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_tag_sqlite(self.pool.sqlite()?, tag).await,
            DatabaseDriver::Mysql => update_tag_mysql(self.pool.mysql()?, tag).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_tag_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_tag_mysql(self.pool.mysql()?, id).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_tag_sqlite(pool: &SqlitePool, tag: &Tag) -> Result<Tag> {
    let result = sqlx::query("INSERT INTO tags (tag) VALUES (?)")
        .bind(&tag.tag)
        .execute(pool)
        .await
        .context("Failed to create tag")?;

    Ok(Tag {
        id: result.last_insert_rowid(),
        tag: tag.tag.clone(),
    })
}

async fn get_tag_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Tag>> {
    let row = sqlx::query("SELECT id, tag FROM tags WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get tag by ID")?;

    Ok(row.map(|row| row_to_tag_sqlite(&row)))
}

async fn get_tag_by_value_sqlite(pool: &SqlitePool, tag: &str) -> Result<Option<Tag>> {
    let row = sqlx::query("SELECT id, tag FROM tags WHERE tag = ?")
        .bind(tag)
        .fetch_optional(pool)
        .await
        .context("Failed to get tag by value")?;

    Ok(row.map(|row| row_to_tag_sqlite(&row)))
}

async fn list_tags_sqlite(pool: &SqlitePool, params: &ListParams) -> Result<PagedResult<Tag>> {
    let total: i64 = sqlx::query("SELECT COUNT(*) as count FROM tags")
        .fetch_one(pool)
        .await
        .context("Failed to count tags")?
        .get("count");

    let rows = sqlx::query("SELECT id, tag FROM tags ORDER BY tag LIMIT ? OFFSET ?")
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list tags")?;

    let tags = rows.iter().map(row_to_tag_sqlite).collect();
    Ok(PagedResult::new(tags, total, params))
}

async fn search_tags_sqlite(
    pool: &SqlitePool,
    term: &str,
    params: &ListParams,
) -> Result<PagedResult<Tag>> {
    let pattern = contains_pattern(term);

    let total: i64 = sqlx::query(
        "SELECT COUNT(*) as count FROM tags WHERE LOWER(tag) LIKE ? ESCAPE '!'",
    )
    .bind(&pattern)
    .fetch_one(pool)
    .await
    .context("Failed to count matching tags")?
    .get("count");

    let rows = sqlx::query(
        r#"
        SELECT id, tag
        FROM tags
        WHERE LOWER(tag) LIKE ? ESCAPE '!'
        ORDER BY LENGTH(tag) ASC, tag ASC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(&pattern)
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await
    .context("Failed to search tags")?;

    let tags = rows.iter().map(row_to_tag_sqlite).collect();
    Ok(PagedResult::new(tags, total, params))
}

async fn update_tag_sqlite(pool: &SqlitePool, tag: &Tag) -> Result<Tag> {
    sqlx::query("UPDATE tags SET tag = ? WHERE id = ?")
        .bind(&tag.tag)
        .bind(tag.id)
        .execute(pool)
        .await
        .context("Failed to update tag")?;

    Ok(tag.clone())
}

async fn delete_tag_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    // Links are removed by ON DELETE CASCADE
    sqlx::query("DELETE FROM tags WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete tag")?;

    Ok(())
}

/// Tags linked to one record, ordered by value
pub async fn tags_for_sqlite(pool: &SqlitePool, table: TaggedTable, owner_id: i64) -> Result<Vec<Tag>> {
    let sql = format!(
        "SELECT t.id, t.tag FROM tags t JOIN {join} ct ON ct.tag_id = t.id \
         WHERE ct.{owner} = ? ORDER BY t.tag",
        join = table.join_table(),
        owner = table.owner_column(),
    );
    let rows = sqlx::query(&sql)
        .bind(owner_id)
        .fetch_all(pool)
        .await
        .with_context(|| format!("Failed to load tags for {}", table.table()))?;

    Ok(rows.iter().map(row_to_tag_sqlite).collect())
}

/// Replace the tag set of one record
pub async fn replace_tags_sqlite(
    conn: &mut SqliteConnection,
    table: TaggedTable,
    owner_id: i64,
    tag_ids: &[i64],
) -> Result<()> {
    let delete_sql = format!(
        "DELETE FROM {} WHERE {} = ?",
        table.join_table(),
        table.owner_column()
    );
    sqlx::query(&delete_sql)
        .bind(owner_id)
        .execute(&mut *conn)
        .await
        .with_context(|| format!("Failed to clear tags for {}", table.table()))?;

    let insert_sql = format!(
        "INSERT OR IGNORE INTO {} ({}, tag_id) VALUES (?, ?)",
        table.join_table(),
        table.owner_column()
    );
    for tag_id in tag_ids {
        sqlx::query(&insert_sql)
            .bind(owner_id)
            .bind(tag_id)
            .execute(&mut *conn)
            .await
            .with_context(|| format!("Failed to link tag {} to {}", tag_id, table.table()))?;
    }

    Ok(())
}

fn row_to_tag_sqlite(row: &sqlx::sqlite::SqliteRow) -> Tag {
    Tag {
        id: row.get("id"),
        tag: row.get("tag"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_tag_mysql(pool: &MySqlPool, tag: &Tag) -> Result<Tag> {
    let result = sqlx::query("INSERT INTO tags (tag) VALUES (?)")
        .bind(&tag.tag)
        .execute(pool)
        .await
        .context("Failed to create tag")?;

    Ok(Tag {
        id: result.last_insert_id() as i64,
        tag: tag.tag.clone(),
    })
}

async fn get_tag_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Tag>> {
    let row = sqlx::query("SELECT id, tag FROM tags WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get tag by ID")?;

    Ok(row.map(|row| row_to_tag_mysql(&row)))
}

async fn get_tag_by_value_mysql(pool: &MySqlPool, tag: &str) -> Result<Option<Tag>> {
    let row = sqlx::query("SELECT id, tag FROM tags WHERE tag = ?")
        .bind(tag)
        .fetch_optional(pool)
        .await
        .context("Failed to get tag by value")?;

    Ok(row.map(|row| row_to_tag_mysql(&row)))
}

async fn list_tags_mysql(pool: &MySqlPool, params: &ListParams) -> Result<PagedResult<Tag>> {
    let total: i64 = sqlx::query("SELECT COUNT(*) as count FROM tags")
        .fetch_one(pool)
        .await
        .context("Failed to count tags")?
        .get("count");

    let rows = sqlx::query("SELECT id, tag FROM tags ORDER BY tag LIMIT ? OFFSET ?")
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list tags")?;

    let tags = rows.iter().map(row_to_tag_mysql).collect();
    Ok(PagedResult::new(tags, total, params))
}

async fn search_tags_mysql(
    pool: &MySqlPool,
    term: &str,
    params: &ListParams,
) -> Result<PagedResult<Tag>> {
    let pattern = contains_pattern(term);

    let total: i64 = sqlx::query(
        "SELECT COUNT(*) as count FROM tags WHERE LOWER(tag) LIKE ? ESCAPE '!'",
    )
    .bind(&pattern)
    .fetch_one(pool)
    .await
    .context("Failed to count matching tags")?
    .get("count");

    let rows = sqlx::query(
        r#"
        SELECT id, tag
        FROM tags
        WHERE LOWER(tag) LIKE ? ESCAPE '!'
        ORDER BY CHAR_LENGTH(tag) ASC, tag ASC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(&pattern)
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await
    .context("Failed to search tags")?;

    let tags = rows.iter().map(row_to_tag_mysql).collect();
    Ok(PagedResult::new(tags, total, params))
}

async fn update_tag_mysql(pool: &MySqlPool, tag: &Tag) -> Result<Tag> {
    sqlx::query("UPDATE tags SET tag = ? WHERE id = ?")
        .bind(&tag.tag)
        .bind(tag.id)
        .execute(pool)
        .await
        .context("Failed to update tag")?;

    Ok(tag.clone())
}

async fn delete_tag_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM tags WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete tag")?;

    Ok(())
}

pub async fn tags_for_mysql(pool: &MySqlPool, table: TaggedTable, owner_id: i64) -> Result<Vec<Tag>> {
    let sql = format!(
        "SELECT t.id, t.tag FROM tags t JOIN {join} ct ON ct.tag_id = t.id \
         WHERE ct.{owner} = ? ORDER BY t.tag",
        join = table.join_table(),
        owner = table.owner_column(),
    );
    let rows = sqlx::query(&sql)
        .bind(owner_id)
        .fetch_all(pool)
        .await
        .with_context(|| format!("Failed to load tags for {}", table.table()))?;

    Ok(rows.iter().map(row_to_tag_mysql).collect())
}

pub async fn replace_tags_mysql(
    conn: &mut MySqlConnection,
    table: TaggedTable,
    owner_id: i64,
    tag_ids: &[i64],
) -> Result<()> {
    let delete_sql = format!(
        "DELETE FROM {} WHERE {} = ?",
        table.join_table(),
        table.owner_column()
    );
    sqlx::query(&delete_sql)
        .bind(owner_id)
        .execute(&mut *conn)
        .await
        .with_context(|| format!("Failed to clear tags for {}", table.table()))?;

    let insert_sql = format!(
        "INSERT IGNORE INTO {} ({}, tag_id) VALUES (?, ?)",
        table.join_table(),
        table.owner_column()
    );
    for tag_id in tag_ids {
        sqlx::query(&insert_sql)
            .bind(owner_id)
            .bind(tag_id)
            .execute(&mut *conn)
            .await
            .with_context(|| format!("Failed to link tag {} to {}", tag_id, table.table()))?;
    }

    Ok(())
}

fn row_to_tag_mysql(row: &sqlx::mysql::MySqlRow) -> Tag {
    Tag {
        id: row.get("id"),
        tag: row.get("tag"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxTagRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxTagRepository::new(pool.clone());
        (pool, repo)
    }

    async fn create_tags(repo: &SqlxTagRepository, values: &[&str]) {
        for value in values {
            repo.create(&Tag::new(value.to_string()))
                .await
                .expect("Failed to create tag");
        }
    }

    #[tokio::test]
    async fn test_create_tag() {
        let (_pool, repo) = setup_test_repo().await;

        let created = repo
            .create(&Tag::new("rust".to_string()))
            .await
            .expect("Failed to create tag");

        assert!(created.id > 0);
        assert_eq!(created.tag, "rust");
    }

    #[tokio::test]
    async fn test_create_duplicate_tag_fails() {
        let (_pool, repo) = setup_test_repo().await;
        create_tags(&repo, &["rust"]).await;

        let result = repo.create(&Tag::new("rust".to_string())).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_get_tag_by_id_and_value() {
        let (_pool, repo) = setup_test_repo().await;
        let created = repo
            .create(&Tag::new("datasette".to_string()))
            .await
            .expect("Failed to create tag");

        let by_id = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get tag")
            .expect("Tag not found");
        assert_eq!(by_id, created);

        let by_value = repo
            .get_by_tag("datasette")
            .await
            .expect("Failed to get tag")
            .expect("Tag not found");
        assert_eq!(by_value, created);

        assert!(repo.get_by_id(99999).await.expect("Failed to get tag").is_none());
        assert!(repo.get_by_tag("missing").await.expect("Failed to get tag").is_none());
    }

    #[tokio::test]
    async fn test_list_tags_ordered_and_paged() {
        let (_pool, repo) = setup_test_repo().await;
        create_tags(&repo, &["zebra", "apple", "mango"]).await;

        let page = repo
            .list(&ListParams::new(1, 2))
            .await
            .expect("Failed to list tags");

        assert_eq!(page.total, 3);
        let values: Vec<&str> = page.items.iter().map(|t| t.tag.as_str()).collect();
        assert_eq!(values, vec!["apple", "mango"]);

        let page = repo
            .list(&ListParams::new(2, 2))
            .await
            .expect("Failed to list tags");
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].tag, "zebra");
    }

    #[tokio::test]
    async fn test_search_orders_by_length() {
        let (_pool, repo) = setup_test_repo().await;
        create_tags(&repo, &["javascript", "java", "ajax", "python", "java-se"]).await;

        let results = repo
            .search("java", &ListParams::default())
            .await
            .expect("Failed to search")
            .items;

        let values: Vec<&str> = results.iter().map(|t| t.tag.as_str()).collect();
        assert_eq!(values, vec!["java", "java-se", "javascript"]);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let (_pool, repo) = setup_test_repo().await;
        create_tags(&repo, &["SQLite", "postgresql", "mysql"]).await;

        let results = repo
            .search("SQL", &ListParams::default())
            .await
            .expect("Failed to search")
            .items;

        let values: Vec<&str> = results.iter().map(|t| t.tag.as_str()).collect();
        assert_eq!(values, vec!["mysql", "SQLite", "postgresql"]);
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let (_pool, repo) = setup_test_repo().await;
        create_tags(&repo, &["snake_case", "snakecase", "snake-case"]).await;

        let results = repo
            .search("e_c", &ListParams::default())
            .await
            .expect("Failed to search")
            .items;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].tag, "snake_case");
    }

    #[tokio::test]
    async fn test_search_pages_ranked_results() {
        let (_pool, repo) = setup_test_repo().await;
        create_tags(&repo, &["a1", "a22", "a333", "b4444", "a55555"]).await;

        let first = repo
            .search("a", &ListParams::new(1, 2))
            .await
            .expect("Failed to search");
        assert_eq!(first.total, 4);
        assert_eq!(first.total_pages(), 2);
        let values: Vec<&str> = first.items.iter().map(|t| t.tag.as_str()).collect();
        assert_eq!(values, vec!["a1", "a22"]);

        let second = repo
            .search("a", &ListParams::new(2, 2))
            .await
            .expect("Failed to search");
        assert_eq!(second.total, 4);
        let values: Vec<&str> = second.items.iter().map(|t| t.tag.as_str()).collect();
        assert_eq!(values, vec!["a333", "a55555"]);
    }

    #[tokio::test]
    async fn test_update_tag() {
        let (_pool, repo) = setup_test_repo().await;
        let mut tag = repo
            .create(&Tag::new("old".to_string()))
            .await
            .expect("Failed to create tag");

        tag.tag = "new".to_string();
        repo.update(&tag).await.expect("Failed to update tag");

        let found = repo.get_by_id(tag.id).await.unwrap().unwrap();
        assert_eq!(found.tag, "new");
    }

    #[tokio::test]
    async fn test_delete_tag_keeps_records() {
        let (pool, repo) = setup_test_repo().await;
        let sqlite_pool = pool.as_sqlite().unwrap();
        let tag = repo
            .create(&Tag::new("gone".to_string()))
            .await
            .expect("Failed to create tag");

        sqlx::query("INSERT INTO photos (created, slug, photo) VALUES (?, 'p', 'photos/x.jpg')")
            .bind(chrono::Utc::now())
            .execute(sqlite_pool)
            .await
            .unwrap();
        let mut conn = sqlite_pool.acquire().await.unwrap();
        replace_tags_sqlite(&mut conn, TaggedTable::Photos, 1, &[tag.id])
            .await
            .expect("Failed to link tag");
        drop(conn);

        repo.delete(tag.id).await.expect("Failed to delete tag");

        assert!(repo.get_by_id(tag.id).await.unwrap().is_none());
        let photos: i64 = sqlx::query("SELECT COUNT(*) as count FROM photos")
            .fetch_one(sqlite_pool)
            .await
            .unwrap()
            .get("count");
        assert_eq!(photos, 1);
        let tags = tags_for_sqlite(sqlite_pool, TaggedTable::Photos, 1).await.unwrap();
        assert!(tags.is_empty());
    }

    #[tokio::test]
    async fn test_replace_tags() {
        let (pool, repo) = setup_test_repo().await;
        let sqlite_pool = pool.as_sqlite().unwrap();
        create_tags(&repo, &["b", "a", "c"]).await;

        sqlx::query(
            "INSERT INTO quotations (created, slug, quotation, source) VALUES (?, 'q', 'Q', 'S')",
        )
        .bind(chrono::Utc::now())
        .execute(sqlite_pool)
        .await
        .unwrap();

        let mut conn = sqlite_pool.acquire().await.unwrap();
        replace_tags_sqlite(&mut conn, TaggedTable::Quotations, 1, &[1, 2, 2])
            .await
            .expect("Failed to link tags");
        let tags = tags_for_sqlite(sqlite_pool, TaggedTable::Quotations, 1).await.unwrap();
        let values: Vec<&str> = tags.iter().map(|t| t.tag.as_str()).collect();
        assert_eq!(values, vec!["a", "b"]);

        replace_tags_sqlite(&mut conn, TaggedTable::Quotations, 1, &[3])
            .await
            .expect("Failed to relink tags");
        let tags = tags_for_sqlite(sqlite_pool, TaggedTable::Quotations, 1).await.unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].tag, "c");
    }
}
