//! Database migrations module
//!
//! This module provides code-based database migrations for the weblog schema.
//! All migrations are embedded directly in Rust code as SQL strings, supporting
//! both SQLite and MySQL databases for single-binary deployment.
//!
//! # Usage
//!
//! ```ignore
//! use weblog::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```
//!
//! # Architecture
//!
//! Each migration is defined as a `Migration` struct containing:
//! - `version`: Unique version number for ordering
//! - `name`: Human-readable migration name
//! - `up_sqlite`: SQL for SQLite database
//! - `up_mysql`: SQL for MySQL database

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};

use super::DynDatabasePool;
use crate::config::DatabaseDriver;

/// A database migration with SQL for both SQLite and MySQL
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements for SQLite
    pub up_sqlite: &'static str,
    /// SQL statements for MySQL
    pub up_mysql: &'static str,
}

/// Migration record stored in the database
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    /// Migration version number
    pub version: i64,
    /// Migration name/description
    pub name: String,
    /// When the migration was applied
    pub applied_at: DateTime<Utc>,
}

/// All migrations for the weblog schema.
/// These are embedded in the binary for single-binary deployment.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_tags",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tag VARCHAR(50) NOT NULL UNIQUE
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS tags (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                tag VARCHAR(50) NOT NULL UNIQUE
            );
        "#,
    },
    Migration {
        version: 2,
        name: "create_series",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS series (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                slug VARCHAR(50) NOT NULL,
                description TEXT NOT NULL DEFAULT ''
            );
            CREATE INDEX IF NOT EXISTS idx_series_slug ON series(slug);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS series (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title TEXT NOT NULL,
                slug VARCHAR(50) NOT NULL,
                description TEXT NOT NULL
            );
            CREATE INDEX idx_series_slug ON series(slug);
        "#,
    },
    // Entries detach from a deleted series instead of being deleted with it
    Migration {
        version: 3,
        name: "create_entries",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created TIMESTAMP NOT NULL,
                slug VARCHAR(64) NOT NULL,
                title VARCHAR(255) NOT NULL DEFAULT '',
                body TEXT NOT NULL,
                tweet_html TEXT,
                extra_head_html TEXT,
                series_id INTEGER,
                FOREIGN KEY (series_id) REFERENCES series(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_entries_created ON entries(created);
            CREATE INDEX IF NOT EXISTS idx_entries_slug ON entries(slug);
            CREATE INDEX IF NOT EXISTS idx_entries_series_id ON entries(series_id);
            CREATE TABLE IF NOT EXISTS entry_tags (
                entry_id INTEGER NOT NULL,
                tag_id INTEGER NOT NULL,
                PRIMARY KEY (entry_id, tag_id),
                FOREIGN KEY (entry_id) REFERENCES entries(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_entry_tags_tag_id ON entry_tags(tag_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS entries (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                created DATETIME(6) NOT NULL,
                slug VARCHAR(64) NOT NULL,
                title VARCHAR(255) NOT NULL DEFAULT '',
                body LONGTEXT NOT NULL,
                tweet_html TEXT,
                extra_head_html TEXT,
                series_id BIGINT,
                FOREIGN KEY (series_id) REFERENCES series(id) ON DELETE SET NULL
            );
            CREATE INDEX idx_entries_created ON entries(created);
            CREATE INDEX idx_entries_slug ON entries(slug);
            CREATE TABLE IF NOT EXISTS entry_tags (
                entry_id BIGINT NOT NULL,
                tag_id BIGINT NOT NULL,
                PRIMARY KEY (entry_id, tag_id),
                FOREIGN KEY (entry_id) REFERENCES entries(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_entry_tags_tag_id ON entry_tags(tag_id);
        "#,
    },
    Migration {
        version: 4,
        name: "create_quotations",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS quotations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created TIMESTAMP NOT NULL,
                slug VARCHAR(64) NOT NULL,
                quotation TEXT NOT NULL,
                source VARCHAR(255) NOT NULL,
                source_url TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_quotations_created ON quotations(created);
            CREATE TABLE IF NOT EXISTS quotation_tags (
                quotation_id INTEGER NOT NULL,
                tag_id INTEGER NOT NULL,
                PRIMARY KEY (quotation_id, tag_id),
                FOREIGN KEY (quotation_id) REFERENCES quotations(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_quotation_tags_tag_id ON quotation_tags(tag_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS quotations (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                created DATETIME(6) NOT NULL,
                slug VARCHAR(64) NOT NULL,
                quotation TEXT NOT NULL,
                source VARCHAR(255) NOT NULL,
                source_url TEXT
            );
            CREATE INDEX idx_quotations_created ON quotations(created);
            CREATE TABLE IF NOT EXISTS quotation_tags (
                quotation_id BIGINT NOT NULL,
                tag_id BIGINT NOT NULL,
                PRIMARY KEY (quotation_id, tag_id),
                FOREIGN KEY (quotation_id) REFERENCES quotations(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_quotation_tags_tag_id ON quotation_tags(tag_id);
        "#,
    },
    Migration {
        version: 5,
        name: "create_blogmarks",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS blogmarks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created TIMESTAMP NOT NULL,
                slug VARCHAR(64) NOT NULL,
                link_url VARCHAR(1000) NOT NULL,
                link_title VARCHAR(255) NOT NULL,
                via_url VARCHAR(200),
                via_title VARCHAR(255),
                commentary TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_blogmarks_created ON blogmarks(created);
            CREATE TABLE IF NOT EXISTS blogmark_tags (
                blogmark_id INTEGER NOT NULL,
                tag_id INTEGER NOT NULL,
                PRIMARY KEY (blogmark_id, tag_id),
                FOREIGN KEY (blogmark_id) REFERENCES blogmarks(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_blogmark_tags_tag_id ON blogmark_tags(tag_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS blogmarks (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                created DATETIME(6) NOT NULL,
                slug VARCHAR(64) NOT NULL,
                link_url VARCHAR(1000) NOT NULL,
                link_title VARCHAR(255) NOT NULL,
                via_url VARCHAR(200),
                via_title VARCHAR(255),
                commentary TEXT NOT NULL
            );
            CREATE INDEX idx_blogmarks_created ON blogmarks(created);
            CREATE TABLE IF NOT EXISTS blogmark_tags (
                blogmark_id BIGINT NOT NULL,
                tag_id BIGINT NOT NULL,
                PRIMARY KEY (blogmark_id, tag_id),
                FOREIGN KEY (blogmark_id) REFERENCES blogmarks(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_blogmark_tags_tag_id ON blogmark_tags(tag_id);
        "#,
    },
    Migration {
        version: 6,
        name: "create_photos",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS photos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created TIMESTAMP NOT NULL,
                slug VARCHAR(64) NOT NULL,
                photo VARCHAR(255) NOT NULL,
                title TEXT NOT NULL DEFAULT ''
            );
            CREATE INDEX IF NOT EXISTS idx_photos_created ON photos(created);
            CREATE TABLE IF NOT EXISTS photo_tags (
                photo_id INTEGER NOT NULL,
                tag_id INTEGER NOT NULL,
                PRIMARY KEY (photo_id, tag_id),
                FOREIGN KEY (photo_id) REFERENCES photos(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_photo_tags_tag_id ON photo_tags(tag_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS photos (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                created DATETIME(6) NOT NULL,
                slug VARCHAR(64) NOT NULL,
                photo VARCHAR(255) NOT NULL,
                title TEXT NOT NULL
            );
            CREATE INDEX idx_photos_created ON photos(created);
            CREATE TABLE IF NOT EXISTS photo_tags (
                photo_id BIGINT NOT NULL,
                tag_id BIGINT NOT NULL,
                PRIMARY KEY (photo_id, tag_id),
                FOREIGN KEY (photo_id) REFERENCES photos(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_photo_tags_tag_id ON photo_tags(tag_id);
        "#,
    },
];

/// Run all pending migrations
///
/// This function:
/// 1. Creates the migrations tracking table if it doesn't exist
/// 2. Checks which migrations have already been applied
/// 3. Runs any pending migrations in order
///
/// # Arguments
///
/// * `pool` - Database connection pool
///
/// # Returns
///
/// Number of migrations applied
///
/// # Errors
///
/// Returns an error if any migration fails to apply
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    // Create migrations table
    create_migrations_table(pool).await?;

    // Get applied migrations
    let applied = get_applied_migrations(pool).await?;
    let applied_versions: Vec<i32> = applied.iter().map(|m| m.version as i32).collect();

    let mut count = 0;

    for migration in MIGRATIONS {
        if !applied_versions.contains(&migration.version) {
            tracing::info!(
                "Applying migration {}: {}",
                migration.version,
                migration.name
            );
            apply_migration(pool, migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

/// Create the migrations tracking table if it doesn't exist
async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
        DatabaseDriver::Mysql => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INT PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
    };

    pool.execute(sql).await?;
    Ok(())
}

/// Get list of already applied migrations
async fn get_applied_migrations(pool: &DynDatabasePool) -> Result<Vec<MigrationRecord>> {
    match pool.driver() {
        DatabaseDriver::Sqlite => get_applied_migrations_sqlite(pool.sqlite()?).await,
        DatabaseDriver::Mysql => get_applied_migrations_mysql(pool.mysql()?).await,
    }
}

async fn get_applied_migrations_sqlite(pool: &SqlitePool) -> Result<Vec<MigrationRecord>> {
    let rows =
        sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
            .fetch_all(pool)
            .await?;

    let mut records = Vec::new();
    for row in rows {
        records.push(MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        });
    }

    Ok(records)
}

async fn get_applied_migrations_mysql(pool: &MySqlPool) -> Result<Vec<MigrationRecord>> {
    let rows =
        sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
            .fetch_all(pool)
            .await?;

    let mut records = Vec::new();
    for row in rows {
        records.push(MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        });
    }

    Ok(records)
}

/// Apply a single migration
async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    match pool.driver() {
        DatabaseDriver::Sqlite => {
            apply_migration_sqlite(pool.sqlite()?, migration).await
        }
        DatabaseDriver::Mysql => {
            apply_migration_mysql(pool.mysql()?, migration).await
        }
    }
}

async fn apply_migration_sqlite(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    // Execute migration SQL (may contain multiple statements)
    for statement in split_sql_statements(migration.up_sqlite) {
        let statement = statement.trim();
        if !statement.is_empty() {
            sqlx::query(statement)
                .execute(pool)
                .await
                .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
        }
    }

    // Record the migration
    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}

async fn apply_migration_mysql(pool: &MySqlPool, migration: &Migration) -> Result<()> {
    // Execute migration SQL (may contain multiple statements)
    for statement in split_sql_statements(migration.up_mysql) {
        let statement = statement.trim();
        if !statement.is_empty() {
            sqlx::query(statement)
                .execute(pool)
                .await
                .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
        }
    }

    // Record the migration
    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    if sql.len() > 100 {
        format!("{}...", &sql[..100])
    } else {
        sql.to_string()
    }
}

/// Split SQL into individual statements, handling comments properly
fn split_sql_statements(sql: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut current_start = 0;
    let mut in_statement = false;

    for (i, c) in sql.char_indices() {
        match c {
            ';' => {
                if in_statement {
                    let stmt = sql[current_start..i].trim();
                    if !stmt.is_empty() && !is_comment_only(stmt) {
                        statements.push(stmt);
                    }
                    in_statement = false;
                }
                current_start = i + 1;
            }
            _ if !c.is_whitespace() && !in_statement => {
                current_start = i;
                in_statement = true;
            }
            _ => {}
        }
    }

    // Handle last statement without trailing semicolon
    if in_statement {
        let stmt = sql[current_start..].trim();
        if !stmt.is_empty() && !is_comment_only(stmt) {
            statements.push(stmt);
        }
    }

    statements
}

/// Check if a string contains only SQL comments
fn is_comment_only(s: &str) -> bool {
    for line in s.lines() {
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with("--") {
            return false;
        }
    }
    true
}
