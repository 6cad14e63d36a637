//! Changelist query building shared by the content repositories
//!
//! Every content table is queried under the alias `c`. A [`WhereClause`]
//! combines the optional `created` range with the search words: each word
//! must match (case-insensitive substring) one of the model's search columns
//! or one of the record's tags.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::mysql::{MySqlArguments, MySqlRow};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{MySql, MySqlPool, Row, Sqlite, SqlitePool};

use crate::models::{ContentFilter, ListParams};

/// Escape character used in every LIKE clause
const LIKE_ESCAPE: char = '!';

/// Build a lowercased `%term%` LIKE pattern matching `term` literally.
///
/// Only ASCII letters are lowered, the same as SQLite's `LOWER`, so the
/// pattern and the `LOWER(column)` it is compared with fold identically.
/// Non-ASCII letters therefore match case-sensitively on SQLite; MySQL's
/// case-insensitive collations fold them anyway.
pub fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars().map(|c| c.to_ascii_lowercase()) {
        if c == '%' || c == '_' || c == LIKE_ESCAPE {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Content tables that carry a tag join table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaggedTable {
    Entries,
    Quotations,
    Blogmarks,
    Photos,
}

impl TaggedTable {
    /// The content table itself
    pub fn table(self) -> &'static str {
        match self {
            Self::Entries => "entries",
            Self::Quotations => "quotations",
            Self::Blogmarks => "blogmarks",
            Self::Photos => "photos",
        }
    }

    /// Join table linking records to tags
    pub fn join_table(self) -> &'static str {
        match self {
            Self::Entries => "entry_tags",
            Self::Quotations => "quotation_tags",
            Self::Blogmarks => "blogmark_tags",
            Self::Photos => "photo_tags",
        }
    }

    /// Column in the join table referencing the record
    pub fn owner_column(self) -> &'static str {
        match self {
            Self::Entries => "entry_id",
            Self::Quotations => "quotation_id",
            Self::Blogmarks => "blogmark_id",
            Self::Photos => "photo_id",
        }
    }
}

/// Where a changelist search looks
#[derive(Debug, Clone, Copy)]
pub struct SearchFields {
    pub tagged: TaggedTable,
    /// Text columns of the content table searched besides the tags
    pub columns: &'static [&'static str],
}

/// SQL `WHERE` clause plus the values for its placeholders, in order
#[derive(Debug, Clone)]
pub struct WhereClause {
    pub sql: String,
    range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    patterns: Vec<String>,
}

impl WhereClause {
    pub fn build(
        search: &SearchFields,
        filter: &ContentFilter,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Self {
        let mut sql = String::from("WHERE 1 = 1");
        let mut patterns = Vec::new();

        if range.is_some() {
            sql.push_str(" AND c.created >= ? AND c.created < ?");
        }

        for word in filter.words() {
            let pattern = contains_pattern(&word);
            let mut alternatives: Vec<String> = search
                .columns
                .iter()
                .map(|column| format!("LOWER(c.{}) LIKE ? ESCAPE '{}'", column, LIKE_ESCAPE))
                .collect();
            alternatives.push(format!(
                "EXISTS (SELECT 1 FROM {join} ct JOIN tags t ON t.id = ct.tag_id \
                 WHERE ct.{owner} = c.id AND LOWER(t.tag) LIKE ? ESCAPE '{esc}')",
                join = search.tagged.join_table(),
                owner = search.tagged.owner_column(),
                esc = LIKE_ESCAPE,
            ));

            for _ in 0..alternatives.len() {
                patterns.push(pattern.clone());
            }
            sql.push_str(" AND (");
            sql.push_str(&alternatives.join(" OR "));
            sql.push(')');
        }

        Self {
            sql,
            range,
            patterns,
        }
    }

    /// Build the clause for a changelist filter, resolving its date range
    pub fn for_filter(search: &SearchFields, filter: &ContentFilter) -> Result<Self> {
        let range = filter.date.range().map_err(anyhow::Error::msg)?;
        Ok(Self::build(search, filter, range))
    }

    /// Number of placeholders in the clause
    pub fn placeholder_count(&self) -> usize {
        self.patterns.len() + if self.range.is_some() { 2 } else { 0 }
    }

    pub fn bind_sqlite<'q>(
        &'q self,
        mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        if let Some((start, end)) = self.range {
            query = query.bind(start).bind(end);
        }
        for pattern in &self.patterns {
            query = query.bind(pattern.as_str());
        }
        query
    }

    pub fn bind_mysql<'q>(
        &'q self,
        mut query: Query<'q, MySql, MySqlArguments>,
    ) -> Query<'q, MySql, MySqlArguments> {
        if let Some((start, end)) = self.range {
            query = query.bind(start).bind(end);
        }
        for pattern in &self.patterns {
            query = query.bind(pattern.as_str());
        }
        query
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

/// Fetch one page of `columns` from `table`, newest first, plus the total count
pub async fn fetch_page_sqlite(
    pool: &SqlitePool,
    table: &str,
    columns: &str,
    clause: &WhereClause,
    params: &ListParams,
) -> Result<(Vec<SqliteRow>, i64)> {
    let count_sql = format!("SELECT COUNT(*) as count FROM {} c {}", table, clause.sql);
    let row = clause
        .bind_sqlite(sqlx::query(&count_sql))
        .fetch_one(pool)
        .await
        .with_context(|| format!("Failed to count {}", table))?;
    let total: i64 = row.get("count");

    let list_sql = format!(
        "SELECT {} FROM {} c {} ORDER BY c.created DESC, c.id DESC LIMIT ? OFFSET ?",
        columns, table, clause.sql
    );
    let rows = clause
        .bind_sqlite(sqlx::query(&list_sql))
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .with_context(|| format!("Failed to list {}", table))?;

    Ok((rows, total))
}

/// Creation timestamps of every row in `table` matching the clause
pub async fn fetch_created_sqlite(
    pool: &SqlitePool,
    table: &str,
    clause: &WhereClause,
) -> Result<Vec<DateTime<Utc>>> {
    let sql = format!("SELECT c.created FROM {} c {}", table, clause.sql);
    let rows = clause
        .bind_sqlite(sqlx::query(&sql))
        .fetch_all(pool)
        .await
        .with_context(|| format!("Failed to list {} dates", table))?;

    Ok(rows.iter().map(|row| row.get("created")).collect())
}

// ============================================================================
// MySQL implementations
// ============================================================================

pub async fn fetch_page_mysql(
    pool: &MySqlPool,
    table: &str,
    columns: &str,
    clause: &WhereClause,
    params: &ListParams,
) -> Result<(Vec<MySqlRow>, i64)> {
    let count_sql = format!("SELECT COUNT(*) as count FROM {} c {}", table, clause.sql);
    let row = clause
        .bind_mysql(sqlx::query(&count_sql))
        .fetch_one(pool)
        .await
        .with_context(|| format!("Failed to count {}", table))?;
    let total: i64 = row.get("count");

    let list_sql = format!(
        "SELECT {} FROM {} c {} ORDER BY c.created DESC, c.id DESC LIMIT ? OFFSET ?",
        columns, table, clause.sql
    );
    let rows = clause
        .bind_mysql(sqlx::query(&list_sql))
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .with_context(|| format!("Failed to list {}", table))?;

    Ok((rows, total))
}

pub async fn fetch_created_mysql(
    pool: &MySqlPool,
    table: &str,
    clause: &WhereClause,
) -> Result<Vec<DateTime<Utc>>> {
    let sql = format!("SELECT c.created FROM {} c {}", table, clause.sql);
    let rows = clause
        .bind_mysql(sqlx::query(&sql))
        .fetch_all(pool)
        .await
        .with_context(|| format!("Failed to list {} dates", table))?;

    Ok(rows.iter().map(|row| row.get("created")).collect())
}
