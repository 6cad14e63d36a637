//! Common API utilities and shared types
//!
//! Query parameters and response envelopes used by every admin list.

use serde::{Deserialize, Serialize};

use crate::models::{Content, ContentFilter, DateFilter, ListParams, PagedResult};

// ============================================================================
// Pagination Defaults
// ============================================================================

/// Default page number (1-indexed)
pub fn default_page() -> u32 {
    1
}

/// Default page size for admin lists
pub fn default_per_page() -> u32 {
    100
}

// ============================================================================
// Query Types
// ============================================================================

/// Admin pagination query parameters
#[derive(Debug, Deserialize)]
pub struct AdminPaginationQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl AdminPaginationQuery {
    pub fn params(&self) -> ListParams {
        ListParams::new(self.page, self.per_page)
    }
}

/// Changelist query: paging, search words and date drill-down
#[derive(Debug, Deserialize)]
pub struct ChangelistQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    pub q: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl ChangelistQuery {
    pub fn params(&self) -> ListParams {
        ListParams::new(self.page, self.per_page)
    }

    pub fn filter(&self) -> ContentFilter {
        ContentFilter {
            q: self.q.clone(),
            date: DateFilter {
                year: self.year,
                month: self.month,
                day: self.day,
            },
        }
    }
}

// ============================================================================
// Response Types
// ============================================================================

/// A changelist row: the record plus its display string
#[derive(Debug, Serialize)]
pub struct Row<T> {
    pub display: String,
    #[serde(flatten)]
    pub record: T,
}

impl<T: Content> From<T> for Row<T> {
    fn from(record: T) -> Self {
        Self {
            display: record.display().to_string(),
            record,
        }
    }
}

/// Paginated list response
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl<T> ListResponse<T> {
    pub fn from_page<U>(page: PagedResult<U>, f: impl FnMut(U) -> T) -> Self {
        let total_pages = page.total_pages();
        let page = page.map(f);
        Self {
            items: page.items,
            total: page.total,
            page: page.page,
            per_page: page.per_page,
            total_pages,
        }
    }
}
