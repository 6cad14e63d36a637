//! Shared shape of the dated, slugged, taggable content types
//!
//! Entries, quotations, blogmarks and photos all embed a [`ContentMeta`]
//! (creation time, slug, tag set) and are listed newest first. This module
//! also holds the list plumbing they share: pagination, changelist search
//! terms and date drill-down filters.

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::Tag;

/// Maximum slug length on content records
pub const CONTENT_SLUG_MAX_LENGTH: usize = 64;

/// Fields shared by every content record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentMeta {
    /// Creation timestamp, defaults to now
    pub created: DateTime<Utc>,
    /// URL slug used in permalinks
    pub slug: String,
    /// Associated tags, ordered by tag value
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl ContentMeta {
    /// Create meta with the current time and no tags
    pub fn new(slug: String) -> Self {
        Self {
            created: Utc::now(),
            slug,
            tags: Vec::new(),
        }
    }

    /// IDs of the associated tags
    pub fn tag_ids(&self) -> Vec<i64> {
        self.tags.iter().map(|t| t.id).collect()
    }
}

/// A content record as seen by the admin list views
pub trait Content {
    /// Database identifier
    fn id(&self) -> i64;

    /// Shared fields
    fn meta(&self) -> &ContentMeta;

    /// Human readable label used as the first list column
    fn display(&self) -> &str;
}

/// Pagination parameters for list queries
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 100,
        }
    }
}

impl ListParams {
    /// Create new pagination parameters
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 500),
        }
    }

    /// Calculate the offset for database queries
    pub fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64) * self.per_page as i64
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl<T> PagedResult<T> {
    /// Create a new paginated result
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
        }
    }

    /// Calculate the total number of pages
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 || self.total <= 0 {
            return 0;
        }
        ((self.total as u64 + self.per_page as u64 - 1) / self.per_page as u64) as u32
    }

    /// Map the items while keeping pagination info
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

/// Year / month / day drill-down on `created`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct DateFilter {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

/// Granularity of a date drill-down listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DateLevel {
    Year,
    Month,
    Day,
}

/// Distinct date parts that have records at the next drill-down level
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateBuckets {
    pub level: DateLevel,
    pub values: Vec<u32>,
}

impl DateFilter {
    /// Half-open UTC range `[start, end)` selected by the filter.
    ///
    /// Returns `Ok(None)` when no part is set. A month without a year, a day
    /// without a month, or an impossible date is an error.
    pub fn range(&self) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, String> {
        let (year, month, day) = match (self.year, self.month, self.day) {
            (None, None, None) => return Ok(None),
            (Some(y), None, None) => (y, None, None),
            (Some(y), Some(m), None) => (y, Some(m), None),
            (Some(y), Some(m), Some(d)) => (y, Some(m), Some(d)),
            (None, Some(_), _) => return Err("month requires year".to_string()),
            (_, None, Some(_)) => return Err("day requires month".to_string()),
        };

        let start = NaiveDate::from_ymd_opt(year, month.unwrap_or(1), day.unwrap_or(1))
            .ok_or_else(|| format!("invalid date: {}-{:?}-{:?}", year, month, day))?;

        let end = match (month, day) {
            (None, _) => start.checked_add_months(Months::new(12)),
            (Some(_), None) => start.checked_add_months(Months::new(1)),
            (Some(_), Some(_)) => start.succ_opt(),
        }
        .ok_or_else(|| format!("date out of range: {}", start))?;

        Ok(Some((midnight(start), midnight(end))))
    }

    /// Drill-down level below this filter
    pub fn next_level(&self) -> DateLevel {
        match (self.year, self.month) {
            (None, _) => DateLevel::Year,
            (Some(_), None) => DateLevel::Month,
            (Some(_), Some(_)) => DateLevel::Day,
        }
    }

    /// Collect the distinct date parts at the next level from a set of
    /// creation timestamps already restricted to [`DateFilter::range`].
    pub fn buckets(&self, created: &[DateTime<Utc>]) -> DateBuckets {
        let level = self.next_level();
        let values: BTreeSet<u32> = created
            .iter()
            .map(|dt| match level {
                DateLevel::Year => dt.year().max(0) as u32,
                DateLevel::Month => dt.month(),
                DateLevel::Day => dt.day(),
            })
            .collect();

        DateBuckets {
            level,
            values: values.into_iter().collect(),
        }
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc()
}

/// Filter applied to a content changelist
#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    /// Free-text search over the model's search fields
    pub q: Option<String>,
    /// Date drill-down on `created`
    pub date: DateFilter,
}

impl ContentFilter {
    /// Search words; every one must match some search field
    pub fn words(&self) -> Vec<String> {
        self.q
            .as_deref()
            .map(|q| q.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_list_params_clamps() {
        let params = ListParams::new(0, 0);
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, 1);

        let params = ListParams::new(3, 10_000);
        assert_eq!(params.per_page, 500);
        assert_eq!(params.offset(), 1000);
    }

    #[test]
    fn test_paged_result_total_pages() {
        let params = ListParams::new(1, 10);
        assert_eq!(PagedResult::<i32>::new(vec![], 0, &params).total_pages(), 0);
        assert_eq!(PagedResult::<i32>::new(vec![], 10, &params).total_pages(), 1);
        assert_eq!(PagedResult::<i32>::new(vec![], 11, &params).total_pages(), 2);
    }

    #[test]
    fn test_date_filter_empty() {
        assert_eq!(DateFilter::default().range(), Ok(None));
    }

    #[test]
    fn test_date_filter_year() {
        let filter = DateFilter { year: Some(2023), ..Default::default() };
        let (start, end) = filter.range().unwrap().unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_date_filter_december_rolls_over() {
        let filter = DateFilter { year: Some(2023), month: Some(12), day: None };
        let (start, end) = filter.range().unwrap().unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_date_filter_day() {
        let filter = DateFilter { year: Some(2024), month: Some(2), day: Some(29) };
        let (start, end) = filter.range().unwrap().unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_date_filter_invalid() {
        assert!(DateFilter { year: None, month: Some(1), day: None }.range().is_err());
        assert!(DateFilter { year: Some(2024), month: None, day: Some(1) }.range().is_err());
        assert!(DateFilter { year: Some(2023), month: Some(2), day: Some(29) }.range().is_err());
        assert!(DateFilter { year: Some(2023), month: Some(13), day: None }.range().is_err());
    }

    #[test]
    fn test_date_buckets() {
        let created = vec![
            Utc.with_ymd_and_hms(2022, 5, 3, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2023, 5, 9, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2023, 7, 9, 10, 0, 0).unwrap(),
        ];

        let years = DateFilter::default().buckets(&created);
        assert_eq!(years.level, DateLevel::Year);
        assert_eq!(years.values, vec![2022, 2023]);

        let months = DateFilter { year: Some(2023), ..Default::default() }.buckets(&created[1..]);
        assert_eq!(months.level, DateLevel::Month);
        assert_eq!(months.values, vec![5, 7]);

        let days = DateFilter { year: Some(2023), month: Some(5), day: None }.buckets(&created[1..2]);
        assert_eq!(days.level, DateLevel::Day);
        assert_eq!(days.values, vec![9]);
    }

    #[test]
    fn test_search_words() {
        let filter = ContentFilter { q: Some("  Django   ORM ".to_string()), ..Default::default() };
        assert_eq!(filter.words(), vec!["Django", "ORM"]);

        assert!(ContentFilter::default().words().is_empty());
        let blank = ContentFilter { q: Some("   ".to_string()), ..Default::default() };
        assert!(blank.words().is_empty());
    }
}
