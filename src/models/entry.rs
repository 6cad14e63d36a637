//! Entry model
//!
//! A blog post: title, HTML body, optional sidebar tweet and extra `<head>`
//! markup, and an optional series it belongs to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Content, ContentMeta};

/// Maximum length of an entry title
pub const ENTRY_TITLE_MAX_LENGTH: usize = 255;

/// Entry entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entry {
    pub id: i64,
    #[serde(flatten)]
    pub meta: ContentMeta,
    /// May be blank
    pub title: String,
    /// HTML body, well-formed once wrapped in a root element
    pub body: String,
    /// Embedded tweet HTML shown next to the entry
    pub tweet_html: Option<String>,
    /// Extra markup for the page `<head>`
    pub extra_head_html: Option<String>,
    /// Owning series; cleared when the series is deleted
    pub series_id: Option<i64>,
}

impl Content for Entry {
    fn id(&self) -> i64 {
        self.id
    }

    fn meta(&self) -> &ContentMeta {
        &self.meta
    }

    fn display(&self) -> &str {
        &self.title
    }
}

/// Input for creating an entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateEntryInput {
    #[serde(default)]
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tweet_html: Option<String>,
    #[serde(default)]
    pub extra_head_html: Option<String>,
    #[serde(default)]
    pub series_id: Option<i64>,
    /// Prepopulated from the title when omitted
    #[serde(default)]
    pub slug: Option<String>,
    /// Defaults to now
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Input for updating an entry
///
/// Nullable fields distinguish "absent" (keep) from `null` (clear).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEntryInput {
    pub title: Option<String>,
    pub body: Option<String>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub tweet_html: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub extra_head_html: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub series_id: Option<Option<i64>>,
    pub slug: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_input_distinguishes_null_from_absent() {
        let input: UpdateEntryInput = serde_json::from_str(r#"{"series_id": null}"#).unwrap();
        assert_eq!(input.series_id, Some(None));
        assert_eq!(input.tweet_html, None);

        let input: UpdateEntryInput = serde_json::from_str(r#"{"series_id": 7}"#).unwrap();
        assert_eq!(input.series_id, Some(Some(7)));

        let input: UpdateEntryInput = serde_json::from_str("{}").unwrap();
        assert_eq!(input.series_id, None);
    }

    #[test]
    fn test_entry_serializes_meta_inline() {
        let entry = Entry {
            id: 1,
            meta: ContentMeta::new("hello".to_string()),
            title: "Hello".to_string(),
            body: "<p>Hi</p>".to_string(),
            tweet_html: None,
            extra_head_html: None,
            series_id: None,
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["slug"], "hello");
        assert!(json["created"].is_string());
        assert!(json["tags"].as_array().unwrap().is_empty());
        assert_eq!(entry.display(), "Hello");
    }
}
