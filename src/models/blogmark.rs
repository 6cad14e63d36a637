//! Blogmark model
//!
//! A bookmarked link with commentary and an optional "via" attribution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Content, ContentMeta};

pub const LINK_URL_MAX_LENGTH: usize = 1000;
pub const LINK_TITLE_MAX_LENGTH: usize = 255;
pub const VIA_URL_MAX_LENGTH: usize = 200;
pub const VIA_TITLE_MAX_LENGTH: usize = 255;

/// Blogmark entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Blogmark {
    pub id: i64,
    #[serde(flatten)]
    pub meta: ContentMeta,
    pub link_url: String,
    pub link_title: String,
    /// Where the link was found
    pub via_url: Option<String>,
    pub via_title: Option<String>,
    pub commentary: String,
}

impl Content for Blogmark {
    fn id(&self) -> i64 {
        self.id
    }

    fn meta(&self) -> &ContentMeta {
        &self.meta
    }

    fn display(&self) -> &str {
        &self.link_title
    }
}

/// Input for creating a blogmark
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateBlogmarkInput {
    pub link_url: String,
    pub link_title: String,
    #[serde(default)]
    pub via_url: Option<String>,
    #[serde(default)]
    pub via_title: Option<String>,
    pub commentary: String,
    /// Prepopulated from the link title when omitted
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Input for updating a blogmark
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBlogmarkInput {
    pub link_url: Option<String>,
    pub link_title: Option<String>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub via_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub via_title: Option<Option<String>>,
    pub commentary: Option<String>,
    pub slug: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
}
