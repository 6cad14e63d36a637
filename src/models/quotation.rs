//! Quotation model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Content, ContentMeta};

/// Maximum length of a quotation source
pub const QUOTATION_SOURCE_MAX_LENGTH: usize = 255;

/// A quoted passage with its attribution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quotation {
    pub id: i64,
    #[serde(flatten)]
    pub meta: ContentMeta,
    pub quotation: String,
    pub source: String,
    pub source_url: Option<String>,
}

impl Content for Quotation {
    fn id(&self) -> i64 {
        self.id
    }

    fn meta(&self) -> &ContentMeta {
        &self.meta
    }

    fn display(&self) -> &str {
        &self.quotation
    }
}

/// Input for creating a quotation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateQuotationInput {
    pub quotation: String,
    pub source: String,
    #[serde(default)]
    pub source_url: Option<String>,
    /// Prepopulated from the source when omitted
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Input for updating a quotation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateQuotationInput {
    pub quotation: Option<String>,
    pub source: Option<String>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub source_url: Option<Option<String>>,
    pub slug: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
}
