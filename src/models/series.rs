//! Series model
//!
//! A named grouping of entries. Series are not content records: they carry no
//! creation time or tags and are listed by title.

use serde::{Deserialize, Serialize};

/// Maximum slug length on a series
pub const SERIES_SLUG_MAX_LENGTH: usize = 50;

/// Series entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Series {
    pub id: i64,
    pub title: String,
    pub slug: String,
    /// Free-text description, may be blank
    pub description: String,
}

impl Series {
    pub fn new(title: String, slug: String, description: String) -> Self {
        Self {
            id: 0,
            title,
            slug,
            description,
        }
    }
}

/// Input for creating a series
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSeriesInput {
    pub title: String,
    /// Derived from the title when omitted
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
}

/// Input for updating a series
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSeriesInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
}
