//! Tag model
//!
//! A tag is a unique, URL-safe label attachable to any content record.

use serde::{Deserialize, Serialize};

/// Maximum length of a tag value
pub const TAG_MAX_LENGTH: usize = 50;

/// Tag entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    /// Unique identifier
    pub id: i64,
    /// The tag itself, a unique slug
    pub tag: String,
}

impl Tag {
    /// Create a new Tag with the given value.
    ///
    /// The ID will be set to 0 and should be assigned by the database.
    pub fn new(tag: String) -> Self {
        Self { id: 0, tag }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.tag)
    }
}

/// Input for creating or renaming a tag
#[derive(Debug, Clone, Deserialize)]
pub struct TagInput {
    pub tag: String,
}
