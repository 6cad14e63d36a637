//! Photo model
//!
//! The image itself lives on disk; the record keeps its path relative to the
//! media root, laid out as `photos/YYYY/MM/<file>`.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use super::{Content, ContentMeta};

/// Directory photos are stored under, relative to the media root
pub const PHOTO_UPLOAD_DIR: &str = "photos";

/// Photo entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Photo {
    pub id: i64,
    #[serde(flatten)]
    pub meta: ContentMeta,
    /// Path relative to the media root
    pub photo: String,
    /// May be blank
    pub title: String,
}

impl Content for Photo {
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

/// Relative upload directory for a photo uploaded at `at`
pub fn upload_dir(at: DateTime<Utc>) -> String {
    format!("{}/{:04}/{:02}", PHOTO_UPLOAD_DIR, at.year(), at.month())
}

/// Photo fields supplied alongside an uploaded file
#[derive(Debug, Clone, Default)]
pub struct CreatePhotoInput {
    pub title: String,
    pub slug: String,
    pub created: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
}

/// Input for updating photo metadata; the file itself is immutable
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePhotoInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_upload_dir_uses_year_and_month() {
        let at = Utc.with_ymd_and_hms(2024, 3, 7, 15, 45, 0).unwrap();
        assert_eq!(upload_dir(at), "photos/2024/03");
    }
}
