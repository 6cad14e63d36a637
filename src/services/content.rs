//! Pieces shared by the entry, quotation, blogmark and photo services

use crate::models::{ContentFilter, CONTENT_SLUG_MAX_LENGTH};
use crate::services::slug::validate_slug;
use crate::services::tag::TagServiceError;

/// Error types for content service operations
#[derive(Debug, thiserror::Error)]
pub enum ContentServiceError {
    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error, shown to the admin user
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<TagServiceError> for ContentServiceError {
    fn from(err: TagServiceError) -> Self {
        match err {
            TagServiceError::ValidationError(msg) => Self::ValidationError(msg),
            TagServiceError::NotFound(msg) => Self::NotFound(msg),
            TagServiceError::Duplicate(msg) => {
                Self::InternalError(anyhow::anyhow!("Tag already exists: {}", msg))
            }
            TagServiceError::InternalError(e) => Self::InternalError(e),
        }
    }
}

/// Shorthand for building a validation error from a field check
pub(crate) fn invalid(message: String) -> ContentServiceError {
    ContentServiceError::ValidationError(message)
}

/// Reject date filters that do not describe a real day, month or year
pub fn check_filter(filter: &ContentFilter) -> Result<(), ContentServiceError> {
    filter.date.range().map(|_| ()).map_err(invalid)
}

/// Validate a slug submitted on update; blank is not allowed
pub fn check_content_slug(slug: &str) -> Result<String, ContentServiceError> {
    let slug = slug.trim();
    validate_slug("slug", slug, CONTENT_SLUG_MAX_LENGTH).map_err(invalid)?;
    Ok(slug.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DateFilter;

    #[test]
    fn test_check_filter() {
        assert!(check_filter(&ContentFilter::default()).is_ok());

        let bad = ContentFilter {
            date: DateFilter {
                year: None,
                month: Some(3),
                day: None,
            },
            ..Default::default()
        };
        assert!(matches!(
            check_filter(&bad),
            Err(ContentServiceError::ValidationError(_))
        ));
    }

    #[test]
    fn test_tag_errors_map_to_content_errors() {
        let err: ContentServiceError = TagServiceError::ValidationError("bad".to_string()).into();
        assert!(matches!(err, ContentServiceError::ValidationError(m) if m == "bad"));
    }

    #[test]
    fn test_check_content_slug() {
        assert_eq!(check_content_slug(" ok-slug ").unwrap(), "ok-slug");
        assert!(check_content_slug("").is_err());
        assert!(check_content_slug(&"a".repeat(65)).is_err());
    }
}
