//! Slug handling
//!
//! Slugs are URL path segments made of ASCII letters, digits, `-` and `_`.
//! When a create request leaves the slug out, it is prepopulated from the
//! model's source field (entry title, quotation source, and so on).

use once_cell::sync::Lazy;
use regex::Regex;

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("slug pattern is valid"));

/// Whether `value` is a non-empty slug
pub fn is_valid_slug(value: &str) -> bool {
    SLUG_RE.is_match(value)
}

/// Derive a slug from free text.
///
/// Lowercases, collapses every run of characters other than ASCII letters
/// and digits into a single `-`, trims `-` from both ends and truncates to
/// `max_len` characters. The result may be empty.
pub fn slugify(source: &str, max_len: usize) -> String {
    let mut slug = String::with_capacity(source.len());
    let mut pending_hyphen = false;

    for c in source.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    // Output is pure ASCII, so byte truncation is char truncation
    slug.truncate(max_len);
    slug.trim_end_matches('-').to_string()
}

/// Check an explicitly supplied slug
pub fn validate_slug(field: &str, slug: &str, max_len: usize) -> Result<(), String> {
    if slug.is_empty() {
        return Err(format!("{} is required", field));
    }
    if slug.chars().count() > max_len {
        return Err(format!(
            "{} must be at most {} characters",
            field, max_len
        ));
    }
    if !is_valid_slug(slug) {
        return Err(format!(
            "{} may only contain letters, numbers, underscores or hyphens",
            field
        ));
    }
    Ok(())
}

/// Pick the slug for a new record.
///
/// A non-blank `given` slug wins and is validated as-is. Otherwise the slug
/// is derived from `source`, when the model has one.
pub fn resolve_slug(
    given: Option<&str>,
    source: Option<&str>,
    max_len: usize,
) -> Result<String, String> {
    let slug = match given.map(str::trim).filter(|s| !s.is_empty()) {
        Some(slug) => slug.to_string(),
        None => source.map(|s| slugify(s, max_len)).unwrap_or_default(),
    };
    validate_slug("slug", &slug, max_len)?;
    Ok(slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Hello World", 64), "hello-world");
        assert_eq!(slugify("  Things I learned, 2024!  ", 64), "things-i-learned-2024");
        assert_eq!(slugify("snake_case and--dashes", 64), "snake-case-and-dashes");
    }

    #[test]
    fn test_slugify_drops_non_ascii() {
        assert_eq!(slugify("Café au lait", 64), "caf-au-lait");
        assert_eq!(slugify("日本語", 64), "");
    }

    #[test]
    fn test_slugify_truncates_without_trailing_hyphen() {
        assert_eq!(slugify("abcd efgh", 5), "abcd");
        assert_eq!(slugify("abcd efgh", 6), "abcd-e");
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("sqlite"));
        assert!(is_valid_slug("my_tag-2"));
        assert!(is_valid_slug("UPPER"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("has space"));
        assert!(!is_valid_slug("slash/path"));
        assert!(!is_valid_slug("ünïcode"));
    }

    #[test]
    fn test_validate_slug_errors() {
        assert!(validate_slug("tag", "", 50).is_err());
        assert!(validate_slug("tag", &"a".repeat(51), 50).is_err());
        assert!(validate_slug("tag", "no spaces", 50).is_err());
        assert!(validate_slug("tag", &"a".repeat(50), 50).is_ok());
    }

    #[test]
    fn test_resolve_slug_prefers_given() {
        assert_eq!(
            resolve_slug(Some("custom"), Some("Title"), 64).unwrap(),
            "custom"
        );
        assert_eq!(resolve_slug(Some("  "), Some("My Title"), 64).unwrap(), "my-title");
        assert_eq!(resolve_slug(None, Some("My Title"), 64).unwrap(), "my-title");
    }

    #[test]
    fn test_resolve_slug_requires_something() {
        assert!(resolve_slug(None, None, 64).is_err());
        assert!(resolve_slug(None, Some("!!!"), 64).is_err());
        assert!(resolve_slug(Some("bad slug"), None, 64).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Derived slugs fit the limit and are either empty or valid
        #[test]
        fn property_slugify_output_is_bounded_and_valid(
            source in "\\PC{0,200}",
            max_len in 1usize..80
        ) {
            let slug = slugify(&source, max_len);

            prop_assert!(slug.len() <= max_len);
            prop_assert!(slug.is_empty() || is_valid_slug(&slug));
            prop_assert!(!slug.starts_with('-'));
            prop_assert!(!slug.ends_with('-'));
            prop_assert!(!slug.contains("--"));
        }

        /// A resolved slug always passes validation
        #[test]
        fn property_resolved_slug_is_valid(source in "[a-zA-Z0-9 ,.!?]{1,120}") {
            if let Ok(slug) = resolve_slug(None, Some(&source), 64) {
                prop_assert!(validate_slug("slug", &slug, 64).is_ok());
            }
        }
    }
}
