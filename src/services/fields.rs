//! Field-level checks shared by the content services
//!
//! Each check returns the message shown to the admin user; services wrap it
//! in their own `ValidationError` variant.

use url::Url;

/// Reject blank required text
pub fn require(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", field));
    }
    Ok(())
}

/// Reject text longer than `max_len` characters
pub fn max_length(field: &str, value: &str, max_len: usize) -> Result<(), String> {
    let len = value.chars().count();
    if len > max_len {
        return Err(format!(
            "{} must be at most {} characters (got {})",
            field, max_len, len
        ));
    }
    Ok(())
}

/// Require an absolute `http` or `https` URL
pub fn http_url(field: &str, value: &str) -> Result<(), String> {
    let parsed = Url::parse(value).map_err(|e| format!("{} is not a valid URL: {}", field, e))?;
    match parsed.scheme() {
        "http" | "https" if parsed.has_host() => Ok(()),
        _ => Err(format!("{} must be an http or https URL", field)),
    }
}

/// Treat blank optional text as absent
pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require() {
        assert!(require("body", "x").is_ok());
        assert_eq!(require("body", "  ").unwrap_err(), "body is required");
    }

    #[test]
    fn test_max_length_counts_characters() {
        assert!(max_length("title", "ééé", 3).is_ok());
        assert!(max_length("title", "éééé", 3).is_err());
    }

    #[test]
    fn test_http_url() {
        assert!(http_url("link_url", "https://example.com/path?q=1").is_ok());
        assert!(http_url("link_url", "http://localhost:8000/").is_ok());
        assert!(http_url("link_url", "ftp://example.com/").is_err());
        assert!(http_url("link_url", "example.com").is_err());
        assert!(http_url("link_url", "javascript:alert(1)").is_err());
    }

    #[test]
    fn test_blank_to_none() {
        assert_eq!(blank_to_none(Some("  ".to_string())), None);
        assert_eq!(blank_to_none(None), None);
        assert_eq!(blank_to_none(Some("x".to_string())), Some("x".to_string()));
    }
}
