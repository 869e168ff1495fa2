//! Online check-in URL handling.
//!
//! Webhooks deliver a short redirect URL (`ci.book.rentl.io/c/{uuid}/{code}`)
//! while the fillable form lives on the property's booking subdomain.

use once_cell::sync::Lazy;
use regex::Regex;

static SHORT_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ci\.book\.rentl\.io/c/([a-f0-9-]+)/(\d+)").unwrap());

static FULL_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-z-]+\.book\.rentl\.io/reservation/check-in/([a-f0-9-]+)").unwrap());

/// Expand a short check-in URL into the form URL for the given property
/// slug. Full URLs and unrecognized formats pass through unchanged.
pub fn expand(url: &str, property_slug: &str) -> String {
    if let Some(caps) = SHORT_URL.captures(url) {
        return format!(
            "https://{property_slug}.book.rentl.io/reservation/check-in/{}",
            &caps[1]
        );
    }
    if FULL_URL.is_match(url) {
        return url.to_string();
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_short_url() {
        let url = "https://ci.book.rentl.io/c/abc-123-def/98765";
        assert_eq!(
            expand(url, "sun-apartments"),
            "https://sun-apartments.book.rentl.io/reservation/check-in/abc-123-def"
        );
    }

    #[test]
    fn full_url_passes_through() {
        let url = "https://sun-apartments.book.rentl.io/reservation/check-in/abc-123-def";
        assert_eq!(expand(url, "other-slug"), url);
    }

    #[test]
    fn unknown_format_passes_through() {
        let url = "https://example.com/whatever";
        assert_eq!(expand(url, "slug"), url);
    }
}
