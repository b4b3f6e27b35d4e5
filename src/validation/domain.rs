//! Domain-name extraction from free text.

use once_cell::sync::Lazy;
use regex::Regex;

/// Dot-separated labels of 1–63 letters/digits/hyphens (no leading or
/// trailing hyphen), ending in an alphabetic TLD of at least two letters.
static DOMAIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b([a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b")
        .expect("domain pattern is a valid regex")
});

/// First domain-like token in `text`, lower-cased. Later matches are ignored.
pub fn extract_domain(text: &str) -> Option<String> {
    DOMAIN_RE.find(text).map(|m| m.as_str().to_lowercase())
}
