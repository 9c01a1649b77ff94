//! Query classification

use regex::Regex;
use std::sync::LazyLock;

/// How a query is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Plain, case-insensitive substring over the search index
    Substring,
    /// XPath expression
    XPath,
}

static XPATH_MARKER: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_:\-]").ok());

/// Anything beyond name characters (`/`, `[`, `@`, whitespace, ...) makes a query XPath
pub fn classify(query: &str) -> QueryKind {
    let is_xpath = match XPATH_MARKER.as_ref() {
        Some(marker) => marker.is_match(query),
        None => query
            .chars()
            .any(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '-'))),
    };
    if is_xpath {
        QueryKind::XPath
    } else {
        QueryKind::Substring
    }
}

/// Trimmed query; substring queries are also lowercased
pub fn normalize(query: &str) -> String {
    let trimmed = query.trim();
    match classify(trimmed) {
        QueryKind::Substring => trimmed.to_lowercase(),
        QueryKind::XPath => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(classify("item"), QueryKind::Substring);
        assert_eq!(classify("svg:rect"), QueryKind::Substring);
        assert_eq!(classify("data-id_2"), QueryKind::Substring);
        assert_eq!(classify("//item"), QueryKind::XPath);
        assert_eq!(classify("@id"), QueryKind::XPath);
        assert_eq!(classify("a b"), QueryKind::XPath);
        assert_eq!(classify("count(x)"), QueryKind::XPath);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Item "), "item");
        assert_eq!(normalize(" //Item "), "//Item");
        assert_eq!(normalize("   "), "");
    }
}
