//! Presentational text processing
//!
//! Everything returned here is ready-to-emit HTML.

use crate::core::entities::escape_html;
use regex::Regex;
use std::sync::LazyLock;

/// Longest outline label for comments and CDATA, in characters
pub const OUTLINE_LINE_LEN: usize = 50;

static URL_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:(?:https?|ftp)://|www\.)[^\s<>"']+"#).ok()
});

/// Trim, HTML-escape and turn URLs into links
///
/// Protocol-less `www.` URLs get `http://` in the link target only.
pub fn process_text(text: &str) -> String {
    let text = text.trim();
    let Some(pattern) = URL_PATTERN.as_ref() else {
        return escape_html(text).into_owned();
    };

    let mut out = String::with_capacity(text.len() + 16);
    let mut last = 0;
    for m in pattern.find_iter(text) {
        out.push_str(&escape_html(&text[last..m.start()]));
        let url = trim_url_punctuation(m.as_str());
        push_link(&mut out, url);
        last = m.start() + url.len();
    }
    out.push_str(&escape_html(&text[last..]));
    out
}

/// Sentence punctuation directly after a URL is not part of it
fn trim_url_punctuation(url: &str) -> &str {
    url.trim_end_matches(['.', ',', ';', ':', '!', '?', ')'])
}

fn push_link(out: &mut String, url: &str) {
    let label = escape_html(url);
    out.push_str("<a href=\"");
    if url.len() >= 4 && url[..4].eq_ignore_ascii_case("www.") {
        out.push_str("http://");
    }
    out.push_str(&label);
    out.push_str("\" target=\"_blank\">");
    out.push_str(&label);
    out.push_str("</a>");
}

/// First non-empty line of `text`, cut to `OUTLINE_LINE_LEN` characters, escaped
pub fn outline_line(text: &str) -> String {
    let line = text
        .trim()
        .lines()
        .map(str::trim_end)
        .find(|l| !l.is_empty())
        .unwrap_or_default();

    match line.char_indices().nth(OUTLINE_LINE_LEN) {
        Some((cut, _)) => format!("{}...", escape_html(&line[..cut])),
        None => escape_html(line).into_owned(),
    }
}

/// Character count of the trimmed value
#[inline]
pub fn trimmed_len(text: &str) -> usize {
    text.trim().chars().count()
}
