//! SIMD-accelerated markup scanning using memchr
//!
//! The scanner walks a validated UTF-8 document. Every position it stops at
//! is either an ASCII delimiter or the end of input, so slicing the source
//! `str` between two scanner positions never splits a code point.

use memchr::memmem;
use memchr::{memchr, memchr_iter};

/// Cursor over document text used by the tokenizer
pub struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner for the given input
    #[inline]
    pub fn new(input: &'a str) -> Self {
        Scanner { input, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.input.len());
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    #[inline]
    fn bytes(&self) -> &'a [u8] {
        self.input.as_bytes()
    }

    /// Source text between two scanner positions
    #[inline]
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.input[start..end]
    }

    /// Peek at current byte without advancing
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.bytes().get(self.pos).copied()
    }

    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    /// Consume `needle` if the input continues with it
    #[inline]
    pub fn eat(&mut self, needle: &str) -> bool {
        if self.starts_with(needle) {
            self.pos += needle.len();
            true
        } else {
            false
        }
    }

    #[inline]
    pub fn starts_with(&self, needle: &str) -> bool {
        self.input[self.pos..].starts_with(needle)
    }

    /// Skip XML whitespace, returning how many bytes were skipped
    #[inline]
    pub fn skip_whitespace(&mut self) -> usize {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if is_whitespace(b) {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.pos - start
    }

    /// Find next '<' (tag start) using SIMD
    #[inline]
    pub fn find_tag_start(&self) -> Option<usize> {
        memchr(b'<', &self.bytes()[self.pos..]).map(|i| self.pos + i)
    }

    /// Find the next occurrence of a multi-byte terminator such as `-->`
    #[inline]
    pub fn find_seq(&self, needle: &str) -> Option<usize> {
        memmem::find(&self.bytes()[self.pos..], needle.as_bytes()).map(|i| self.pos + i)
    }

    /// Find tag end while handling quotes properly
    /// Returns the position of '>' that is not inside quotes
    pub fn find_tag_end_quoted(&self) -> Option<usize> {
        let bytes = self.bytes();
        let mut pos = self.pos;
        let mut quote: Option<u8> = None;

        while pos < bytes.len() {
            match (bytes[pos], quote) {
                (b'"' | b'\'', None) => quote = Some(bytes[pos]),
                (b, Some(q)) if b == q => quote = None,
                (b'>', None) => return Some(pos),
                _ => {}
            }
            pos += 1;
        }
        None
    }

    /// Find the '>' closing a DOCTYPE, skipping a bracketed internal subset
    pub fn find_doctype_end(&self) -> Option<usize> {
        let bytes = self.bytes();
        let mut pos = self.pos;
        let mut depth = 0usize;
        let mut quote: Option<u8> = None;

        while pos < bytes.len() {
            let b = bytes[pos];
            match quote {
                Some(q) if b == q => quote = None,
                Some(_) => {}
                None => match b {
                    b'"' | b'\'' => quote = Some(b),
                    b'[' => depth += 1,
                    b']' => depth = depth.saturating_sub(1),
                    b'>' if depth == 0 => return Some(pos),
                    _ => {}
                },
            }
            pos += 1;
        }
        None
    }

    /// Read an XML name (starts with letter/underscore/colon, continues with
    /// letters/digits/hyphens/underscores/periods/colons)
    pub fn read_name(&mut self) -> Option<&'a str> {
        let bytes = self.bytes();
        let start = self.pos;

        if !bytes.get(start).copied().is_some_and(is_name_start_char) {
            return None;
        }

        self.pos += 1;
        while self.pos < bytes.len() && is_name_char(bytes[self.pos]) {
            self.pos += 1;
        }

        Some(&self.input[start..self.pos])
    }
}

/// Resolve a byte offset to a 1-based (line, column) pair for error reports
pub fn locate(input: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(input.len());
    let head = &input.as_bytes()[..offset];
    let line = memchr_iter(b'\n', head).count() + 1;
    let line_start = head.iter().rposition(|&b| b == b'\n').map_or(0, |p| p + 1);
    let column = input
        .get(line_start..offset)
        .map_or(offset - line_start, |s| s.chars().count())
        + 1;
    (line, column)
}

/// Check if byte is valid XML name start character
/// Allows ASCII letters, underscore, colon, and non-ASCII (UTF-8 Unicode)
#[inline]
pub fn is_name_start_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

/// Check if byte is valid XML name character
#[inline]
pub fn is_name_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.' | b':') || b >= 0x80
}

#[inline]
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_tag_start() {
        let scanner = Scanner::new("hello <world>");
        assert_eq!(scanner.find_tag_start(), Some(6));
    }

    #[test]
    fn test_find_tag_end_quoted() {
        let scanner = Scanner::new("<a attr=\">test\">content");
        assert_eq!(scanner.find_tag_end_quoted(), Some(15));
    }

    #[test]
    fn test_find_doctype_end_skips_subset() {
        let scanner = Scanner::new("<!DOCTYPE a [<!ENTITY x \"y>\">]>rest");
        assert_eq!(scanner.find_doctype_end(), Some(30));
    }

    #[test]
    fn test_read_name() {
        let mut scanner = Scanner::new("ns:element-name>");
        assert_eq!(scanner.read_name(), Some("ns:element-name"));
        assert_eq!(scanner.position(), 15);
        assert_eq!(scanner.read_name(), None);
    }

    #[test]
    fn test_read_unicode_name() {
        let mut scanner = Scanner::new("données/>");
        assert_eq!(scanner.read_name(), Some("données"));
        assert_eq!(scanner.peek(), Some(b'/'));
    }

    #[test]
    fn test_locate() {
        let text = "<a>\n  <b>\n</a>";
        assert_eq!(locate(text, 0), (1, 1));
        assert_eq!(locate(text, 6), (2, 3));
    }
}
