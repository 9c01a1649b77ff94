//! XML Attribute Parsing
//!
//! Parses the attribute list of a start tag (the text between the element
//! name and `>` or `/>`). Parsing is strict: every attribute needs a quoted
//! value and attributes must be separated by whitespace.

use super::entities::decode_attribute_value;
use super::scanner::{is_name_char, is_name_start_char, is_whitespace};
use memchr::memchr;
use std::borrow::Cow;

/// A parsed XML attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<'a> {
    /// Attribute name (may include namespace prefix)
    pub name: &'a str,
    /// Attribute value (entities decoded)
    pub value: Cow<'a, str>,
}

impl<'a> Attribute<'a> {
    /// Namespace prefix (before colon), if any
    pub fn prefix(&self) -> Option<&'a str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Prefix declared by this attribute when it is a namespace declaration:
    /// `Some("")` for `xmlns`, `Some(p)` for `xmlns:p`
    pub fn declared_prefix(&self) -> Option<&'a str> {
        if self.name == "xmlns" {
            Some("")
        } else {
            self.name.strip_prefix("xmlns:")
        }
    }
}

/// Attribute syntax error: message plus byte offset into the parsed region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeError {
    pub message: &'static str,
    pub offset: usize,
}

impl AttributeError {
    fn new(message: &'static str, offset: usize) -> Self {
        AttributeError { message, offset }
    }
}

/// Parse attributes from raw tag content (after the element name)
pub fn parse_attributes(input: &str) -> Result<Vec<Attribute<'_>>, AttributeError> {
    let bytes = input.as_bytes();
    let mut attrs = Vec::new();
    let mut pos = 0;

    loop {
        let ws_start = pos;
        while pos < bytes.len() && is_whitespace(bytes[pos]) {
            pos += 1;
        }

        if pos >= bytes.len() {
            break;
        }

        if !attrs.is_empty() && pos == ws_start {
            return Err(AttributeError::new("Missing whitespace between attributes", pos));
        }

        // Parse attribute name
        let name_start = pos;
        if !is_name_start_char(bytes[pos]) {
            return Err(AttributeError::new("Invalid attribute name", pos));
        }
        while pos < bytes.len() && is_name_char(bytes[pos]) {
            pos += 1;
        }
        let name = &input[name_start..pos];

        // Skip whitespace around '='
        while pos < bytes.len() && is_whitespace(bytes[pos]) {
            pos += 1;
        }
        if bytes.get(pos) != Some(&b'=') {
            return Err(AttributeError::new("Attribute value required", pos));
        }
        pos += 1;
        while pos < bytes.len() && is_whitespace(bytes[pos]) {
            pos += 1;
        }

        let quote = match bytes.get(pos) {
            Some(&q @ (b'"' | b'\'')) => q,
            _ => return Err(AttributeError::new("Attribute value must be quoted", pos)),
        };
        pos += 1;

        let value_start = pos;
        let value_end = memchr(quote, &bytes[value_start..])
            .map(|i| value_start + i)
            .ok_or(AttributeError::new("Attribute value has mismatched quotes", value_start))?;

        let raw = &input[value_start..value_end];
        if let Some(lt) = memchr(b'<', raw.as_bytes()) {
            return Err(AttributeError::new("Attribute value cannot contain '<'", value_start + lt));
        }

        attrs.push(Attribute {
            name,
            value: decode_attribute_value(raw),
        });
        pos = value_end + 1;
    }

    Ok(attrs)
}
