//! XML Tokenizer
//!
//! Pull tokenizer over a validated UTF-8 document. Produces one token per
//! markup construct and reports the first syntax error with its location.
//! Structural checks that need a stack (tag matching, single root) belong
//! to the tree builder in `dom::document`.

use super::attributes::{parse_attributes, Attribute};
use super::entities::decode_text;
use super::scanner::{locate, Scanner};
use std::borrow::Cow;

/// Document could not be parsed as well-formed XML
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at line {line}, column {column}")]
pub struct ParseError {
    pub message: String,
    /// Byte offset into the input
    pub position: usize,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    /// Create an error located at `position` within `input`
    pub fn at(input: &str, message: impl Into<String>, position: usize) -> Self {
        let (line, column) = locate(input, position);
        ParseError {
            message: message.into(),
            position,
            line,
            column,
        }
    }
}

/// Markup token
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    /// `<?xml ...?>`
    XmlDeclaration,
    /// `<!DOCTYPE ...>`
    DocType,
    StartTag {
        name: &'a str,
        attributes: Vec<Attribute<'a>>,
        self_closing: bool,
    },
    EndTag {
        name: &'a str,
    },
    /// Character data with entities decoded
    Text(Cow<'a, str>),
    CData(&'a str),
    Comment(&'a str),
    ProcessingInstruction {
        target: &'a str,
        data: &'a str,
    },
}

/// A token plus the byte offset where it starts
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<'a> {
    pub token: Token<'a>,
    pub start: usize,
}

/// XML tokenizer
pub struct Tokenizer<'a> {
    input: &'a str,
    scanner: Scanner<'a>,
    failed: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Tokenizer {
            input,
            scanner: Scanner::new(input),
            failed: false,
        }
    }

    fn error(&mut self, message: impl Into<String>, position: usize) -> ParseError {
        self.failed = true;
        ParseError::at(self.input, message, position)
    }

    /// Get the next token, `None` at end of input or after an error
    pub fn next_token(&mut self) -> Option<Result<Spanned<'a>, ParseError>> {
        if self.failed || self.scanner.is_eof() {
            return None;
        }

        let start = self.scanner.position();
        let result = if self.scanner.peek() == Some(b'<') {
            self.read_markup(start)
        } else {
            Ok(self.read_text(start))
        };

        Some(result.map(|token| Spanned { token, start }))
    }

    fn read_text(&mut self, start: usize) -> Token<'a> {
        let end = self.scanner.find_tag_start().unwrap_or(self.input.len());
        self.scanner.set_position(end);
        Token::Text(decode_text(self.scanner.slice(start, end)))
    }

    fn read_markup(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        if self.scanner.eat("<!--") {
            let body = self.scanner.position();
            let end = self
                .scanner
                .find_seq("-->")
                .ok_or_else(|| self.error("Unterminated comment", start))?;
            let content = self.scanner.slice(body, end);
            if let Some(dash) = content.find("--") {
                return Err(self.error("'--' not allowed in comment", body + dash));
            }
            self.scanner.set_position(end + 3);
            return Ok(Token::Comment(content));
        }

        if self.scanner.eat("<![CDATA[") {
            let body = self.scanner.position();
            let end = self
                .scanner
                .find_seq("]]>")
                .ok_or_else(|| self.error("Unterminated CDATA section", start))?;
            self.scanner.set_position(end + 3);
            return Ok(Token::CData(self.scanner.slice(body, end)));
        }

        if self.scanner.eat("<!DOCTYPE") {
            let end = self
                .scanner
                .find_doctype_end()
                .ok_or_else(|| self.error("Unterminated DOCTYPE", start))?;
            self.scanner.set_position(end + 1);
            return Ok(Token::DocType);
        }

        if self.scanner.eat("<?") {
            return self.read_processing_instruction(start);
        }

        if self.scanner.eat("</") {
            let name = self
                .scanner
                .read_name()
                .ok_or_else(|| self.error("Invalid end tag name", start))?;
            self.scanner.skip_whitespace();
            if !self.scanner.eat(">") {
                let pos = self.scanner.position();
                return Err(self.error(format!("Malformed end tag </{}>", name), pos));
            }
            return Ok(Token::EndTag { name });
        }

        self.scanner.advance(1);
        self.read_start_tag(start)
    }

    fn read_processing_instruction(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        let target = self
            .scanner
            .read_name()
            .ok_or_else(|| self.error("Invalid processing instruction target", start))?;
        let body = self.scanner.position();
        let end = self
            .scanner
            .find_seq("?>")
            .ok_or_else(|| self.error("Unterminated processing instruction", start))?;
        self.scanner.set_position(end + 2);

        if target.eq_ignore_ascii_case("xml") {
            if start != 0 {
                return Err(self.error("XML declaration allowed only at the start of the document", start));
            }
            return Ok(Token::XmlDeclaration);
        }

        Ok(Token::ProcessingInstruction {
            target,
            data: self.scanner.slice(body, end).trim(),
        })
    }

    fn read_start_tag(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        let name = self
            .scanner
            .read_name()
            .ok_or_else(|| self.error("Invalid element name", start + 1))?;
        let attrs_start = self.scanner.position();
        let end = self
            .scanner
            .find_tag_end_quoted()
            .ok_or_else(|| self.error(format!("Unterminated start tag <{}>", name), start))?;
        self.scanner.set_position(end + 1);

        let mut region = self.scanner.slice(attrs_start, end);
        let self_closing = region.ends_with('/');
        if self_closing {
            region = &region[..region.len() - 1];
        }

        let attributes = parse_attributes(region)
            .map_err(|e| self.error(e.message, attrs_start + e.offset))?;

        Ok(Token::StartTag {
            name,
            attributes,
            self_closing,
        })
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<Spanned<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token<'_>> {
        Tokenizer::new(input)
            .map(|t| t.map(|s| s.token))
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_simple_element() {
        let toks = tokens("<root a=\"1\">hi</root>");
        assert_eq!(toks.len(), 3);
        assert!(matches!(&toks[0], Token::StartTag { name: "root", attributes, self_closing: false } if attributes.len() == 1));
        assert_eq!(toks[1], Token::Text(Cow::Borrowed("hi")));
        assert_eq!(toks[2], Token::EndTag { name: "root" });
    }

    #[test]
    fn test_self_closing() {
        let toks = tokens("<c/><d x='1' />");
        assert!(matches!(&toks[0], Token::StartTag { name: "c", self_closing: true, .. }));
        assert!(matches!(&toks[1], Token::StartTag { name: "d", self_closing: true, attributes } if attributes[0].value == "1"));
    }

    #[test]
    fn test_special_constructs() {
        let toks = tokens("<?xml version=\"1.0\"?><!DOCTYPE r [<!ELEMENT r ANY>]><!--c--><?pi some data ?><![CDATA[<x>]]>");
        assert_eq!(toks[0], Token::XmlDeclaration);
        assert_eq!(toks[1], Token::DocType);
        assert_eq!(toks[2], Token::Comment("c"));
        assert_eq!(toks[3], Token::ProcessingInstruction { target: "pi", data: "some data" });
        assert_eq!(toks[4], Token::CData("<x>"));
    }

    #[test]
    fn test_text_entities_decoded() {
        let toks = tokens("a &amp; b");
        assert_eq!(toks[0], Token::Text(Cow::Owned("a & b".to_string())));
    }

    #[test]
    fn test_errors_have_location() {
        let err = Tokenizer::new("<a>\n<!-- open")
            .find_map(|t| t.err())
            .unwrap();
        assert_eq!(err.message, "Unterminated comment");
        assert_eq!((err.line, err.column), (2, 1));
    }

    #[test]
    fn test_stops_after_error() {
        let mut tok = Tokenizer::new("<a b=c>text");
        assert!(tok.next_token().unwrap().is_err());
        assert!(tok.next_token().is_none());
    }

    #[test]
    fn test_late_xml_declaration_rejected() {
        let result: Result<Vec<_>, _> = Tokenizer::new("<a/><?xml version=\"1.0\"?>").collect();
        assert!(result.is_err());
    }
}
