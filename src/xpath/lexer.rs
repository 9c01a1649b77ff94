//! XPath Lexer
//!
//! Tokenizes XPath expressions into tokens. Operator names (`and`, `or`,
//! `mod`, `div`) and `*` are disambiguated by the previous token, so paths
//! like `//div` or `//*` lex as name tests.

use super::XPathError;

/// XPath token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Operators
    Slash,       // /
    DoubleSlash, // //
    Dot,         // .
    DoubleDot,   // ..
    At,          // @
    Pipe,        // |
    Plus,        // +
    Minus,       // -
    Star,        // * (multiply or wildcard, parser decides by position)
    Eq,          // =
    NotEq,       // !=
    Lt,          // <
    LtEq,        // <=
    Gt,          // >
    GtEq,        // >=
    And,         // and
    Or,          // or
    Mod,         // mod
    Div,         // div

    // Brackets
    LeftParen,    // (
    RightParen,   // )
    LeftBracket,  // [
    RightBracket, // ]

    // Literals
    Number(f64),
    String(String),

    // Names
    Name(String),         // NCName
    NameTest(String),     // prefix:* or prefix:local
    NodeType(String),     // node, text, comment, processing-instruction (before '(')
    FunctionName(String), // any other name directly followed by '('

    // Axis
    Axis(String), // child, descendant, ... (before '::')

    // Special
    DoubleColon, // ::
    Comma,       // ,
    Dollar,      // $

    // End of input
    Eof,
}

impl Token {
    /// True when the token can end an operand, making a following name an operator
    fn ends_operand(&self) -> bool {
        matches!(
            self,
            Token::Name(_)
                | Token::NameTest(_)
                | Token::Number(_)
                | Token::String(_)
                | Token::RightParen
                | Token::RightBracket
                | Token::Dot
                | Token::DoubleDot
        )
    }
}

/// XPath lexer
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    /// Whether the previous token ended an operand
    after_operand: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            pos: 0,
            after_operand: false,
        }
    }

    /// Byte offset of the next unread character
    pub fn position(&self) -> usize {
        self.pos
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.remaining().chars().nth(offset)
    }

    fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance(c.len_utf8());
            } else {
                break;
            }
        }
    }

    fn syntax_error(&self, message: impl Into<String>) -> XPathError {
        XPathError::Syntax {
            message: message.into(),
            offset: self.pos,
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<Token, XPathError> {
        let token = self.scan()?;
        self.after_operand = match token {
            // A star right after an operand is multiplication, otherwise a name test
            Token::Star => !self.after_operand,
            ref t => t.ends_operand(),
        };
        Ok(token)
    }

    fn single(&mut self, token: Token) -> Token {
        self.advance(1);
        token
    }

    fn scan(&mut self) -> Result<Token, XPathError> {
        self.skip_whitespace();

        let Some(c) = self.peek() else {
            return Ok(Token::Eof);
        };

        let token = match c {
            '/' => {
                self.advance(1);
                if self.peek() == Some('/') {
                    self.advance(1);
                    Token::DoubleSlash
                } else {
                    Token::Slash
                }
            }
            '.' => {
                if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
                    return Ok(self.read_number());
                }
                self.advance(1);
                if self.peek() == Some('.') {
                    self.advance(1);
                    Token::DoubleDot
                } else {
                    Token::Dot
                }
            }
            '@' => self.single(Token::At),
            '|' => self.single(Token::Pipe),
            '+' => self.single(Token::Plus),
            '-' => self.single(Token::Minus),
            '*' => self.single(Token::Star),
            '=' => self.single(Token::Eq),
            '(' => self.single(Token::LeftParen),
            ')' => self.single(Token::RightParen),
            '[' => self.single(Token::LeftBracket),
            ']' => self.single(Token::RightBracket),
            ',' => self.single(Token::Comma),
            '$' => self.single(Token::Dollar),
            '!' => {
                if self.peek_at(1) != Some('=') {
                    return Err(self.syntax_error("expected '=' after '!'"));
                }
                self.advance(2);
                Token::NotEq
            }
            '<' | '>' => {
                self.advance(1);
                let or_equal = self.peek() == Some('=');
                if or_equal {
                    self.advance(1);
                }
                match (c, or_equal) {
                    ('<', false) => Token::Lt,
                    ('<', true) => Token::LtEq,
                    (_, false) => Token::Gt,
                    (_, true) => Token::GtEq,
                }
            }
            ':' => {
                if self.peek_at(1) != Some(':') {
                    return Err(self.syntax_error("unexpected ':'"));
                }
                self.advance(2);
                Token::DoubleColon
            }
            '"' | '\'' => self.read_string(c)?,
            '0'..='9' => self.read_number(),
            _ if is_name_start_char(c) => self.read_name_or_keyword(),
            _ => return Err(self.syntax_error(format!("unexpected character '{}'", c))),
        };

        Ok(token)
    }

    fn read_number(&mut self) -> Token {
        let start = self.pos;

        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance(1);
        }
        if self.peek() == Some('.') {
            self.advance(1);
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance(1);
            }
        }

        Token::Number(self.input[start..self.pos].parse().unwrap_or(f64::NAN))
    }

    fn read_string(&mut self, quote: char) -> Result<Token, XPathError> {
        let open = self.pos;
        self.advance(1);
        let start = self.pos;

        match self.remaining().find(quote) {
            Some(len) => {
                let value = self.input[start..start + len].to_string();
                self.advance(len + 1);
                Ok(Token::String(value))
            }
            None => {
                self.pos = open;
                Err(self.syntax_error("unterminated string literal"))
            }
        }
    }

    fn read_ncname(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_name_char(c) {
                self.advance(c.len_utf8());
            } else {
                break;
            }
        }
        &self.input[start..self.pos]
    }

    fn read_name_or_keyword(&mut self) -> Token {
        let name = self.read_ncname();

        if self.after_operand {
            match name {
                "and" => return Token::And,
                "or" => return Token::Or,
                "mod" => return Token::Mod,
                "div" => return Token::Div,
                _ => {}
            }
        }

        // Namespace prefix: prefix:* or prefix:local (but not the '::' of an axis)
        if self.peek() == Some(':') && self.peek_at(1) != Some(':') {
            if self.peek_at(1) == Some('*') {
                self.advance(2);
                return Token::NameTest(format!("{}:*", name));
            }
            if self.peek_at(1).is_some_and(is_name_start_char) {
                self.advance(1);
                let local = self.read_ncname();
                return Token::NameTest(format!("{}:{}", name, local));
            }
        }

        // Lookahead past whitespace for '::' or '(' without consuming it
        let after = self.remaining().trim_start();
        if after.starts_with("::") {
            Token::Axis(name.to_string())
        } else if after.starts_with('(') {
            match name {
                "node" | "text" | "comment" | "processing-instruction" => {
                    Token::NodeType(name.to_string())
                }
                _ => Token::FunctionName(name.to_string()),
            }
        } else {
            Token::Name(name.to_string())
        }
    }

    /// Tokenize entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, XPathError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            if token == Token::Eof {
                break;
            }
            tokens.push(token);
        }
        Ok(tokens)
    }
}

fn is_name_start_char(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}
