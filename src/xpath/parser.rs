//! XPath Parser
//!
//! Recursive descent parser for XPath 1.0 expressions. Abbreviations are
//! expanded while parsing: `.` is `self::node()`, `..` is `parent::node()`,
//! `//` is `/descendant-or-self::node()/` and `@` is `attribute::`.

use super::lexer::{Lexer, Token};
use super::XPathError;

/// XPath expression AST node
#[derive(Debug, Clone)]
pub enum Expr {
    /// Root path (/)
    Root,
    /// Location step relative to the context node
    Step(Step),
    /// Path expression (expr/step)
    Path(Box<Expr>, Step),
    /// Filter expression with predicate, positions in document order
    Filter(Box<Expr>, Box<Expr>),
    /// Union of two expressions (|)
    Union(Box<Expr>, Box<Expr>),
    /// Function call
    Function(String, Vec<Expr>),
    /// Binary operation
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
    /// Unary negation
    Negate(Box<Expr>),
    /// Literal number
    Number(f64),
    /// Literal string
    String(String),
    /// Variable reference
    Variable(String),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// Location step in a path
#[derive(Debug, Clone)]
pub struct Step {
    pub axis: Axis,
    pub node_test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    fn bare(axis: Axis, node_test: NodeTest) -> Self {
        Step {
            axis,
            node_test,
            predicates: Vec::new(),
        }
    }
}

/// XPath axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
    Self_,
    Attribute,
    Namespace,
}

impl Axis {
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "child" => Some(Axis::Child),
            "descendant" => Some(Axis::Descendant),
            "descendant-or-self" => Some(Axis::DescendantOrSelf),
            "parent" => Some(Axis::Parent),
            "ancestor" => Some(Axis::Ancestor),
            "ancestor-or-self" => Some(Axis::AncestorOrSelf),
            "following-sibling" => Some(Axis::FollowingSibling),
            "preceding-sibling" => Some(Axis::PrecedingSibling),
            "following" => Some(Axis::Following),
            "preceding" => Some(Axis::Preceding),
            "self" => Some(Axis::Self_),
            "attribute" => Some(Axis::Attribute),
            "namespace" => Some(Axis::Namespace),
            _ => None,
        }
    }

    /// Reverse axes number their nodes nearest-first
    pub fn is_reverse(self) -> bool {
        matches!(
            self,
            Axis::Parent
                | Axis::Ancestor
                | Axis::AncestorOrSelf
                | Axis::PrecedingSibling
                | Axis::Preceding
        )
    }
}

/// Node test in a location step
#[derive(Debug, Clone, PartialEq)]
pub enum NodeTest {
    /// Matches any node of the principal kind (*)
    Any,
    /// Matches by qualified name as written in the document
    Name(String),
    /// Matches prefix:local through namespace resolution
    QName(String, String),
    /// Matches prefix:*
    NamespaceWildcard(String),
    /// node() - matches any node
    Node,
    /// text() - matches text nodes
    Text,
    /// comment() - matches comments
    Comment,
    /// processing-instruction() - matches PIs
    ProcessingInstruction(Option<String>),
}

/// Deepest nesting of `(`, `[`, function arguments and unary minus
pub const MAX_NESTING: usize = 64;

/// Tokens accepted in one expression; bounds the depth of operator and
/// step chains, which the compiler walks recursively
pub const MAX_TOKENS: usize = 1024;

/// XPath parser
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    /// Offset where `current` starts, for error reporting
    offset: usize,
    depth: usize,
    tokens: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser
    pub fn new(input: &'a str) -> Result<Self, XPathError> {
        let mut lexer = Lexer::new(input);
        let offset = lexer.position();
        let current = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current,
            offset,
            depth: 0,
            tokens: 1,
        })
    }

    /// Parse a complete XPath expression
    pub fn parse(&mut self) -> Result<Expr, XPathError> {
        let expr = self.parse_expr()?;
        if self.current != Token::Eof {
            return Err(self.error(format!("unexpected {:?}", self.current)));
        }
        Ok(expr)
    }

    fn error(&self, message: impl Into<String>) -> XPathError {
        XPathError::Syntax {
            message: message.into(),
            offset: self.offset,
        }
    }

    /// Advance to next token
    fn advance(&mut self) -> Result<(), XPathError> {
        self.tokens += 1;
        if self.tokens > MAX_TOKENS {
            return Err(self.error("expression too long"));
        }
        self.offset = self.lexer.position();
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn expect(&mut self, token: Token, what: &str) -> Result<(), XPathError> {
        if self.current != token {
            return Err(self.error(format!("expected {}", what)));
        }
        self.advance()
    }

    fn parse_expr(&mut self) -> Result<Expr, XPathError> {
        self.parse_or_expr()
    }

    /// Run `f` one nesting level deeper
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, XPathError>) -> Result<T, XPathError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error("expression nested too deeply"));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn parse_or_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_and_expr()?;

        while self.current == Token::Or {
            self.advance()?;
            let right = self.parse_and_expr()?;
            left = Expr::Binary(Box::new(left), BinaryOp::Or, Box::new(right));
        }

        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_equality_expr()?;

        while self.current == Token::And {
            self.advance()?;
            let right = self.parse_equality_expr()?;
            left = Expr::Binary(Box::new(left), BinaryOp::And, Box::new(right));
        }

        Ok(left)
    }

    fn parse_equality_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_relational_expr()?;

        loop {
            let op = match self.current {
                Token::Eq => BinaryOp::Eq,
                Token::NotEq => BinaryOp::NotEq,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_relational_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }

        Ok(left)
    }

    fn parse_relational_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_additive_expr()?;

        loop {
            let op = match self.current {
                Token::Lt => BinaryOp::Lt,
                Token::LtEq => BinaryOp::LtEq,
                Token::Gt => BinaryOp::Gt,
                Token::GtEq => BinaryOp::GtEq,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_additive_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }

        Ok(left)
    }

    fn parse_additive_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_multiplicative_expr()?;

        loop {
            let op = match self.current {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_multiplicative_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }

        Ok(left)
    }

    fn parse_multiplicative_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_unary_expr()?;

        loop {
            let op = match self.current {
                Token::Star => BinaryOp::Mul,
                Token::Div => BinaryOp::Div,
                Token::Mod => BinaryOp::Mod,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_unary_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }

        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> Result<Expr, XPathError> {
        if self.current == Token::Minus {
            self.advance()?;
            let expr = self.nested(Self::parse_unary_expr)?;
            Ok(Expr::Negate(Box::new(expr)))
        } else {
            self.parse_union_expr()
        }
    }

    fn parse_union_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_path_expr()?;

        while self.current == Token::Pipe {
            self.advance()?;
            let right = self.parse_path_expr()?;
            left = Expr::Union(Box::new(left), Box::new(right));
        }

        Ok(left)
    }

    /// True when the current token can begin a location step
    fn at_step_start(&self) -> bool {
        matches!(
            self.current,
            Token::Name(_)
                | Token::NameTest(_)
                | Token::NodeType(_)
                | Token::Star
                | Token::At
                | Token::Dot
                | Token::DoubleDot
                | Token::Axis(_)
        )
    }

    fn parse_path_expr(&mut self) -> Result<Expr, XPathError> {
        let expr = match self.current {
            Token::Slash => {
                self.advance()?;
                if !self.at_step_start() {
                    // Just /
                    return Ok(Expr::Root);
                }
                let step = self.parse_step()?;
                Expr::Path(Box::new(Expr::Root), step)
            }
            Token::DoubleSlash => {
                self.advance()?;
                let step = self.parse_step()?;
                Expr::Path(Box::new(descendant_or_self(Expr::Root)), step)
            }
            _ if self.at_step_start() => Expr::Step(self.parse_step()?),
            _ => self.parse_filter_expr()?,
        };

        self.parse_path_continuation(expr)
    }

    /// Trailing `/step` and `//step` segments
    fn parse_path_continuation(&mut self, mut expr: Expr) -> Result<Expr, XPathError> {
        loop {
            match self.current {
                Token::Slash => {
                    self.advance()?;
                    let step = self.parse_step()?;
                    expr = Expr::Path(Box::new(expr), step);
                }
                Token::DoubleSlash => {
                    self.advance()?;
                    let step = self.parse_step()?;
                    expr = Expr::Path(Box::new(descendant_or_self(expr)), step);
                }
                _ => return Ok(expr),
            }
        }
    }

    /// Primary expression followed by predicates
    fn parse_filter_expr(&mut self) -> Result<Expr, XPathError> {
        let mut expr = self.parse_primary_expr()?;

        while self.current == Token::LeftBracket {
            let pred = self.parse_predicate()?;
            expr = Expr::Filter(Box::new(expr), Box::new(pred));
        }

        Ok(expr)
    }

    fn parse_predicate(&mut self) -> Result<Expr, XPathError> {
        self.expect(Token::LeftBracket, "'['")?;
        let pred = self.nested(Self::parse_expr)?;
        self.expect(Token::RightBracket, "']'")?;
        Ok(pred)
    }

    fn parse_primary_expr(&mut self) -> Result<Expr, XPathError> {
        match &self.current {
            Token::Number(n) => {
                let n = *n;
                self.advance()?;
                Ok(Expr::Number(n))
            }
            Token::String(s) => {
                let s = s.clone();
                self.advance()?;
                Ok(Expr::String(s))
            }
            Token::Dollar => {
                self.advance()?;
                match &self.current {
                    Token::Name(name) | Token::NameTest(name) => {
                        let name = name.clone();
                        self.advance()?;
                        Ok(Expr::Variable(name))
                    }
                    _ => Err(self.error("expected variable name")),
                }
            }
            Token::LeftParen => {
                self.advance()?;
                let expr = self.nested(Self::parse_expr)?;
                self.expect(Token::RightParen, "')'")?;
                Ok(expr)
            }
            Token::FunctionName(name) => {
                let name = name.clone();
                self.advance()?;
                self.expect(Token::LeftParen, "'('")?;
                let args = self.nested(Self::parse_function_args)?;
                Ok(Expr::Function(name, args))
            }
            Token::Eof => Err(self.error("unexpected end of expression")),
            other => Err(self.error(format!("unexpected {:?}", other))),
        }
    }

    /// Parse a location step, including abbreviated forms
    fn parse_step(&mut self) -> Result<Step, XPathError> {
        let axis = match &self.current {
            Token::Dot => {
                self.advance()?;
                return Ok(Step::bare(Axis::Self_, NodeTest::Node));
            }
            Token::DoubleDot => {
                self.advance()?;
                return Ok(Step::bare(Axis::Parent, NodeTest::Node));
            }
            Token::At => {
                self.advance()?;
                Axis::Attribute
            }
            Token::Axis(name) => {
                let axis = Axis::from_name(name)
                    .ok_or_else(|| self.error(format!("unknown axis '{}'", name)))?;
                self.advance()?;
                self.expect(Token::DoubleColon, "'::'")?;
                axis
            }
            _ => Axis::Child,
        };

        let node_test = self.parse_node_test()?;

        let mut predicates = Vec::new();
        while self.current == Token::LeftBracket {
            predicates.push(self.parse_predicate()?);
        }

        Ok(Step {
            axis,
            node_test,
            predicates,
        })
    }

    fn parse_node_test(&mut self) -> Result<NodeTest, XPathError> {
        let test = match &self.current {
            Token::Star => NodeTest::Any,
            Token::Name(name) => NodeTest::Name(name.clone()),
            Token::NameTest(qname) => match qname.split_once(':') {
                Some((prefix, "*")) => NodeTest::NamespaceWildcard(prefix.to_string()),
                Some((prefix, local)) => NodeTest::QName(prefix.to_string(), local.to_string()),
                None => NodeTest::Name(qname.clone()),
            },
            Token::NodeType(name) => {
                let name = name.clone();
                self.advance()?;
                self.expect(Token::LeftParen, "'('")?;
                let arg = match &self.current {
                    Token::String(s) if name == "processing-instruction" => {
                        let s = s.clone();
                        self.advance()?;
                        Some(s)
                    }
                    _ => None,
                };
                self.expect(Token::RightParen, "')'")?;

                return Ok(match name.as_str() {
                    "text" => NodeTest::Text,
                    "comment" => NodeTest::Comment,
                    "processing-instruction" => NodeTest::ProcessingInstruction(arg),
                    _ => NodeTest::Node,
                });
            }
            Token::Eof => return Err(self.error("unexpected end of expression")),
            other => return Err(self.error(format!("expected node test, got {:?}", other))),
        };
        self.advance()?;
        Ok(test)
    }

    fn parse_function_args(&mut self) -> Result<Vec<Expr>, XPathError> {
        let mut args = Vec::new();

        if self.current != Token::RightParen {
            args.push(self.parse_expr()?);

            while self.current == Token::Comma {
                self.advance()?;
                args.push(self.parse_expr()?);
            }
        }

        self.expect(Token::RightParen, "')'")?;
        Ok(args)
    }
}

/// `base/descendant-or-self::node()`
fn descendant_or_self(base: Expr) -> Expr {
    Expr::Path(
        Box::new(base),
        Step::bare(Axis::DescendantOrSelf, NodeTest::Node),
    )
}

/// Parse an XPath expression string
pub fn parse(input: &str) -> Result<Expr, XPathError> {
    Parser::new(input)?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_path() {
        let expr = parse("/root/child").unwrap();
        match expr {
            Expr::Path(base, step) => {
                assert!(matches!(*base, Expr::Path(..)));
                assert_eq!(step.node_test, NodeTest::Name("child".to_string()));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_predicate_attaches_to_step() {
        let expr = parse("item[@id='test']").unwrap();
        match expr {
            Expr::Step(step) => {
                assert_eq!(step.axis, Axis::Child);
                assert_eq!(step.predicates.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_abbreviations() {
        let Expr::Path(_, step) = parse("a/..").unwrap() else {
            panic!("expected path");
        };
        assert_eq!(step.axis, Axis::Parent);
        assert_eq!(step.node_test, NodeTest::Node);

        let Expr::Step(step) = parse(".").unwrap() else {
            panic!("expected step");
        };
        assert_eq!(step.axis, Axis::Self_);

        let Expr::Path(_, step) = parse("//@href").unwrap() else {
            panic!("expected path");
        };
        assert_eq!(step.axis, Axis::Attribute);
    }

    #[test]
    fn test_keyword_element_names() {
        let Expr::Path(_, step) = parse("//div").unwrap() else {
            panic!("expected path");
        };
        assert_eq!(step.node_test, NodeTest::Name("div".to_string()));
        assert!(matches!(parse("6 div 2").unwrap(), Expr::Binary(_, BinaryOp::Div, _)));
    }

    #[test]
    fn test_function() {
        let expr = parse("count(//item)").unwrap();
        assert!(matches!(expr, Expr::Function(name, args) if name == "count" && args.len() == 1));
    }

    #[test]
    fn test_filter_on_parenthesized() {
        assert!(matches!(parse("(//a)[1]").unwrap(), Expr::Filter(..)));
    }

    #[test]
    fn test_syntax_errors() {
        for bad in ["//[", "/root/", "a b", "count(", "child::", "foo::a", "a[1", ""] {
            assert!(
                matches!(parse(bad), Err(XPathError::Syntax { .. })),
                "expected syntax error for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_nesting_limit() {
        let nested = format!("{}1{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert!(matches!(parse(&nested).unwrap(), Expr::Number(_)));

        let too_deep = format!("{}1{}", "(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
        assert!(matches!(
            parse(&too_deep),
            Err(XPathError::Syntax { message, .. }) if message == "expression nested too deeply"
        ));

        for bad in ["(".repeat(100_000), "//a[".repeat(10_000), "-".repeat(10_000), "f(".repeat(10_000)] {
            assert!(matches!(parse(&bad), Err(XPathError::Syntax { .. })));
        }
    }

    #[test]
    fn test_token_limit() {
        let chain = vec!["1"; MAX_TOKENS / 2].join("+");
        assert!(matches!(parse(&chain).unwrap(), Expr::Binary(..)));

        let long = vec!["1"; 100_000].join("+");
        assert!(matches!(
            parse(&long),
            Err(XPathError::Syntax { message, .. }) if message == "expression too long"
        ));
        assert!(parse(&"a/".repeat(50_000)).is_err());
    }
}
