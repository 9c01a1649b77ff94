//! XPath Value Types
//!
//! XPath 1.0 has four data types: node-set, boolean, number, and string.
//! Attributes are not arena nodes, so node-set members address them as
//! (owner element, attribute index).

use crate::dom::{NodeRef, XmlDocument};

/// A member of a node-set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum XPathNode {
    /// A document, element, text, comment or PI node
    Node(NodeRef),
    /// Attribute `index` of element `owner`
    Attribute(NodeRef, u16),
}

impl XPathNode {
    /// Sort key giving document order; attributes follow their owner
    #[inline]
    pub fn order_key(self) -> (NodeRef, u32) {
        match self {
            XPathNode::Node(id) => (id, 0),
            XPathNode::Attribute(owner, index) => (owner, u32::from(index) + 1),
        }
    }

    /// Element or node this member belongs to
    #[inline]
    pub fn owner(self) -> NodeRef {
        match self {
            XPathNode::Node(id) | XPathNode::Attribute(id, _) => id,
        }
    }

    /// XPath string-value
    pub fn string_value(self, doc: &XmlDocument) -> String {
        match self {
            XPathNode::Node(id) => doc.string_value(id),
            XPathNode::Attribute(owner, index) => doc
                .node(owner)
                .and_then(|n| n.attributes().get(usize::from(index)))
                .map(|a| a.value.clone())
                .unwrap_or_default(),
        }
    }
}

/// XPath value types
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum XPathValue {
    /// A set of nodes in document order, no duplicates
    NodeSet(Vec<XPathNode>),
    /// Boolean value
    Boolean(bool),
    /// Floating-point number
    Number(f64),
    /// String value
    String(String),
}

impl XPathValue {
    /// Create an empty node set
    pub fn empty_nodeset() -> Self {
        XPathValue::NodeSet(Vec::new())
    }

    /// Create a node set with a single node
    pub fn single_node(id: NodeRef) -> Self {
        XPathValue::NodeSet(vec![XPathNode::Node(id)])
    }

    /// Convert to boolean (XPath boolean() function semantics)
    pub fn to_boolean(&self) -> bool {
        match self {
            XPathValue::NodeSet(nodes) => !nodes.is_empty(),
            XPathValue::Boolean(b) => *b,
            XPathValue::Number(n) => *n != 0.0 && !n.is_nan(),
            XPathValue::String(s) => !s.is_empty(),
        }
    }

    /// Convert to number (XPath number() function semantics)
    pub fn to_number(&self, doc: &XmlDocument) -> f64 {
        match self {
            XPathValue::NodeSet(_) => string_to_number(&self.to_string_value(doc)),
            XPathValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            XPathValue::Number(n) => *n,
            XPathValue::String(s) => string_to_number(s),
        }
    }

    /// Convert to string (XPath string() function semantics).
    /// A node-set converts to the string-value of its first node.
    pub fn to_string_value(&self, doc: &XmlDocument) -> String {
        match self {
            XPathValue::NodeSet(nodes) => nodes
                .first()
                .map(|n| n.string_value(doc))
                .unwrap_or_default(),
            XPathValue::Boolean(b) => if *b { "true" } else { "false" }.to_string(),
            XPathValue::Number(n) => number_to_string(*n),
            XPathValue::String(s) => s.clone(),
        }
    }

    /// Check if this is a node set
    pub fn is_nodeset(&self) -> bool {
        matches!(self, XPathValue::NodeSet(_))
    }

    /// Get as node set, or None
    pub fn as_nodeset(&self) -> Option<&[XPathNode]> {
        match self {
            XPathValue::NodeSet(nodes) => Some(nodes),
            _ => None,
        }
    }
}

impl Default for XPathValue {
    fn default() -> Self {
        XPathValue::NodeSet(Vec::new())
    }
}

impl From<bool> for XPathValue {
    fn from(b: bool) -> Self {
        XPathValue::Boolean(b)
    }
}

impl From<f64> for XPathValue {
    fn from(n: f64) -> Self {
        XPathValue::Number(n)
    }
}

impl From<String> for XPathValue {
    fn from(s: String) -> Self {
        XPathValue::String(s)
    }
}

impl From<Vec<XPathNode>> for XPathValue {
    fn from(nodes: Vec<XPathNode>) -> Self {
        XPathValue::NodeSet(nodes)
    }
}

/// XPath number(): optional whitespace, optional minus, digits with an
/// optional fraction. Anything else (exponents, `+`, `Infinity`) is NaN.
pub fn string_to_number(s: &str) -> f64 {
    let t = s.trim_matches(|c| matches!(c, ' ' | '\t' | '\n' | '\r'));
    let digits = t.strip_prefix('-').unwrap_or(t);
    let valid = !digits.is_empty()
        && digits != "."
        && digits.bytes().filter(|&b| b == b'.').count() <= 1
        && digits.bytes().all(|b| b.is_ascii_digit() || b == b'.');
    if valid {
        t.parse().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

/// XPath string(): integers print without a fraction, no exponent notation
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_conversion() {
        assert!(XPathValue::single_node(1).to_boolean());
        assert!(!XPathValue::empty_nodeset().to_boolean());
        assert!(XPathValue::Boolean(true).to_boolean());
        assert!(!XPathValue::Number(0.0).to_boolean());
        assert!(!XPathValue::Number(f64::NAN).to_boolean());
        assert!(XPathValue::String("false".to_string()).to_boolean());
        assert!(!XPathValue::String(String::new()).to_boolean());
    }

    #[test]
    fn test_string_to_number() {
        assert_eq!(string_to_number(" 42 "), 42.0);
        assert_eq!(string_to_number("-1.5"), -1.5);
        assert_eq!(string_to_number(".5"), 0.5);
        assert!(string_to_number("abc").is_nan());
        assert!(string_to_number("1e3").is_nan());
        assert!(string_to_number("+1").is_nan());
        assert!(string_to_number("").is_nan());
        assert!(string_to_number("-").is_nan());
    }

    #[test]
    fn test_number_to_string() {
        assert_eq!(number_to_string(42.0), "42");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(3.25), "3.25");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_nodeset_string_value() {
        let doc = XmlDocument::parse(b"<r id=\"7\"><a>x</a><a>y</a></r>").unwrap();
        let root = doc.root_element().unwrap();
        let a = doc.children(root).to_vec();
        let set = XPathValue::NodeSet(vec![XPathNode::Node(a[0]), XPathNode::Node(a[1])]);
        assert_eq!(set.to_string_value(&doc), "x");

        let attr = XPathValue::NodeSet(vec![XPathNode::Attribute(root, 0)]);
        assert_eq!(attr.to_number(&doc), 7.0);
    }

    #[test]
    fn test_order_key_places_attributes_after_owner() {
        assert!(XPathNode::Node(3).order_key() < XPathNode::Attribute(3, 0).order_key());
        assert!(XPathNode::Attribute(3, 5).order_key() < XPathNode::Node(4).order_key());
    }
}
