//! XML Document - Arena-based DOM representation
//!
//! Nodes live in one `Vec` and reference each other by `NodeRef`. The
//! document node sits at index 0 and nodes are appended in document order,
//! which keeps "sort by ref" equivalent to "sort by document position".

use super::namespace::ScopedNamespaces;
use super::node::{NodeData, NodeKind, NodeRef, XmlAttribute, XmlNode, DOCUMENT_NODE};
use crate::core::attributes::Attribute;
use crate::core::scanner::is_whitespace;
use crate::core::tokenizer::{Spanned, Token, Tokenizer};
use crate::core::ParseError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A parsed, immutable XML document
#[derive(Debug)]
pub struct XmlDocument {
    nodes: Vec<XmlNode>,
    /// Root element node ref (not the document node)
    root_element: Option<NodeRef>,
}

impl XmlDocument {
    /// Parse a UTF-8 document, rejecting anything that is not well-formed
    pub fn parse(input: &[u8]) -> Result<Self, ParseError> {
        let text = decode_input(input)?;

        let mut doc = XmlDocument {
            nodes: Vec::with_capacity(256),
            root_element: None,
        };
        doc.nodes.push(XmlNode::new(NodeData::Document, None));
        doc.build_from_tokens(text)?;

        tracing::debug!("Parsed {} nodes", doc.nodes.len());
        Ok(doc)
    }

    /// Build the node arena from the token stream
    fn build_from_tokens(&mut self, input: &str) -> Result<(), ParseError> {
        let mut stack: Vec<NodeRef> = vec![DOCUMENT_NODE];
        let mut tag_stack: Vec<(&str, usize)> = Vec::new();
        let mut namespaces = ScopedNamespaces::new();

        for spanned in Tokenizer::new(input) {
            let Spanned { token, start } = spanned?;
            let parent = stack.last().copied().unwrap_or(DOCUMENT_NODE);
            let at_document_level = stack.len() == 1;

            match token {
                Token::XmlDeclaration => {}

                Token::DocType => {
                    if self.root_element.is_some() {
                        return Err(ParseError::at(input, "DOCTYPE must come before root element", start));
                    }
                }

                Token::StartTag {
                    name,
                    attributes,
                    self_closing,
                } => {
                    if at_document_level && self.root_element.is_some() {
                        return Err(ParseError::at(input, "Document has multiple root elements", start));
                    }
                    if let Some(dup) = find_duplicate_attribute(&attributes) {
                        return Err(ParseError::at(input, format!("Duplicate attribute: {}", dup), start));
                    }

                    namespaces.push_scope();
                    for attr in &attributes {
                        if let Some(prefix) = attr.declared_prefix() {
                            namespaces.declare(prefix, &attr.value);
                        }
                    }

                    let namespace = namespaces.resolve_element(name).map(str::to_string);
                    if let Some((prefix, _)) = name.split_once(':') {
                        if namespace.is_none() {
                            return Err(ParseError::at(
                                input,
                                format!("Unbound namespace prefix: {}", prefix),
                                start,
                            ));
                        }
                    }

                    let id = self.append(
                        parent,
                        NodeData::Element {
                            name: name.to_string(),
                            namespace,
                            attributes: attributes
                                .into_iter()
                                .map(|a| XmlAttribute::new(a.name, a.value))
                                .collect(),
                        },
                    );
                    if at_document_level {
                        self.root_element = Some(id);
                    }

                    if self_closing {
                        namespaces.pop_scope();
                    } else {
                        stack.push(id);
                        tag_stack.push((name, start));
                    }
                }

                Token::EndTag { name } => {
                    match tag_stack.pop() {
                        Some((open, _)) if open == name => {}
                        Some((open, _)) => {
                            return Err(ParseError::at(
                                input,
                                format!("Tag mismatch: <{}> closed with </{}>", open, name),
                                start,
                            ));
                        }
                        None => {
                            return Err(ParseError::at(
                                input,
                                format!("Unexpected end tag: </{}> without matching start tag", name),
                                start,
                            ));
                        }
                    }
                    stack.pop();
                    namespaces.pop_scope();
                }

                Token::Text(content) => {
                    if at_document_level {
                        if !content.bytes().all(is_whitespace) {
                            return Err(ParseError::at(input, "Text content not allowed at document level", start));
                        }
                        continue;
                    }
                    self.append(parent, NodeData::Text(content.into_owned()));
                }

                Token::CData(content) => {
                    if at_document_level {
                        return Err(ParseError::at(input, "CDATA section not allowed at document level", start));
                    }
                    self.append(parent, NodeData::CData(content.to_string()));
                }

                Token::Comment(content) => {
                    self.append(parent, NodeData::Comment(content.to_string()));
                }

                Token::ProcessingInstruction { target, data } => {
                    self.append(
                        parent,
                        NodeData::ProcessingInstruction {
                            target: target.to_string(),
                            data: data.to_string(),
                        },
                    );
                }
            }
        }

        if let Some(&(open, start)) = tag_stack.last() {
            return Err(ParseError::at(input, format!("Unclosed tag: <{}>", open), start));
        }
        if self.root_element.is_none() {
            return Err(ParseError::at(input, "Document has no root element", input.len()));
        }

        Ok(())
    }

    fn append(&mut self, parent: NodeRef, data: NodeData) -> NodeRef {
        let id = self.nodes.len() as NodeRef;
        self.nodes.push(XmlNode::new(data, Some(parent)));
        if let Some(p) = self.nodes.get_mut(parent as usize) {
            p.children.push(id);
        }
        id
    }

    /// Get a node by ref
    #[inline]
    pub fn node(&self, id: NodeRef) -> Option<&XmlNode> {
        self.nodes.get(id as usize)
    }

    /// Get total number of nodes (including the document node)
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn document_node(&self) -> NodeRef {
        DOCUMENT_NODE
    }

    /// Get root element ref
    #[inline]
    pub fn root_element(&self) -> Option<NodeRef> {
        self.root_element
    }

    pub fn kind(&self, id: NodeRef) -> Option<NodeKind> {
        self.node(id).map(XmlNode::kind)
    }

    #[inline]
    pub fn is_element(&self, id: NodeRef) -> bool {
        self.node(id).is_some_and(XmlNode::is_element)
    }

    pub fn children(&self, id: NodeRef) -> &[NodeRef] {
        self.node(id).map_or(&[], |n| n.children.as_slice())
    }

    pub fn parent(&self, id: NodeRef) -> Option<NodeRef> {
        self.node(id)?.parent
    }

    /// Iterate over ancestors, nearest first (excludes `id`)
    pub fn ancestors(&self, id: NodeRef) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// Iterate over all descendants of a node in document order (excludes `id`)
    pub fn descendants(&self, id: NodeRef) -> Descendants<'_> {
        let stack = self.children(id).iter().rev().copied().collect();
        Descendants { doc: self, stack }
    }

    /// Parent and position of `id` among its siblings
    pub fn sibling_position(&self, id: NodeRef) -> Option<(NodeRef, usize)> {
        let parent = self.parent(id)?;
        let index = self.children(parent).iter().position(|&c| c == id)?;
        Some((parent, index))
    }

    /// XPath 1.0 string-value of a node
    pub fn string_value(&self, id: NodeRef) -> String {
        let Some(node) = self.node(id) else {
            return String::new();
        };
        match &node.data {
            NodeData::Document | NodeData::Element { .. } => {
                let mut result = String::new();
                for d in self.descendants(id) {
                    if let Some(NodeData::Text(s) | NodeData::CData(s)) = self.node(d).map(|n| &n.data) {
                        result.push_str(s);
                    }
                }
                result
            }
            _ => node.value().unwrap_or_default().to_string(),
        }
    }

    /// Absolute element path (`/root/child/leaf`) of a node, memoized on the node
    pub fn xpath_of(&self, id: NodeRef) -> Option<&str> {
        let node = self.node(id)?;
        Some(node.xpath_cell().get_or_init(|| self.create_xpath(id)).as_str())
    }

    fn create_xpath(&self, id: NodeRef) -> String {
        let mut names: Vec<&str> = std::iter::once(id)
            .chain(self.ancestors(id))
            .filter_map(|n| self.node(n))
            .filter(|n| n.is_element())
            .map(XmlNode::name)
            .collect();
        names.reverse();
        format!("/{}", names.join("/"))
    }

    /// True when the memoized path has already been computed
    #[cfg(test)]
    pub(crate) fn has_cached_xpath(&self, id: NodeRef) -> bool {
        self.node(id).is_some_and(|n| n.xpath_cell().get().is_some())
    }
}

/// Iterator over ancestors, nearest first
pub struct Ancestors<'a> {
    doc: &'a XmlDocument,
    next: Option<NodeRef>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeRef;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

/// Pre-order iterator over descendant nodes
pub struct Descendants<'a> {
    doc: &'a XmlDocument,
    stack: Vec<NodeRef>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeRef;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(current).iter().rev().copied());
        Some(current)
    }
}

/// Strip a UTF-8 BOM and validate the encoding
fn decode_input(input: &[u8]) -> Result<&str, ParseError> {
    let input = input.strip_prefix(UTF8_BOM).unwrap_or(input);
    std::str::from_utf8(input).map_err(|e| {
        let valid = std::str::from_utf8(&input[..e.valid_up_to()]).unwrap_or_default();
        ParseError::at(valid, "Invalid UTF-8 sequence", valid.len())
    })
}

/// Find duplicate attribute name
fn find_duplicate_attribute<'a>(attrs: &[Attribute<'a>]) -> Option<&'a str> {
    attrs
        .iter()
        .enumerate()
        .find(|(i, a)| attrs[..*i].iter().any(|b| b.name == a.name))
        .map(|(_, a)| a.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> XmlDocument {
        XmlDocument::parse(input.as_bytes()).unwrap()
    }

    fn parse_err(input: &str) -> ParseError {
        XmlDocument::parse(input.as_bytes()).unwrap_err()
    }

    #[test]
    fn test_basic_structure() {
        let doc = parse("<?xml version=\"1.0\"?>\n<root a=\"1\"><child>text</child><!--c--></root>\n");
        let root = doc.root_element().unwrap();
        assert_eq!(doc.node(root).unwrap().name(), "root");
        assert_eq!(doc.children(DOCUMENT_NODE), &[root]);
        assert_eq!(doc.children(root).len(), 2);
        assert_eq!(doc.node(root).unwrap().attribute("a"), Some("1"));
        assert_eq!(doc.string_value(root), "text");
    }

    #[test]
    fn test_document_order_refs() {
        let doc = parse("<r><a><b/></a><c/></r>");
        let root = doc.root_element().unwrap();
        let names: Vec<&str> = doc
            .descendants(root)
            .map(|n| doc.node(n).unwrap().name())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        let refs: Vec<NodeRef> = doc.descendants(root).collect();
        assert!(refs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_ancestors_and_xpath() {
        let doc = parse("<r><a><b>hi</b></a></r>");
        let b = doc
            .descendants(DOCUMENT_NODE)
            .find(|&n| doc.node(n).unwrap().name() == "b")
            .unwrap();
        let text = doc.children(b)[0];
        assert_eq!(doc.ancestors(b).count(), 3);
        assert!(!doc.has_cached_xpath(b));
        assert_eq!(doc.xpath_of(b), Some("/r/a/b"));
        assert!(doc.has_cached_xpath(b));
        assert_eq!(doc.xpath_of(text), Some("/r/a/b"));
        assert_eq!(doc.xpath_of(DOCUMENT_NODE), Some("/"));
    }

    #[test]
    fn test_namespaces_resolved() {
        let doc = parse("<r xmlns=\"urn:d\" xmlns:p=\"urn:p\"><p:x/><y xmlns=\"\"/></r>");
        let root = doc.root_element().unwrap();
        let kids = doc.children(root);
        assert_eq!(doc.node(root).unwrap().namespace_uri(), Some("urn:d"));
        assert_eq!(doc.node(kids[0]).unwrap().namespace_uri(), Some("urn:p"));
        assert_eq!(doc.node(kids[1]).unwrap().namespace_uri(), None);
    }

    #[test]
    fn test_whitespace_text_preserved_inside_elements() {
        let doc = parse("<r>\n  <a/>\n</r>");
        let root = doc.root_element().unwrap();
        assert_eq!(doc.children(root).len(), 3);
        assert!(doc.node(doc.children(root)[0]).unwrap().is_text());
    }

    #[test]
    fn test_bom_skipped() {
        let doc = XmlDocument::parse(b"\xEF\xBB\xBF<r/>").unwrap();
        assert!(doc.root_element().is_some());
    }

    #[test]
    fn test_well_formedness_errors() {
        assert!(parse_err("<a><b></a>").message.contains("Tag mismatch"));
        assert!(parse_err("<a>").message.contains("Unclosed tag"));
        assert!(parse_err("<a/><b/>").message.contains("multiple root"));
        assert!(parse_err("</a>").message.contains("Unexpected end tag"));
        assert!(parse_err("text<a/>").message.contains("document level"));
        assert!(parse_err("<a x=\"1\" x=\"2\"/>").message.contains("Duplicate attribute"));
        assert!(parse_err("<p:a/>").message.contains("Unbound namespace prefix"));
        assert!(parse_err("").message.contains("no root element"));
        assert!(parse_err("<!-- only -->").message.contains("no root element"));
    }

    #[test]
    fn test_error_position() {
        let err = parse_err("<root>\n  <a></b>\n</root>");
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 6);
    }

    #[test]
    fn test_invalid_utf8() {
        let err = XmlDocument::parse(b"<r>\xFF</r>").unwrap_err();
        assert!(err.message.contains("UTF-8"));
        assert_eq!(err.position, 3);
    }
}
