//! XML Node representation
//!
//! Uses NodeRef (u32) for compact, cache-friendly node references. Nodes
//! are allocated in document order, so comparing two refs compares their
//! position in the document.

use std::cell::OnceCell;

/// Compact node reference (index into the document arena)
pub type NodeRef = u32;

/// The document node always occupies the first arena slot
pub const DOCUMENT_NODE: NodeRef = 0;

/// Type of XML node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Element,
    Text,
    CData,
    Comment,
    ProcessingInstruction,
}

/// Stored attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: String,
    pub value: String,
}

impl XmlAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        XmlAttribute {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Name without namespace prefix
    pub fn local_name(&self) -> &str {
        self.name.split_once(':').map_or(&self.name, |(_, local)| local)
    }

    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// True for `xmlns` and `xmlns:*` declarations
    pub fn is_namespace_declaration(&self) -> bool {
        self.name == "xmlns" || self.name.starts_with("xmlns:")
    }

    /// Attributes the viewer itself attaches for bookkeeping
    pub fn is_internal(&self) -> bool {
        self.name.starts_with("data-xv-")
    }
}

/// Node payload, one variant per node kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Document,
    Element {
        name: String,
        /// Resolved namespace URI
        namespace: Option<String>,
        attributes: Vec<XmlAttribute>,
    },
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction {
        target: String,
        data: String,
    },
}

/// An XML node in the arena
#[derive(Debug)]
pub struct XmlNode {
    pub data: NodeData,
    /// Parent node (None for the document node)
    pub parent: Option<NodeRef>,
    pub children: Vec<NodeRef>,
    /// Absolute element path, computed on first request
    xpath: OnceCell<String>,
}

impl XmlNode {
    pub fn new(data: NodeData, parent: Option<NodeRef>) -> Self {
        XmlNode {
            data,
            parent,
            children: Vec::new(),
            xpath: OnceCell::new(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self.data {
            NodeData::Document => NodeKind::Document,
            NodeData::Element { .. } => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::CData(_) => NodeKind::CData,
            NodeData::Comment(_) => NodeKind::Comment,
            NodeData::ProcessingInstruction { .. } => NodeKind::ProcessingInstruction,
        }
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element { .. })
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    /// DOM-style node name: tag name, PI target or a `#kind` marker
    pub fn name(&self) -> &str {
        match &self.data {
            NodeData::Document => "#document",
            NodeData::Element { name, .. } => name,
            NodeData::Text(_) => "#text",
            NodeData::CData(_) => "#cdata-section",
            NodeData::Comment(_) => "#comment",
            NodeData::ProcessingInstruction { target, .. } => target,
        }
    }

    /// Element name without prefix
    pub fn local_name(&self) -> &str {
        let name = self.name();
        match &self.data {
            NodeData::Element { .. } => name.split_once(':').map_or(name, |(_, local)| local),
            _ => name,
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        match &self.data {
            NodeData::Element { name, .. } => name.split_once(':').map(|(prefix, _)| prefix),
            _ => None,
        }
    }

    pub fn namespace_uri(&self) -> Option<&str> {
        match &self.data {
            NodeData::Element { namespace, .. } => namespace.as_deref(),
            _ => None,
        }
    }

    pub fn attributes(&self) -> &[XmlAttribute] {
        match &self.data {
            NodeData::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// Get attribute value by name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes()
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Character content of text, CDATA, comment and PI nodes
    pub fn value(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(s) | NodeData::CData(s) | NodeData::Comment(s) => Some(s),
            NodeData::ProcessingInstruction { data, .. } => Some(data),
            NodeData::Document | NodeData::Element { .. } => None,
        }
    }

    pub(crate) fn xpath_cell(&self) -> &OnceCell<String> {
        &self.xpath
    }
}
