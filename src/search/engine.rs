//! Search Engine
//!
//! Answers substring queries from the flat index and XPath queries through
//! an `XPathEvaluator`. Every node result resolves back to an original node
//! and carries the label shown in the result list.

use super::index::SearchIndex;
use super::query::{classify, normalize, QueryKind};
use crate::dom::{NamespaceMap, NodeRef, XmlDocument, XmlNode};
use crate::xpath::{CachedEvaluator, XPathEvaluator, XPathNode, XPathValue};
use memchr::memmem;
use tracing::debug;

/// Result cap for both query kinds
pub const MAX_RESULTS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Substring,
    XPathNode,
}

/// A search hit on an original node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeMatch {
    pub node: NodeRef,
    pub kind: MatchKind,
    /// `name` or `name[@attr]`
    pub label: String,
    /// Character range of the query inside `label`
    pub highlight: Option<(usize, usize)>,
    /// Absolute element path of `node`
    pub xpath: String,
}

/// Non node-set XPath result
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    String(String),
    Number(f64),
    Boolean(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchResult {
    Node(NodeMatch),
    Scalar(ScalarValue),
}

impl SearchResult {
    /// Original node a result points at, `None` for scalars
    pub fn node(&self) -> Option<NodeRef> {
        match self {
            SearchResult::Node(m) => Some(m.node),
            SearchResult::Scalar(_) => None,
        }
    }
}

/// Query as run plus its results; `results` is `None` when nothing matched
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub query: String,
    pub results: Option<Vec<SearchResult>>,
}

impl SearchOutcome {
    pub fn len(&self) -> usize {
        self.results.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_none()
    }
}

/// Substring and XPath search over one document
pub struct SearchEngine<E = CachedEvaluator> {
    index: SearchIndex,
    namespaces: NamespaceMap,
    evaluator: E,
}

impl SearchEngine<CachedEvaluator> {
    pub fn new(doc: &XmlDocument) -> Self {
        Self::with_evaluator(doc, CachedEvaluator::default())
    }
}

impl<E: XPathEvaluator> SearchEngine<E> {
    pub fn with_evaluator(doc: &XmlDocument, evaluator: E) -> Self {
        SearchEngine {
            index: SearchIndex::build(doc),
            namespaces: NamespaceMap::from_document(doc),
            evaluator,
        }
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    pub fn namespaces(&self) -> &NamespaceMap {
        &self.namespaces
    }

    /// Run a query. Substring queries are matched case-insensitively;
    /// XPath queries are evaluated verbatim.
    pub fn search(&mut self, doc: &XmlDocument, query: &str) -> SearchOutcome {
        let query = normalize(query);
        if query.is_empty() {
            return SearchOutcome { query, results: None };
        }

        let kind = classify(&query);
        let results = match kind {
            QueryKind::Substring => self.substring(doc, &query),
            QueryKind::XPath => self.xpath(doc, &query),
        };

        debug!(query = %query, kind = ?kind, results = results.len(), "search");
        SearchOutcome {
            query,
            results: (!results.is_empty()).then_some(results),
        }
    }

    fn substring(&self, doc: &XmlDocument, query: &str) -> Vec<SearchResult> {
        let finder = memmem::Finder::new(query.as_bytes());
        let query_len = query.chars().count();

        self.index
            .entries()
            .iter()
            .filter_map(|entry| {
                let offset = finder.find(entry.text.as_bytes())?;
                let offset = entry.text[..offset].chars().count();
                let node = doc.node(entry.node)?;
                let (label, highlight) = substring_label(node, query, offset, query_len);
                Some(SearchResult::Node(NodeMatch {
                    node: entry.node,
                    kind: MatchKind::Substring,
                    label,
                    highlight,
                    xpath: xpath_string(doc, entry.node),
                }))
            })
            .take(MAX_RESULTS)
            .collect()
    }

    fn xpath(&mut self, doc: &XmlDocument, query: &str) -> Vec<SearchResult> {
        let value = match self.evaluator.evaluate(doc, &self.namespaces, query) {
            Ok(value) => value,
            Err(e) => {
                debug!(query = %query, error = %e, "xpath query produced no results");
                return Vec::new();
            }
        };

        match value {
            XPathValue::NodeSet(nodes) => nodes
                .into_iter()
                .filter_map(|member| xpath_match(doc, member))
                .take(MAX_RESULTS)
                .map(SearchResult::Node)
                .collect(),
            XPathValue::String(s) => vec![SearchResult::Scalar(ScalarValue::String(s))],
            XPathValue::Number(n) => vec![SearchResult::Scalar(ScalarValue::Number(n))],
            XPathValue::Boolean(b) => vec![SearchResult::Scalar(ScalarValue::Boolean(b))],
        }
    }
}

fn xpath_string(doc: &XmlDocument, node: NodeRef) -> String {
    doc.xpath_of(node).unwrap_or_default().to_string()
}

/// Label and highlight for a substring hit at character `offset` of the
/// lowercased entry. Offsets are mapped back onto the original spelling,
/// whose characters may lowercase to more than one character.
fn substring_label(node: &XmlNode, query: &str, offset: usize, query_len: usize) -> (String, Option<(usize, usize)>) {
    let name = node.name();
    let name_len = name.chars().count();
    if offset < lowered_len(name) {
        let start = unlowered_floor(name, offset);
        let end = unlowered_ceil(name, offset + query_len).min(name_len);
        return (name.to_string(), Some((start, end)));
    }

    let hit = node.attributes().iter().filter(|a| !a.is_internal()).find_map(|a| {
        let lowered = a.name.to_lowercase();
        let pos = lowered.find(query)?;
        Some((a, lowered[..pos].chars().count()))
    });

    match hit {
        Some((attr, pos)) => {
            let base = name_len + 2;
            let start = base + unlowered_floor(&attr.name, pos);
            let end = base + unlowered_ceil(&attr.name, pos + query_len);
            (format!("{}[@{}]", name, attr.name), Some((start, end)))
        }
        None => (name.to_string(), None),
    }
}

fn lowered_len(original: &str) -> usize {
    original.chars().map(|c| c.to_lowercase().count()).sum()
}

/// Index of the `original` char whose lowercase form contains lowered char `at`
fn unlowered_floor(original: &str, at: usize) -> usize {
    let mut seen = 0;
    for (i, c) in original.chars().enumerate() {
        seen += c.to_lowercase().count();
        if seen > at {
            return i;
        }
    }
    original.chars().count()
}

/// Number of `original` chars needed to cover the first `at` lowered chars
fn unlowered_ceil(original: &str, at: usize) -> usize {
    let mut seen = 0;
    for (i, c) in original.chars().enumerate() {
        if seen >= at {
            return i;
        }
        seen += c.to_lowercase().count();
    }
    original.chars().count()
}

fn xpath_match(doc: &XmlDocument, member: XPathNode) -> Option<NodeMatch> {
    let (node, label) = match member {
        XPathNode::Node(id) => (id, doc.node(id)?.name().to_string()),
        XPathNode::Attribute(owner, index) => {
            let element = doc.node(owner)?;
            let attr = element.attributes().get(usize::from(index))?;
            (owner, format!("{}[@{}]", element.name(), attr.name))
        }
    };
    Some(NodeMatch {
        node,
        kind: MatchKind::XPathNode,
        label,
        highlight: None,
        xpath: xpath_string(doc, node),
    })
}
