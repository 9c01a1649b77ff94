//! Flat search index
//!
//! One entry per element in document order: the lowercased element name
//! followed by each visible attribute's name and value, space separated.

use crate::dom::{NodeRef, XmlDocument};

/// Searchable text of one element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEntry {
    pub node: NodeRef,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct SearchIndex {
    entries: Vec<SearchEntry>,
}

impl SearchIndex {
    /// Pre-order walk over the elements under (and including) the root element
    pub fn build(doc: &XmlDocument) -> Self {
        let Some(root) = doc.root_element() else {
            return SearchIndex::default();
        };

        let entries = std::iter::once(root)
            .chain(doc.descendants(root))
            .filter_map(|id| {
                let node = doc.node(id).filter(|n| n.is_element())?;
                let mut text = node.name().to_string();
                for attr in node.attributes().iter().filter(|a| !a.is_internal()) {
                    text.push(' ');
                    text.push_str(&attr.name);
                    text.push(' ');
                    text.push_str(&attr.value);
                }
                Some(SearchEntry {
                    node: id,
                    text: text.to_lowercase(),
                })
            })
            .collect();

        SearchIndex { entries }
    }

    pub fn entries(&self) -> &[SearchEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
