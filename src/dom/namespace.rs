//! Namespace Resolution
//!
//! Two resolvers live here:
//! - `ScopedNamespaces`: stack-based, follows element scope while the tree
//!   is built so every element gets its in-scope namespace URI.
//! - `NamespaceMap`: flat prefix table gathered from every namespace
//!   declaration in a document, handed to XPath evaluation.

use super::document::XmlDocument;
use std::collections::HashMap;

/// Well-known namespace URIs
pub mod ns {
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";
}

/// Namespace binding (prefix -> URI); the empty prefix is the default namespace
#[derive(Debug, Clone)]
struct NsBinding {
    prefix: String,
    uri: String,
    depth: usize,
}

/// Stack-based namespace resolver
#[derive(Debug)]
pub struct ScopedNamespaces {
    bindings: Vec<NsBinding>,
    depth: usize,
}

impl Default for ScopedNamespaces {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopedNamespaces {
    /// Create a resolver with the `xml` prefix pre-bound
    pub fn new() -> Self {
        ScopedNamespaces {
            bindings: vec![NsBinding {
                prefix: "xml".to_string(),
                uri: ns::XML.to_string(),
                depth: 0,
            }],
            depth: 0,
        }
    }

    /// Enter a new element scope
    pub fn push_scope(&mut self) {
        self.depth += 1;
    }

    /// Leave an element scope, removing any bindings declared in it
    pub fn pop_scope(&mut self) {
        while self.bindings.last().is_some_and(|b| b.depth >= self.depth && b.depth > 0) {
            self.bindings.pop();
        }
        self.depth = self.depth.saturating_sub(1);
    }

    /// Declare a binding for the current scope (`""` declares the default namespace)
    pub fn declare(&mut self, prefix: &str, uri: &str) {
        if prefix == "xml" || prefix == "xmlns" {
            return;
        }
        self.bindings.push(NsBinding {
            prefix: prefix.to_string(),
            uri: uri.to_string(),
            depth: self.depth,
        });
    }

    /// Resolve a prefix, most recent binding first. An empty URI undeclares.
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .find(|b| b.prefix == prefix)
            .map(|b| b.uri.as_str())
            .filter(|uri| !uri.is_empty())
    }

    /// Namespace URI for an element name (`p:name` or unprefixed)
    pub fn resolve_element(&self, name: &str) -> Option<&str> {
        match name.split_once(':') {
            Some((prefix, _)) => self.resolve(prefix),
            None => self.resolve(""),
        }
    }
}

/// Document-wide prefix table, first declaration of a prefix wins
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceMap {
    prefixes: HashMap<String, String>,
}

impl NamespaceMap {
    /// Scan every element of `doc` for `xmlns` / `xmlns:*` attributes
    pub fn from_document(doc: &XmlDocument) -> Self {
        let mut map = NamespaceMap::default();
        map.insert("xml", ns::XML);

        let Some(root) = doc.root_element() else {
            return map;
        };

        for id in std::iter::once(root).chain(doc.descendants(root)) {
            let Some(node) = doc.node(id) else { continue };
            for attr in node.attributes() {
                if attr.name == "xmlns" {
                    map.insert("", &attr.value);
                } else if let Some(prefix) = attr.name.strip_prefix("xmlns:") {
                    map.insert(prefix, &attr.value);
                }
            }
        }
        map
    }

    fn insert(&mut self, prefix: &str, uri: &str) {
        self.prefixes
            .entry(prefix.to_string())
            .or_insert_with(|| uri.to_string());
    }

    /// Resolve a prefix; `""` looks up the first default namespace
    pub fn lookup(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xml_prefix_prebound() {
        let resolver = ScopedNamespaces::new();
        assert_eq!(resolver.resolve("xml"), Some(ns::XML));
        assert_eq!(resolver.resolve(""), None);
    }

    #[test]
    fn test_scope_pop() {
        let mut resolver = ScopedNamespaces::new();
        resolver.push_scope();
        resolver.declare("foo", "http://example.com/foo");
        assert_eq!(resolver.resolve_element("foo:bar"), Some("http://example.com/foo"));

        resolver.pop_scope();
        assert_eq!(resolver.resolve("foo"), None);
        assert_eq!(resolver.resolve("xml"), Some(ns::XML));
    }

    #[test]
    fn test_shadow_and_undeclare_default() {
        let mut resolver = ScopedNamespaces::new();
        resolver.push_scope();
        resolver.declare("", "urn:one");
        resolver.push_scope();
        resolver.declare("", "");
        assert_eq!(resolver.resolve_element("item"), None);
        resolver.pop_scope();
        assert_eq!(resolver.resolve_element("item"), Some("urn:one"));
    }

    #[test]
    fn test_document_map_first_declaration_wins() {
        let doc = XmlDocument::parse(
            b"<r xmlns=\"urn:d\" xmlns:a=\"urn:a1\"><x xmlns:a=\"urn:a2\" xmlns:b=\"urn:b\"/></r>",
        )
        .unwrap();
        let map = NamespaceMap::from_document(&doc);
        assert_eq!(map.lookup(""), Some("urn:d"));
        assert_eq!(map.lookup("a"), Some("urn:a1"));
        assert_eq!(map.lookup("b"), Some("urn:b"));
        assert_eq!(map.lookup("xml"), Some(ns::XML));
        assert_eq!(map.lookup("c"), None);
    }
}
