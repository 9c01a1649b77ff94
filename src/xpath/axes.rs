//! XPath Axes Implementation
//!
//! All 13 XPath 1.0 axes. Every axis yields nodes in proximity order:
//! forward axes in document order, reverse axes nearest-first, so that a
//! step predicate like `ancestor::*[1]` selects the parent.
//!
//! The attribute axis excludes namespace declarations. The namespace axis
//! is always empty.

use super::compiler::CompiledNodeTest;
use super::parser::Axis;
use super::value::XPathNode;
use super::XPathError;
use crate::dom::{NamespaceMap, NodeKind, NodeRef, XmlDocument};

/// Navigate along an axis from a context node
pub fn navigate(doc: &XmlDocument, context: XPathNode, axis: Axis) -> Vec<XPathNode> {
    let XPathNode::Node(id) = context else {
        return attribute_context_axis(doc, context, axis);
    };

    let nodes = |ids: Vec<NodeRef>| -> Vec<XPathNode> { ids.into_iter().map(XPathNode::Node).collect() };

    match axis {
        Axis::Child => nodes(doc.children(id).to_vec()),
        Axis::Descendant => nodes(doc.descendants(id).collect()),
        Axis::DescendantOrSelf => nodes(std::iter::once(id).chain(doc.descendants(id)).collect()),
        Axis::Parent => nodes(doc.parent(id).into_iter().collect()),
        Axis::Ancestor => nodes(doc.ancestors(id).collect()),
        Axis::AncestorOrSelf => nodes(std::iter::once(id).chain(doc.ancestors(id)).collect()),
        Axis::FollowingSibling => nodes(following_siblings(doc, id).to_vec()),
        Axis::PrecedingSibling => nodes(preceding_siblings(doc, id).iter().rev().copied().collect()),
        Axis::Following => following_axis(doc, id),
        Axis::Preceding => preceding_axis(doc, id),
        Axis::Self_ => vec![context],
        Axis::Attribute => attribute_axis(doc, id),
        Axis::Namespace => Vec::new(),
    }
}

/// Axes from an attribute node: only self, parent and ancestors are non-empty
fn attribute_context_axis(doc: &XmlDocument, context: XPathNode, axis: Axis) -> Vec<XPathNode> {
    let owner = context.owner();
    let upward = || std::iter::once(owner).chain(doc.ancestors(owner)).map(XPathNode::Node);
    match axis {
        Axis::Self_ => vec![context],
        Axis::Parent => vec![XPathNode::Node(owner)],
        Axis::Ancestor => upward().collect(),
        Axis::AncestorOrSelf => std::iter::once(context).chain(upward()).collect(),
        _ => Vec::new(),
    }
}

fn following_siblings(doc: &XmlDocument, id: NodeRef) -> &[NodeRef] {
    match doc.sibling_position(id) {
        Some((parent, index)) => &doc.children(parent)[index + 1..],
        None => &[],
    }
}

fn preceding_siblings(doc: &XmlDocument, id: NodeRef) -> &[NodeRef] {
    match doc.sibling_position(id) {
        Some((parent, index)) => &doc.children(parent)[..index],
        None => &[],
    }
}

/// following:: axis - nodes after the context in document order, excluding descendants
fn following_axis(doc: &XmlDocument, id: NodeRef) -> Vec<XPathNode> {
    let mut result = Vec::new();
    for node in std::iter::once(id).chain(doc.ancestors(id)) {
        for &sibling in following_siblings(doc, node) {
            result.push(XPathNode::Node(sibling));
            result.extend(doc.descendants(sibling).map(XPathNode::Node));
        }
    }
    // Siblings of nearer nodes come first in document order, but a
    // nearer level's subtree can be followed by a farther level's siblings
    result.sort_unstable_by_key(|n| n.order_key());
    result
}

/// preceding:: axis - nodes before the context, excluding ancestors, nearest first
fn preceding_axis(doc: &XmlDocument, id: NodeRef) -> Vec<XPathNode> {
    let mut result = Vec::new();
    for node in std::iter::once(id).chain(doc.ancestors(id)) {
        for &sibling in preceding_siblings(doc, node) {
            result.push(XPathNode::Node(sibling));
            result.extend(doc.descendants(sibling).map(XPathNode::Node));
        }
    }
    result.sort_unstable_by_key(|n| std::cmp::Reverse(n.order_key()));
    result
}

/// attribute:: axis - attributes of an element, namespace declarations excluded
fn attribute_axis(doc: &XmlDocument, id: NodeRef) -> Vec<XPathNode> {
    let Some(node) = doc.node(id) else {
        return Vec::new();
    };
    node.attributes()
        .iter()
        .enumerate()
        .filter(|(_, a)| !a.is_namespace_declaration())
        .filter_map(|(i, _)| u16::try_from(i).ok())
        .map(|i| XPathNode::Attribute(id, i))
        .collect()
}

/// Check if a node matches a node test. The principal node kind is
/// attribute on the attribute axis and element elsewhere.
pub fn matches_node_test(
    doc: &XmlDocument,
    namespaces: &NamespaceMap,
    node: XPathNode,
    node_test: &CompiledNodeTest,
) -> Result<bool, XPathError> {
    match node {
        XPathNode::Attribute(owner, index) => {
            let Some(attr) = doc
                .node(owner)
                .and_then(|n| n.attributes().get(usize::from(index)))
            else {
                return Ok(false);
            };
            Ok(match node_test {
                CompiledNodeTest::Any | CompiledNodeTest::Node => true,
                CompiledNodeTest::Name(name) => attr.name == *name,
                CompiledNodeTest::QName(prefix, local) => {
                    let expected = resolve(namespaces, prefix)?;
                    attr.local_name() == local
                        && attr.prefix().and_then(|p| namespaces.lookup(p)) == Some(expected)
                }
                CompiledNodeTest::NamespaceWildcard(prefix) => {
                    let expected = resolve(namespaces, prefix)?;
                    attr.prefix().and_then(|p| namespaces.lookup(p)) == Some(expected)
                }
                _ => false,
            })
        }
        XPathNode::Node(id) => {
            let Some(n) = doc.node(id) else {
                return Ok(false);
            };
            let kind = n.kind();
            Ok(match node_test {
                CompiledNodeTest::Any => kind == NodeKind::Element,
                CompiledNodeTest::Name(name) => kind == NodeKind::Element && n.name() == name,
                CompiledNodeTest::QName(prefix, local) => {
                    let expected = resolve(namespaces, prefix)?;
                    kind == NodeKind::Element
                        && n.local_name() == local
                        && n.namespace_uri() == Some(expected)
                }
                CompiledNodeTest::NamespaceWildcard(prefix) => {
                    let expected = resolve(namespaces, prefix)?;
                    kind == NodeKind::Element && n.namespace_uri() == Some(expected)
                }
                CompiledNodeTest::Node => true,
                CompiledNodeTest::Text => matches!(kind, NodeKind::Text | NodeKind::CData),
                CompiledNodeTest::Comment => kind == NodeKind::Comment,
                CompiledNodeTest::ProcessingInstruction(target) => {
                    kind == NodeKind::ProcessingInstruction
                        && target.as_deref().is_none_or(|t| n.name() == t)
                }
            })
        }
    }
}

fn resolve<'a>(namespaces: &'a NamespaceMap, prefix: &str) -> Result<&'a str, XPathError> {
    namespaces
        .lookup(prefix)
        .ok_or_else(|| XPathError::UnresolvedPrefix(prefix.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(nodes: &[XPathNode]) -> Vec<NodeRef> {
        nodes.iter().map(|n| n.owner()).collect()
    }

    // <root><a><b/></a><c/></root>: document 0, root 1, a 2, b 3, c 4
    fn sample() -> XmlDocument {
        XmlDocument::parse(b"<root><a><b/></a><c/></root>").unwrap()
    }

    #[test]
    fn test_child_and_descendant() {
        let doc = sample();
        assert_eq!(ids(&navigate(&doc, XPathNode::Node(1), Axis::Child)), vec![2, 4]);
        assert_eq!(ids(&navigate(&doc, XPathNode::Node(1), Axis::Descendant)), vec![2, 3, 4]);
        assert_eq!(
            ids(&navigate(&doc, XPathNode::Node(1), Axis::DescendantOrSelf)),
            vec![1, 2, 3, 4]
        );
    }

    #[test]
    fn test_reverse_axes_nearest_first() {
        let doc = sample();
        assert_eq!(ids(&navigate(&doc, XPathNode::Node(3), Axis::Ancestor)), vec![2, 1, 0]);
        assert_eq!(ids(&navigate(&doc, XPathNode::Node(4), Axis::Preceding)), vec![3, 2]);
        assert_eq!(ids(&navigate(&doc, XPathNode::Node(4), Axis::PrecedingSibling)), vec![2]);
    }

    #[test]
    fn test_following() {
        let doc = sample();
        assert_eq!(ids(&navigate(&doc, XPathNode::Node(3), Axis::Following)), vec![4]);
        assert_eq!(ids(&navigate(&doc, XPathNode::Node(2), Axis::FollowingSibling)), vec![4]);
        assert!(navigate(&doc, XPathNode::Node(4), Axis::Following).is_empty());
    }

    #[test]
    fn test_attribute_axis_skips_namespace_declarations() {
        let doc = XmlDocument::parse(b"<r xmlns:x=\"urn:x\" id=\"1\" x:k=\"2\"/>").unwrap();
        let attrs = navigate(&doc, XPathNode::Node(1), Axis::Attribute);
        assert_eq!(attrs, vec![XPathNode::Attribute(1, 1), XPathNode::Attribute(1, 2)]);
        assert_eq!(
            navigate(&doc, attrs[0], Axis::Parent),
            vec![XPathNode::Node(1)]
        );
    }

    #[test]
    fn test_name_tests() {
        let doc = XmlDocument::parse(b"<r xmlns:s=\"urn:s\"><s:a/><a/></r>").unwrap();
        let ns = NamespaceMap::from_document(&doc);
        let qname = CompiledNodeTest::QName("s".to_string(), "a".to_string());
        let name = CompiledNodeTest::Name("a".to_string());

        assert!(matches_node_test(&doc, &ns, XPathNode::Node(2), &qname).unwrap());
        assert!(!matches_node_test(&doc, &ns, XPathNode::Node(3), &qname).unwrap());
        assert!(!matches_node_test(&doc, &ns, XPathNode::Node(2), &name).unwrap());
        assert!(matches_node_test(&doc, &ns, XPathNode::Node(3), &name).unwrap());

        let unbound = CompiledNodeTest::NamespaceWildcard("q".to_string());
        assert!(matches!(
            matches_node_test(&doc, &ns, XPathNode::Node(2), &unbound),
            Err(XPathError::UnresolvedPrefix(p)) if p == "q"
        ));
    }
}
