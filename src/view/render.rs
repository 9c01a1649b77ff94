//! Tree Renderer
//!
//! Converts an original subtree into view nodes, lazily and to a bounded
//! depth. Traversal uses an explicit stack so deeply nested documents
//! never exhaust the call stack.

use super::index::NodeIndex;
use super::text::{outline_line, process_text, trimmed_len};
use super::tree::{ViewContent, ViewKey, ViewNode, ViewStyle, ViewTree};
use crate::core::entities::escape_html;
use crate::dom::{NodeData, NodeRef, XmlDocument, XmlNode};
use tracing::trace;

/// Default character limit under which text keeps its element on one line
pub const DEFAULT_SHORT_TEXT_THRESHOLD: usize = 100;

/// Renders original nodes into a `ViewTree`
#[derive(Debug, Clone, Copy)]
pub struct TreeRenderer {
    short_text_threshold: usize,
}

impl Default for TreeRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_SHORT_TEXT_THRESHOLD)
    }
}

struct Frame {
    node: NodeRef,
    depth: i32,
    parent: Option<ViewKey>,
    top: bool,
}

impl TreeRenderer {
    pub fn new(short_text_threshold: usize) -> Self {
        TreeRenderer {
            short_text_threshold,
        }
    }

    pub fn short_text_threshold(&self) -> usize {
        self.short_text_threshold
    }

    /// An element is one-line when it has no children or a single short text child
    pub fn is_one_line(&self, doc: &XmlDocument, node: NodeRef) -> bool {
        match doc.children(node) {
            [] => true,
            [only] => match doc.node(*only).map(|n| &n.data) {
                Some(NodeData::Text(text)) => text.chars().count() < self.short_text_threshold,
                _ => false,
            },
            _ => false,
        }
    }

    /// Render `node` under `parent` (or as a root of `tree`).
    ///
    /// `depth == 0` renders the node itself and leaves collapsible children
    /// unprocessed; a negative depth renders the whole subtree. Returns the
    /// keys of the view nodes created directly under `parent`.
    pub fn render(
        &self,
        tree: &mut ViewTree,
        doc: &XmlDocument,
        index: &mut NodeIndex,
        node: NodeRef,
        depth: i32,
        parent: Option<ViewKey>,
    ) -> Vec<ViewKey> {
        let style = tree.style();
        let start_len = tree.len();
        let mut top_level = Vec::new();
        let mut stack = vec![Frame {
            node,
            depth,
            parent,
            top: true,
        }];

        while let Some(frame) = stack.pop() {
            let Some(original) = doc.node(frame.node) else {
                continue;
            };

            if let NodeData::Document = original.data {
                push_children(&mut stack, doc.children(frame.node), frame.depth, frame.parent, frame.top);
                continue;
            }

            let Some(mut view) = self.build(doc, index, frame.node, original, style) else {
                continue;
            };

            let mut descend = false;
            if original.is_element() {
                if frame.depth == 0 && can_be_collapsed(doc, frame.node) {
                    view.collapsed = true;
                    view.unprocessed = true;
                } else {
                    descend = true;
                }
            }

            let key = tree.insert(view, frame.parent);
            if frame.top {
                top_level.push(key);
            }
            if descend {
                let child_depth = frame.depth.saturating_sub(1);
                push_children(&mut stack, doc.children(frame.node), child_depth, Some(key), false);
            }
        }

        trace!(node = node, depth = depth, created = tree.len() - start_len, style = ?style, "rendered subtree");
        top_level
    }

    /// View node for one original node; `None` for nodes this style omits
    fn build(
        &self,
        doc: &XmlDocument,
        index: &mut NodeIndex,
        node: NodeRef,
        original: &XmlNode,
        style: ViewStyle,
    ) -> Option<ViewNode> {
        let (content, one_line, empty) = match (&original.data, style) {
            (NodeData::Document, _) => return None,
            (NodeData::Text(text), ViewStyle::Main) => {
                if text.trim().is_empty() {
                    return None;
                }
                (ViewContent::Text(process_text(text)), false, false)
            }
            (NodeData::Text(_), ViewStyle::Outline) => return None,
            (NodeData::Element { name, attributes, .. }, _) => {
                let attributes = attributes
                    .iter()
                    .filter(|a| !a.is_internal())
                    .map(|a| {
                        let value = match style {
                            ViewStyle::Main => process_text(&a.value),
                            ViewStyle::Outline => escape_html(a.value.trim()).into_owned(),
                        };
                        (a.name.clone(), value)
                    })
                    .collect();
                let content = ViewContent::Element {
                    name: name.clone(),
                    attributes,
                    has_children: !original.children.is_empty(),
                };
                let empty = style == ViewStyle::Outline && !has_outline_children(doc, node);
                (content, self.is_one_line(doc, node), empty)
            }
            (NodeData::Comment(text), ViewStyle::Main) => (
                ViewContent::Comment(process_text(text)),
                trimmed_len(text) < self.short_text_threshold,
                false,
            ),
            (NodeData::CData(text), ViewStyle::Main) => (
                ViewContent::CData(process_text(text)),
                trimmed_len(text) < self.short_text_threshold,
                false,
            ),
            (NodeData::Comment(text), ViewStyle::Outline) => {
                (ViewContent::Comment(outline_line(text)), true, false)
            }
            (NodeData::CData(text), ViewStyle::Outline) => {
                (ViewContent::CData(outline_line(text)), true, false)
            }
            (NodeData::ProcessingInstruction { target, data }, _) => {
                let data = match style {
                    ViewStyle::Main => process_text(data),
                    ViewStyle::Outline => String::new(),
                };
                let content = ViewContent::ProcessingInstruction {
                    target: target.clone(),
                    data,
                };
                (content, false, false)
            }
        };

        let mut view = ViewNode::new(node, index.id_of(node), content);
        view.one_line = one_line;
        view.empty = empty;
        Some(view)
    }
}

fn push_children(stack: &mut Vec<Frame>, children: &[NodeRef], depth: i32, parent: Option<ViewKey>, top: bool) {
    stack.extend(children.iter().rev().map(|&node| Frame {
        node,
        depth,
        parent,
        top,
    }));
}

/// Has children, and more than one or a first child that is not text
pub fn can_be_collapsed(doc: &XmlDocument, node: NodeRef) -> bool {
    match doc.children(node) {
        [] => false,
        [only] => !doc.node(*only).is_some_and(XmlNode::is_text),
        _ => true,
    }
}

fn has_outline_children(doc: &XmlDocument, node: NodeRef) -> bool {
    doc.children(node).iter().any(|&c| {
        doc.node(c).is_some_and(|n| {
            matches!(
                n.data,
                NodeData::Element { .. } | NodeData::Comment(_) | NodeData::ProcessingInstruction { .. }
            )
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[u8] = b"<root><a><b>hello world this is a fairly short text</b></a><c/></root>";

    fn name_of(tree: &ViewTree, key: ViewKey) -> &str {
        match &tree.get(key).unwrap().content {
            ViewContent::Element { name, .. } => name,
            other => panic!("expected element, got {:?}", other),
        }
    }

    fn find(tree: &ViewTree, name: &str) -> ViewKey {
        (0..tree.len())
            .find(|&k| matches!(&tree.get(k).unwrap().content, ViewContent::Element { name: n, .. } if n == name))
            .unwrap()
    }

    #[test]
    fn test_depth_zero_leaves_children_unprocessed() {
        let doc = XmlDocument::parse(SAMPLE).unwrap();
        let mut index = NodeIndex::new();
        let mut tree = ViewTree::new(ViewStyle::Main);
        let renderer = TreeRenderer::default();

        let roots = renderer.render(&mut tree, &doc, &mut index, doc.document_node(), 0, None);
        assert_eq!(roots.len(), 1);
        let root = tree.get(roots[0]).unwrap();
        assert!(root.collapsed);
        assert!(root.unprocessed);
        assert!(root.children.is_empty());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_unbounded_render() {
        let doc = XmlDocument::parse(SAMPLE).unwrap();
        let mut index = NodeIndex::new();
        let mut tree = ViewTree::new(ViewStyle::Main);
        TreeRenderer::default().render(&mut tree, &doc, &mut index, doc.document_node(), -1, None);

        assert!((0..tree.len()).all(|k| !tree.get(k).unwrap().unprocessed));
        // root, a, b, text, c
        assert_eq!(tree.len(), 5);

        let root = find(&tree, "root");
        let a = find(&tree, "a");
        let b = find(&tree, "b");
        let c = find(&tree, "c");
        assert_eq!(tree.children(root).len(), 2);
        assert_eq!(name_of(&tree, tree.children(root)[0]), "a");
        assert!(!tree.get(a).unwrap().one_line);
        assert!(tree.get(b).unwrap().one_line);
        assert!(tree.get(c).unwrap().one_line);
        assert!(!tree.get(root).unwrap().one_line);
    }

    #[test]
    fn test_depth_two_marks_third_level() {
        let doc = XmlDocument::parse(b"<r><a><b><c/><d/></b></a></r>").unwrap();
        let mut index = NodeIndex::new();
        let mut tree = ViewTree::new(ViewStyle::Main);
        TreeRenderer::default().render(&mut tree, &doc, &mut index, doc.document_node(), 2, None);

        let b = find(&tree, "b");
        assert!(tree.get(b).unwrap().collapsed);
        assert!(tree.get(b).unwrap().unprocessed);
        assert!(!tree.get(find(&tree, "a")).unwrap().collapsed);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_one_line_is_never_collapsed() {
        let doc = XmlDocument::parse(b"<r><leaf>short</leaf><empty/></r>").unwrap();
        let mut index = NodeIndex::new();
        let mut tree = ViewTree::new(ViewStyle::Main);
        let renderer = TreeRenderer::default();
        let root = doc.root_element().unwrap();
        for &child in doc.children(root) {
            let keys = renderer.render(&mut tree, &doc, &mut index, child, 0, None);
            let view = tree.get(keys[0]).unwrap();
            assert!(view.one_line);
            assert!(!view.collapsed);
            assert!(!view.unprocessed);
        }
        // the short text child is rendered along with its element
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_long_single_text_is_not_one_line() {
        let xml = format!("<r><p>{}</p></r>", "w".repeat(150));
        let doc = XmlDocument::parse(xml.as_bytes()).unwrap();
        let mut index = NodeIndex::new();
        let mut tree = ViewTree::new(ViewStyle::Main);
        TreeRenderer::default().render(&mut tree, &doc, &mut index, doc.document_node(), 1, None);

        let p = tree.get(find(&tree, "p")).unwrap();
        assert!(!p.one_line);
        assert!(!p.collapsed);
        assert_eq!(p.children.len(), 1);
    }

    #[test]
    fn test_threshold_is_configurable() {
        let doc = XmlDocument::parse(b"<r><p>twelve chars</p></r>").unwrap();
        let renderer = TreeRenderer::new(10);
        let p = doc.children(doc.root_element().unwrap())[0];
        assert!(!renderer.is_one_line(&doc, p));
        assert!(TreeRenderer::default().is_one_line(&doc, p));
    }

    #[test]
    fn test_whitespace_text_renders_nothing() {
        let doc = XmlDocument::parse(b"<r>\n  <a/>\n</r>").unwrap();
        let mut index = NodeIndex::new();
        let mut tree = ViewTree::new(ViewStyle::Main);
        TreeRenderer::default().render(&mut tree, &doc, &mut index, doc.document_node(), -1, None);
        assert_eq!(tree.len(), 2);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_invalid_node_renders_nothing() {
        let doc = XmlDocument::parse(b"<r/>").unwrap();
        let mut index = NodeIndex::new();
        let mut tree = ViewTree::new(ViewStyle::Main);
        let keys = TreeRenderer::default().render(&mut tree, &doc, &mut index, 999, -1, None);
        assert!(keys.is_empty());
        assert!(tree.is_empty());
    }

    #[test]
    fn test_comment_and_pi_content() {
        let doc = XmlDocument::parse(b"<r><!-- see www.example.com --><?app run fast?></r>").unwrap();
        let mut index = NodeIndex::new();
        let mut tree = ViewTree::new(ViewStyle::Main);
        TreeRenderer::default().render(&mut tree, &doc, &mut index, doc.document_node(), -1, None);

        let root = find(&tree, "r");
        let children = tree.children(root);
        let comment = tree.get(children[0]).unwrap();
        assert!(comment.one_line);
        assert!(matches!(&comment.content, ViewContent::Comment(c) if c.contains("href=\"http://www.example.com\"")));
        assert_eq!(
            tree.get(children[1]).unwrap().content,
            ViewContent::ProcessingInstruction {
                target: "app".to_string(),
                data: "run fast".to_string(),
            }
        );
    }

    #[test]
    fn test_internal_attributes_are_hidden() {
        let doc = XmlDocument::parse(br#"<r data-xv-id="9" id="&lt;x&gt;"/>"#).unwrap();
        let mut index = NodeIndex::new();
        let mut tree = ViewTree::new(ViewStyle::Main);
        TreeRenderer::default().render(&mut tree, &doc, &mut index, doc.document_node(), -1, None);
        let ViewContent::Element { attributes, has_children, .. } = &tree.get(0).unwrap().content else {
            panic!("expected element");
        };
        assert_eq!(attributes, &vec![("id".to_string(), "&lt;x&gt;".to_string())]);
        assert!(!has_children);
    }

    #[test]
    fn test_outline_style() {
        let xml = b"<r><a>text only</a><b><!--\n\n  first\nsecond --></b><c><?pi data?></c></r>";
        let doc = XmlDocument::parse(xml).unwrap();
        let mut index = NodeIndex::new();
        let mut tree = ViewTree::new(ViewStyle::Outline);
        TreeRenderer::default().render(&mut tree, &doc, &mut index, doc.document_node(), -1, None);

        // text is skipped entirely
        assert!((0..tree.len()).all(|k| !tree.get(k).unwrap().is_text()));
        assert!(tree.get(find(&tree, "a")).unwrap().empty);
        assert!(!tree.get(find(&tree, "b")).unwrap().empty);
        assert!(!tree.get(find(&tree, "c")).unwrap().empty);

        let b = find(&tree, "b");
        let comment = tree.get(tree.children(b)[0]).unwrap();
        assert_eq!(comment.content, ViewContent::Comment("first".to_string()));

        let c = find(&tree, "c");
        assert_eq!(
            tree.get(tree.children(c)[0]).unwrap().content,
            ViewContent::ProcessingInstruction {
                target: "pi".to_string(),
                data: String::new(),
            }
        );
    }

    #[test]
    fn test_views_share_ids() {
        let doc = XmlDocument::parse(SAMPLE).unwrap();
        let mut index = NodeIndex::new();
        let mut main = ViewTree::new(ViewStyle::Main);
        let mut outline = ViewTree::new(ViewStyle::Outline);
        let renderer = TreeRenderer::default();
        renderer.render(&mut main, &doc, &mut index, doc.document_node(), -1, None);
        renderer.render(&mut outline, &doc, &mut index, doc.document_node(), -1, None);

        let c_main = main.get(find(&main, "c")).unwrap().id;
        let c_outline = outline.get(find(&outline, "c")).unwrap().id;
        assert_eq!(c_main, c_outline);
    }

    #[test]
    fn test_deep_document_does_not_overflow() {
        let depth = 20_000;
        let mut xml = String::new();
        for _ in 0..depth {
            xml.push_str("<n>");
        }
        for _ in 0..depth {
            xml.push_str("</n>");
        }
        let doc = XmlDocument::parse(xml.as_bytes()).unwrap();
        let mut index = NodeIndex::new();
        let mut tree = ViewTree::new(ViewStyle::Main);
        TreeRenderer::default().render(&mut tree, &doc, &mut index, doc.document_node(), -1, None);
        assert_eq!(tree.len(), depth);
    }
}
