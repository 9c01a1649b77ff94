//! Tree views
//!
//! A `TreeView` bundles one view arena with its expansion controller and
//! reacts to focus events from other views by revealing the focused node.

pub mod expansion;
pub mod index;
pub mod markup;
pub mod render;
pub mod text;
pub mod tree;

use crate::dom::{NodeRef, XmlDocument};
use crate::focus::{FocusEvent, FocusListener, ViewOrigin};
use expansion::ExpansionController;
use index::NodeIndex;
use render::TreeRenderer;
use tracing::trace;
use tree::{ViewKey, ViewStyle, ViewTree};

pub use index::NodeId;

/// One rendered view of the document
#[derive(Debug)]
pub struct TreeView {
    origin: ViewOrigin,
    tree: ViewTree,
    expansion: ExpansionController,
}

impl TreeView {
    pub fn new(style: ViewStyle, renderer: TreeRenderer) -> Self {
        let origin = match style {
            ViewStyle::Main => ViewOrigin::Main,
            ViewStyle::Outline => ViewOrigin::Outline,
        };
        TreeView {
            origin,
            tree: ViewTree::new(style),
            expansion: ExpansionController::new(renderer),
        }
    }

    /// Drop previous content and render the whole document to `depth`
    pub fn render_document(&mut self, doc: &XmlDocument, index: &mut NodeIndex, depth: i32) {
        self.tree.clear();
        self.expansion.clear();
        self.expansion
            .renderer()
            .render(&mut self.tree, doc, index, doc.document_node(), depth, None);
    }

    pub fn tree(&self) -> &ViewTree {
        &self.tree
    }

    pub fn rendered_node_for(&mut self, index: &NodeIndex, node: NodeRef) -> Option<ViewKey> {
        self.expansion.rendered_node_for(&self.tree, index, node)
    }

    pub fn expand(&mut self, doc: &XmlDocument, index: &mut NodeIndex, key: ViewKey, recursive: bool) {
        self.expansion.expand(&mut self.tree, doc, index, key, recursive);
    }

    pub fn collapse(&mut self, key: ViewKey, recursive: bool) {
        self.expansion.collapse(&mut self.tree, key, recursive);
    }

    pub fn toggle(&mut self, doc: &XmlDocument, index: &mut NodeIndex, key: ViewKey, recursive: bool) -> bool {
        self.expansion.toggle(&mut self.tree, doc, index, key, recursive)
    }

    pub fn select(&mut self, key: ViewKey) {
        self.tree.select(key);
    }

    /// Expand `node` and its element ancestors (root first), then select
    /// its rendered counterpart. Returns the selected key.
    pub fn reveal(&mut self, doc: &XmlDocument, index: &mut NodeIndex, node: NodeRef) -> Option<ViewKey> {
        let mut chain: Vec<NodeRef> = std::iter::once(node)
            .chain(doc.ancestors(node))
            .filter(|&a| doc.is_element(a))
            .collect();
        chain.reverse();

        for ancestor in chain {
            let Some(key) = self.rendered_node_for(index, ancestor) else {
                break;
            };
            self.expand(doc, index, key, false);
        }

        let key = self.rendered_node_for(index, node)?;
        self.tree.select(key);
        Some(key)
    }

    pub fn take_scroll_request(&mut self) -> Option<ViewKey> {
        self.tree.take_scroll_request()
    }

    pub fn markup(&self) -> String {
        markup::tree_markup(&self.tree)
    }

    pub fn node_markup(&self, key: ViewKey) -> Option<String> {
        markup::node_markup(&self.tree, key)
    }
}

impl FocusListener for TreeView {
    fn origin(&self) -> ViewOrigin {
        self.origin
    }

    fn node_focused(&mut self, doc: &XmlDocument, index: &mut NodeIndex, event: &FocusEvent) {
        let revealed = self.reveal(doc, index, event.node);
        trace!(node = event.node, view = ?self.origin, revealed = ?revealed, "focus received");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(doc: &XmlDocument, name: &str) -> NodeRef {
        doc.descendants(doc.document_node())
            .find(|&n| doc.is_element(n) && doc.node(n).unwrap().name() == name)
            .unwrap()
    }

    #[test]
    fn test_reveal_expands_ancestor_chain() {
        let doc = XmlDocument::parse(b"<r><a><b><c><d/><e/></c></b><x/></a></r>").unwrap();
        let mut index = NodeIndex::new();
        let mut view = TreeView::new(ViewStyle::Main, TreeRenderer::default());
        view.render_document(&doc, &mut index, 1);

        let d = element(&doc, "d");
        assert!(view.rendered_node_for(&index, d).is_none());

        let key = view.reveal(&doc, &mut index, d).unwrap();
        assert_eq!(view.tree().selected(), Some(key));
        assert!(view.tree().is_visible(key));
        assert_eq!(view.take_scroll_request(), Some(key));

        let c = view.rendered_node_for(&index, element(&doc, "c")).unwrap();
        assert!(!view.tree().get(c).unwrap().collapsed);
    }

    #[test]
    fn test_reveal_expands_target() {
        let doc = XmlDocument::parse(b"<r><a><b><c/><d/></b></a></r>").unwrap();
        let b = element(&doc, "b");

        for style in [ViewStyle::Main, ViewStyle::Outline] {
            let mut index = NodeIndex::new();
            let mut view = TreeView::new(style, TreeRenderer::default());
            view.render_document(&doc, &mut index, 1);

            let key = view.reveal(&doc, &mut index, b).unwrap();
            let node = view.tree().get(key).unwrap();
            assert!(node.selected);
            assert!(!node.collapsed);
            assert!(!node.unprocessed);
            assert_eq!(view.tree().children(key).len(), 2);
            assert!(view.rendered_node_for(&index, element(&doc, "d")).is_some());
        }
    }

    #[test]
    fn test_focus_event_moves_selection() {
        let doc = XmlDocument::parse(b"<r><a><b/><c/></a></r>").unwrap();
        let mut index = NodeIndex::new();
        let mut view = TreeView::new(ViewStyle::Outline, TreeRenderer::default());
        view.render_document(&doc, &mut index, 0);

        let b = element(&doc, "b");
        let c = element(&doc, "c");
        view.node_focused(&doc, &mut index, &FocusEvent::new(b, ViewOrigin::Main));
        view.node_focused(&doc, &mut index, &FocusEvent::new(c, ViewOrigin::Main));

        let c_key = view.rendered_node_for(&index, c).unwrap();
        let b_key = view.rendered_node_for(&index, b).unwrap();
        assert_eq!(view.tree().selected(), Some(c_key));
        assert!(!view.tree().get(b_key).unwrap().selected);
    }

    #[test]
    fn test_render_document_resets_view() {
        let doc = XmlDocument::parse(b"<r><a/></r>").unwrap();
        let mut index = NodeIndex::new();
        let mut view = TreeView::new(ViewStyle::Main, TreeRenderer::default());
        view.render_document(&doc, &mut index, -1);
        let first = view.tree().len();
        view.render_document(&doc, &mut index, -1);
        assert_eq!(view.tree().len(), first);
        assert_eq!(view.origin(), ViewOrigin::Main);
        assert!(view.markup().contains("xv-tag-name\">a<"));
    }
}
