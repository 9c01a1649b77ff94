//! Collapse/expand state machine
//!
//! Expanding an unprocessed node materializes its direct children once;
//! collapsing only hides them, so a later expand is free.

use super::index::{NodeId, NodeIndex};
use super::render::TreeRenderer;
use super::tree::{ViewKey, ViewTree};
use crate::dom::{NodeRef, XmlDocument};
use std::collections::HashMap;
use tracing::trace;

/// Expansion state and rendered-node lookup for one view
#[derive(Debug, Default)]
pub struct ExpansionController {
    renderer: TreeRenderer,
    cache: HashMap<NodeId, ViewKey>,
}

impl ExpansionController {
    pub fn new(renderer: TreeRenderer) -> Self {
        ExpansionController {
            renderer,
            cache: HashMap::new(),
        }
    }

    pub fn renderer(&self) -> &TreeRenderer {
        &self.renderer
    }

    /// Expand a collapsed node. With `recursive`, every collapsed node below
    /// it is expanded as well, materializing as needed.
    pub fn expand(
        &self,
        tree: &mut ViewTree,
        doc: &XmlDocument,
        index: &mut NodeIndex,
        key: ViewKey,
        recursive: bool,
    ) {
        if !tree.get(key).is_some_and(|n| n.collapsed) {
            return;
        }

        let mut worklist = vec![key];
        while let Some(current) = worklist.pop() {
            self.expand_one(tree, doc, index, current);
            if !recursive {
                break;
            }
            worklist.extend(tree.children(current).iter().rev().copied());
        }
    }

    fn expand_one(&self, tree: &mut ViewTree, doc: &XmlDocument, index: &mut NodeIndex, key: ViewKey) {
        let Some(view) = tree.get_mut(key) else {
            return;
        };
        if !view.collapsed {
            return;
        }
        view.collapsed = false;
        if !view.unprocessed {
            return;
        }
        view.unprocessed = false;

        let node = view.node;
        for &child in doc.children(node) {
            self.renderer.render(tree, doc, index, child, 0, Some(key));
        }
        trace!(node = node, children = tree.children(key).len(), "materialized children");
    }

    /// Collapse a node, keeping its materialized children. With `recursive`,
    /// every collapsible descendant is collapsed too.
    pub fn collapse(&self, tree: &mut ViewTree, key: ViewKey, recursive: bool) {
        match tree.get_mut(key) {
            Some(view) if view.can_collapse() && !view.collapsed => view.collapsed = true,
            _ => return,
        }
        if !recursive {
            return;
        }
        for descendant in tree.descendants(key) {
            if let Some(view) = tree.get_mut(descendant) {
                if view.can_collapse() {
                    view.collapsed = true;
                }
            }
        }
    }

    /// Flip the collapsed state. Returns whether the node is collapsed afterwards.
    pub fn toggle(
        &self,
        tree: &mut ViewTree,
        doc: &XmlDocument,
        index: &mut NodeIndex,
        key: ViewKey,
        recursive: bool,
    ) -> bool {
        if tree.get(key).is_some_and(|n| n.collapsed) {
            self.expand(tree, doc, index, key, recursive);
        } else {
            self.collapse(tree, key, recursive);
        }
        tree.get(key).is_some_and(|n| n.collapsed)
    }

    /// Live view node for an original node, if it has been rendered in `tree`
    pub fn rendered_node_for(&mut self, tree: &ViewTree, index: &NodeIndex, node: NodeRef) -> Option<ViewKey> {
        let id = index.get(node)?;
        if let Some(&key) = self.cache.get(&id) {
            if tree.get(key).is_some_and(|v| v.id == id) {
                return Some(key);
            }
            self.cache.remove(&id);
        }
        let key = tree.key_for(id)?;
        self.cache.insert(id, key);
        Some(key)
    }

    /// Forget cached lookups (the tree was cleared)
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::tree::{ViewContent, ViewStyle};

    const XML: &[u8] = b"<root><a><b>hello world this is a fairly short text</b><d><e/><f/></d></a><c/><!--x--></root>";

    struct Fixture {
        doc: XmlDocument,
        index: NodeIndex,
        tree: ViewTree,
        controller: ExpansionController,
    }

    impl Fixture {
        fn new(depth: i32) -> Self {
            let doc = XmlDocument::parse(XML).unwrap();
            let mut index = NodeIndex::new();
            let mut tree = ViewTree::new(ViewStyle::Main);
            let controller = ExpansionController::default();
            controller
                .renderer()
                .render(&mut tree, &doc, &mut index, doc.document_node(), depth, None);
            Fixture {
                doc,
                index,
                tree,
                controller,
            }
        }

        fn key(&mut self, name: &str) -> ViewKey {
            let node = (0..self.doc.node_count() as NodeRef)
                .find(|&n| self.doc.is_element(n) && self.doc.node(n).unwrap().name() == name)
                .unwrap();
            self.controller
                .rendered_node_for(&self.tree, &self.index, node)
                .unwrap()
        }

        fn expand(&mut self, key: ViewKey, recursive: bool) {
            self.controller
                .expand(&mut self.tree, &self.doc, &mut self.index, key, recursive);
        }
    }

    #[test]
    fn test_expand_materializes_once() {
        let mut fx = Fixture::new(0);
        let root = fx.key("root");
        assert!(fx.tree.get(root).unwrap().unprocessed);

        fx.expand(root, false);
        let view = fx.tree.get(root).unwrap();
        assert!(!view.collapsed);
        assert!(!view.unprocessed);
        let children = view.children.clone();
        assert_eq!(children.len(), 3);

        let a = fx.key("a");
        assert!(fx.tree.get(a).unwrap().collapsed);
        assert!(fx.tree.get(a).unwrap().unprocessed);

        fx.controller.collapse(&mut fx.tree, root, false);
        let len = fx.tree.len();
        fx.expand(root, false);
        assert_eq!(fx.tree.len(), len);
        assert_eq!(fx.tree.children(root), children.as_slice());
    }

    #[test]
    fn test_expand_is_noop_when_expanded() {
        let mut fx = Fixture::new(-1);
        let root = fx.key("root");
        let len = fx.tree.len();
        fx.expand(root, true);
        assert_eq!(fx.tree.len(), len);
        assert!(!fx.tree.get(root).unwrap().collapsed);
    }

    #[test]
    fn test_recursive_expand() {
        let mut fx = Fixture::new(0);
        let root = fx.key("root");
        fx.expand(root, true);

        assert!((0..fx.tree.len()).all(|k| {
            let v = fx.tree.get(k).unwrap();
            !v.collapsed && !v.unprocessed
        }));
        let e = fx.key("e");
        assert!(fx.tree.is_visible(e));
    }

    #[test]
    fn test_collapse_keeps_children() {
        let mut fx = Fixture::new(-1);
        let a = fx.key("a");
        let before = fx.tree.children(a).to_vec();

        fx.controller.collapse(&mut fx.tree, a, false);
        assert!(fx.tree.get(a).unwrap().collapsed);
        assert_eq!(fx.tree.children(a), before.as_slice());
        assert!(!fx.tree.is_visible(before[0]));

        fx.expand(a, false);
        assert!(fx.tree.is_visible(before[0]));
    }

    #[test]
    fn test_recursive_collapse_skips_one_line() {
        let mut fx = Fixture::new(-1);
        let root = fx.key("root");
        fx.controller.collapse(&mut fx.tree, root, true);

        for name in ["root", "a", "d"] {
            let key = fx.key(name);
            assert!(fx.tree.get(key).unwrap().collapsed, "{} should be collapsed", name);
        }
        for name in ["b", "c", "e", "f"] {
            let key = fx.key(name);
            assert!(!fx.tree.get(key).unwrap().collapsed, "{} is one-line", name);
        }
        assert!((0..fx.tree.len())
            .filter(|&k| fx.tree.get(k).unwrap().is_text())
            .all(|k| !fx.tree.get(k).unwrap().collapsed));
    }

    #[test]
    fn test_collapse_noops() {
        let mut fx = Fixture::new(-1);
        let c = fx.key("c");
        fx.controller.collapse(&mut fx.tree, c, false);
        assert!(!fx.tree.get(c).unwrap().collapsed);

        let comment = (0..fx.tree.len())
            .find(|&k| matches!(fx.tree.get(k).unwrap().content, ViewContent::Comment(_)))
            .unwrap();
        fx.controller.collapse(&mut fx.tree, comment, false);
        assert!(!fx.tree.get(comment).unwrap().collapsed);

        fx.controller.collapse(&mut fx.tree, 10_000, true);
    }

    #[test]
    fn test_toggle() {
        let mut fx = Fixture::new(-1);
        let d = fx.key("d");
        let collapsed = fx
            .controller
            .toggle(&mut fx.tree, &fx.doc, &mut fx.index, d, false);
        assert!(collapsed);
        let collapsed = fx
            .controller
            .toggle(&mut fx.tree, &fx.doc, &mut fx.index, d, false);
        assert!(!collapsed);
    }

    #[test]
    fn test_rendered_node_lookup_is_cached() {
        let mut fx = Fixture::new(0);
        let root = fx.key("root");
        assert_eq!(fx.controller.cached_len(), 1);
        assert_eq!(fx.key("root"), root);
        assert_eq!(fx.controller.cached_len(), 1);

        // not rendered yet
        let e = fx.doc.descendants(fx.doc.document_node()).find(|&n| {
            fx.doc.node(n).unwrap().name() == "e"
        });
        assert_eq!(
            fx.controller.rendered_node_for(&fx.tree, &fx.index, e.unwrap()),
            None
        );

        fx.tree.clear();
        fx.controller.clear();
        assert_eq!(fx.controller.cached_len(), 0);
        let root_ref = fx.doc.root_element().unwrap();
        assert_eq!(fx.controller.rendered_node_for(&fx.tree, &fx.index, root_ref), None);
    }
}
