//! View node arena
//!
//! One `ViewTree` per view. Nodes are never removed while a document is
//! loaded: collapsing hides children, it does not discard them.

use super::index::NodeId;
use crate::dom::NodeRef;
use std::collections::HashMap;

/// Index of a view node inside its `ViewTree`
pub type ViewKey = usize;

/// Presentation style of a view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewStyle {
    /// Full syntax-highlighted tree
    Main,
    /// Simplified navigation tree
    Outline,
}

/// Pre-processed presentational content. Strings are ready-to-emit HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewContent {
    Element {
        name: String,
        /// (name, processed value), internal attributes already filtered out
        attributes: Vec<(String, String)>,
        /// Whether the original element has any children at all
        has_children: bool,
    },
    Text(String),
    Comment(String),
    CData(String),
    ProcessingInstruction {
        target: String,
        data: String,
    },
}

/// A rendered node
#[derive(Debug, Clone)]
pub struct ViewNode {
    /// Original node this view node represents
    pub node: NodeRef,
    pub id: NodeId,
    pub parent: Option<ViewKey>,
    pub children: Vec<ViewKey>,
    pub content: ViewContent,
    pub collapsed: bool,
    /// Children not materialized yet
    pub unprocessed: bool,
    pub one_line: bool,
    /// Outline only: no element, comment or PI children
    pub empty: bool,
    pub selected: bool,
}

impl ViewNode {
    pub fn new(node: NodeRef, id: NodeId, content: ViewContent) -> Self {
        ViewNode {
            node,
            id,
            parent: None,
            children: Vec::new(),
            content,
            collapsed: false,
            unprocessed: false,
            one_line: false,
            empty: false,
            selected: false,
        }
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.content, ViewContent::Element { .. })
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.content, ViewContent::Text(_))
    }

    /// Whether collapse has any meaning for this node
    pub fn can_collapse(&self) -> bool {
        !self.one_line
            && matches!(
                self.content,
                ViewContent::Element { .. } | ViewContent::Comment(_) | ViewContent::CData(_)
            )
    }
}

/// Arena of view nodes for one view
#[derive(Debug)]
pub struct ViewTree {
    style: ViewStyle,
    nodes: Vec<ViewNode>,
    roots: Vec<ViewKey>,
    by_id: HashMap<NodeId, ViewKey>,
    selected: Option<ViewKey>,
    scroll_request: Option<ViewKey>,
}

impl ViewTree {
    pub fn new(style: ViewStyle) -> Self {
        ViewTree {
            style,
            nodes: Vec::new(),
            roots: Vec::new(),
            by_id: HashMap::new(),
            selected: None,
            scroll_request: None,
        }
    }

    pub fn style(&self) -> ViewStyle {
        self.style
    }

    /// Append a node under `parent` (or as a root) and index it by id
    pub fn insert(&mut self, mut node: ViewNode, parent: Option<ViewKey>) -> ViewKey {
        let key = self.nodes.len();
        node.parent = parent;
        self.by_id.insert(node.id, key);
        self.nodes.push(node);

        match parent.and_then(|p| self.nodes.get_mut(p)) {
            Some(p) => p.children.push(key),
            None => self.roots.push(key),
        }
        key
    }

    #[inline]
    pub fn get(&self, key: ViewKey) -> Option<&ViewNode> {
        self.nodes.get(key)
    }

    #[inline]
    pub fn get_mut(&mut self, key: ViewKey) -> Option<&mut ViewNode> {
        self.nodes.get_mut(key)
    }

    pub fn roots(&self) -> &[ViewKey] {
        &self.roots
    }

    pub fn children(&self, key: ViewKey) -> &[ViewKey] {
        self.get(key).map_or(&[], |n| n.children.as_slice())
    }

    /// Live view node carrying `id`
    pub fn key_for(&self, id: NodeId) -> Option<ViewKey> {
        self.by_id.get(&id).copied()
    }

    /// Materialized descendants of `key` in pre-order (excludes `key`)
    pub fn descendants(&self, key: ViewKey) -> Vec<ViewKey> {
        let mut result = Vec::new();
        let mut stack: Vec<ViewKey> = self.children(key).iter().rev().copied().collect();
        while let Some(k) = stack.pop() {
            result.push(k);
            stack.extend(self.children(k).iter().rev().copied());
        }
        result
    }

    /// Whether `key` is visible: no ancestor is collapsed
    pub fn is_visible(&self, key: ViewKey) -> bool {
        let mut current = self.get(key).and_then(|n| n.parent);
        while let Some(k) = current {
            match self.get(k) {
                Some(n) if n.collapsed => return false,
                Some(n) => current = n.parent,
                None => return false,
            }
        }
        self.get(key).is_some()
    }

    pub fn selected(&self) -> Option<ViewKey> {
        self.selected
    }

    /// Make `key` the single selected node and request scrolling to it
    pub fn select(&mut self, key: ViewKey) {
        if key >= self.nodes.len() {
            return;
        }
        if let Some(previous) = self.selected.take().and_then(|k| self.nodes.get_mut(k)) {
            previous.selected = false;
        }
        self.nodes[key].selected = true;
        self.selected = Some(key);
        self.scroll_request = Some(key);
    }

    /// Pending scroll target, cleared once taken
    pub fn take_scroll_request(&mut self) -> Option<ViewKey> {
        self.scroll_request.take()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drop every view node (new document load)
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
        self.by_id.clear();
        self.selected = None;
        self.scroll_request = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::index::NodeIndex;

    fn element(index: &mut NodeIndex, node: NodeRef) -> ViewNode {
        ViewNode::new(
            node,
            index.id_of(node),
            ViewContent::Element {
                name: format!("n{}", node),
                attributes: Vec::new(),
                has_children: false,
            },
        )
    }

    #[test]
    fn test_insert_links_parent_and_id() {
        let mut index = NodeIndex::new();
        let mut tree = ViewTree::new(ViewStyle::Main);
        let root = tree.insert(element(&mut index, 1), None);
        let child = tree.insert(element(&mut index, 2), Some(root));
        let grandchild = tree.insert(element(&mut index, 3), Some(child));

        assert_eq!(tree.roots(), &[root]);
        assert_eq!(tree.children(root), &[child]);
        assert_eq!(tree.get(grandchild).unwrap().parent, Some(child));
        assert_eq!(tree.key_for(index.get(3).unwrap()), Some(grandchild));
        assert_eq!(tree.descendants(root), vec![child, grandchild]);
    }

    #[test]
    fn test_single_selection() {
        let mut index = NodeIndex::new();
        let mut tree = ViewTree::new(ViewStyle::Outline);
        let a = tree.insert(element(&mut index, 1), None);
        let b = tree.insert(element(&mut index, 2), None);

        tree.select(a);
        tree.select(b);
        assert!(!tree.get(a).unwrap().selected);
        assert!(tree.get(b).unwrap().selected);
        assert_eq!(tree.selected(), Some(b));
        assert_eq!(tree.take_scroll_request(), Some(b));
        assert_eq!(tree.take_scroll_request(), None);

        tree.select(99);
        assert_eq!(tree.selected(), Some(b));
    }

    #[test]
    fn test_visibility_follows_collapsed_ancestors() {
        let mut index = NodeIndex::new();
        let mut tree = ViewTree::new(ViewStyle::Main);
        let root = tree.insert(element(&mut index, 1), None);
        let child = tree.insert(element(&mut index, 2), Some(root));
        assert!(tree.is_visible(child));
        tree.get_mut(root).unwrap().collapsed = true;
        assert!(!tree.is_visible(child));
        assert!(tree.is_visible(root));
    }

    #[test]
    fn test_clear() {
        let mut index = NodeIndex::new();
        let mut tree = ViewTree::new(ViewStyle::Main);
        let a = tree.insert(element(&mut index, 1), None);
        tree.select(a);
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.selected(), None);
        assert_eq!(tree.key_for(index.get(1).unwrap()), None);
    }
}
