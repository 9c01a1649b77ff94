//! Cross-view focus relay
//!
//! Views register as listeners; a focus event raised by one view is
//! delivered synchronously, in registration order, to every other view.
//! Listeners get no handle back to the coordinator, so a listener cannot
//! dispatch while a dispatch is in progress.

use crate::dom::{NodeRef, XmlDocument};
use crate::view::index::NodeIndex;
use tracing::trace;

/// Where a focus request came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewOrigin {
    Main,
    Outline,
    Search,
}

/// "This original node was focused in that view"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusEvent {
    pub node: NodeRef,
    pub origin: ViewOrigin,
}

impl FocusEvent {
    pub fn new(node: NodeRef, origin: ViewOrigin) -> Self {
        FocusEvent { node, origin }
    }
}

/// A view that reacts to focus changes made elsewhere
pub trait FocusListener {
    /// Events from this origin are not delivered back to the listener
    fn origin(&self) -> ViewOrigin;

    fn node_focused(&mut self, doc: &XmlDocument, index: &mut NodeIndex, event: &FocusEvent);
}

/// Synchronous observer list
#[derive(Debug)]
pub struct FocusCoordinator<L> {
    listeners: Vec<L>,
}

impl<L> Default for FocusCoordinator<L> {
    fn default() -> Self {
        FocusCoordinator {
            listeners: Vec::new(),
        }
    }
}

impl<L: FocusListener> FocusCoordinator<L> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, listener: L) {
        self.listeners.push(listener);
    }

    pub fn get(&self, origin: ViewOrigin) -> Option<&L> {
        self.listeners.iter().find(|l| l.origin() == origin)
    }

    pub fn get_mut(&mut self, origin: ViewOrigin) -> Option<&mut L> {
        self.listeners.iter_mut().find(|l| l.origin() == origin)
    }

    pub fn listeners_mut(&mut self) -> impl Iterator<Item = &mut L> {
        self.listeners.iter_mut()
    }

    /// Deliver `event` to every listener except the one it came from
    pub fn dispatch(&mut self, doc: &XmlDocument, index: &mut NodeIndex, event: FocusEvent) {
        trace!(node = event.node, origin = ?event.origin, "dispatching focus");
        for listener in &mut self.listeners {
            if listener.origin() != event.origin {
                listener.node_focused(doc, index, &event);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
