//! Viewer session
//!
//! Everything tied to one loaded document: the parsed tree, node ids, both
//! views, the search engine and popup, and drag state. Reloading builds a
//! new session, so no id or cache outlives its document.

use crate::dom::{NodeRef, XmlDocument};
use crate::drag::{DragTarget, DragXPath, Modifiers};
use crate::error::ViewerError;
use crate::focus::{FocusCoordinator, FocusEvent, ViewOrigin};
use crate::search::{PanelUpdate, SearchEngine, SearchPanel};
use crate::settings::ViewerConfig;
use crate::view::index::{NodeId, NodeIndex};
use crate::view::render::TreeRenderer;
use crate::view::tree::{ViewKey, ViewStyle};
use crate::view::TreeView;
use tracing::debug;

/// User interaction reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// Expand/collapse switcher in either view; `alt` makes it recursive
    SwitcherClick { view: ViewOrigin, id: NodeId, alt: bool },
    /// Tag name, closing tag or comment start in the main view
    NameClick { id: NodeId, alt: bool },
    /// Any node in the outline
    OutlineClick { id: NodeId },
}

pub struct ViewerSession {
    config: ViewerConfig,
    doc: XmlDocument,
    index: NodeIndex,
    views: FocusCoordinator<TreeView>,
    engine: SearchEngine,
    panel: SearchPanel,
    drag: DragXPath,
}

impl ViewerSession {
    /// Parse `input` and render both views to the configured depth
    pub fn load(input: &[u8], config: ViewerConfig) -> Result<Self, ViewerError> {
        let doc = XmlDocument::parse(input)?;
        let mut index = NodeIndex::new();
        let renderer = TreeRenderer::new(config.oneline_text_len);

        let mut views = FocusCoordinator::new();
        for style in [ViewStyle::Main, ViewStyle::Outline] {
            let mut view = TreeView::new(style, renderer);
            view.render_document(&doc, &mut index, config.init_depth);
            views.register(view);
        }

        let engine = SearchEngine::new(&doc);
        debug!(
            nodes = doc.node_count(),
            indexed = engine.index().len(),
            rendered = index.len(),
            "document loaded"
        );

        Ok(ViewerSession {
            panel: SearchPanel::new(config.search_max_visible),
            drag: DragXPath::new(config.xpath_quote, config.cycle_mode),
            config,
            doc,
            index,
            views,
            engine,
        })
    }

    pub fn document(&self) -> &XmlDocument {
        &self.doc
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn view(&self, origin: ViewOrigin) -> Option<&TreeView> {
        self.views.get(origin)
    }

    /// Original node behind a host-visible id
    pub fn original_node(&self, id: NodeId) -> Option<NodeRef> {
        self.index.resolve(id)
    }

    pub fn node_id(&self, node: NodeRef) -> Option<NodeId> {
        self.index.get(node)
    }

    pub fn xpath_of(&self, id: NodeId) -> Option<&str> {
        self.doc.xpath_of(self.original_node(id)?)
    }

    fn view_key(&mut self, origin: ViewOrigin, id: NodeId) -> Option<ViewKey> {
        let node = self.index.resolve(id)?;
        self.views.get_mut(origin)?.rendered_node_for(&self.index, node)
    }

    pub fn expand(&mut self, origin: ViewOrigin, id: NodeId, recursive: bool) -> bool {
        let Some(key) = self.view_key(origin, id) else {
            return false;
        };
        let Some(view) = self.views.get_mut(origin) else {
            return false;
        };
        view.expand(&self.doc, &mut self.index, key, recursive);
        true
    }

    pub fn collapse(&mut self, origin: ViewOrigin, id: NodeId, recursive: bool) -> bool {
        let Some(key) = self.view_key(origin, id) else {
            return false;
        };
        let Some(view) = self.views.get_mut(origin) else {
            return false;
        };
        view.collapse(key, recursive);
        true
    }

    /// Apply a host interaction. Returns `false` when the id no longer
    /// resolves in the addressed view.
    pub fn handle(&mut self, event: HostEvent) -> bool {
        match event {
            HostEvent::SwitcherClick { view, id, alt } => {
                let Some(key) = self.view_key(view, id) else {
                    return false;
                };
                let Some(target) = self.views.get_mut(view) else {
                    return false;
                };
                target.toggle(&self.doc, &mut self.index, key, alt);
                true
            }
            HostEvent::NameClick { id, alt } => {
                let Some(key) = self.view_key(ViewOrigin::Main, id) else {
                    return false;
                };
                let Some(main) = self.views.get_mut(ViewOrigin::Main) else {
                    return false;
                };
                if main.tree().get(key).is_some_and(|v| v.collapsed) {
                    main.expand(&self.doc, &mut self.index, key, alt);
                } else {
                    self.select_and_dispatch(ViewOrigin::Main, key);
                }
                true
            }
            HostEvent::OutlineClick { id } => {
                let Some(key) = self.view_key(ViewOrigin::Outline, id) else {
                    return false;
                };
                self.select_and_dispatch(ViewOrigin::Outline, key);
                true
            }
        }
    }

    fn select_and_dispatch(&mut self, origin: ViewOrigin, key: ViewKey) {
        let Some(view) = self.views.get_mut(origin) else {
            return;
        };
        view.select(key);
        if let Some(node) = view.tree().get(key).map(|v| v.node) {
            self.views
                .dispatch(&self.doc, &mut self.index, FocusEvent::new(node, origin));
        }
    }

    /// Tell every view other than `origin` that `node` is focused
    pub fn focus(&mut self, node: NodeRef, origin: ViewOrigin) {
        if self.doc.node(node).is_none() {
            return;
        }
        self.views
            .dispatch(&self.doc, &mut self.index, FocusEvent::new(node, origin));
    }

    pub fn search(&mut self, query: &str) -> PanelUpdate {
        self.panel.perform(&mut self.engine, &self.doc, query)
    }

    pub fn panel(&self) -> &SearchPanel {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut SearchPanel {
        &mut self.panel
    }

    /// Focus the search result at `ix` (or the selected one) in both views
    pub fn apply_search_result(&mut self, ix: Option<usize>) -> Option<NodeRef> {
        let event = self.panel.apply(ix)?;
        self.views.dispatch(&self.doc, &mut self.index, event);
        Some(event.node)
    }

    /// Selected node of a view, as a host id
    pub fn selected(&self, origin: ViewOrigin) -> Option<NodeId> {
        let tree = self.views.get(origin)?.tree();
        tree.selected().and_then(|k| tree.get(k)).map(|v| v.id)
    }

    pub fn drag_text(&mut self, id: NodeId, attribute: Option<&str>, mods: Modifiers) -> Option<String> {
        let node = self.doc.node(self.index.resolve(id)?)?;
        let target = match attribute {
            Some(name) => DragTarget::AttributeName(name),
            None => DragTarget::NodeName,
        };
        self.drag.transfer_text(node, target, mods)
    }

    pub fn markup(&self, origin: ViewOrigin) -> Option<String> {
        Some(self.views.get(origin)?.markup())
    }

    pub fn node_markup(&mut self, origin: ViewOrigin, id: NodeId) -> Option<String> {
        let key = self.view_key(origin, id)?;
        self.views.get(origin)?.node_markup(key)
    }
}
