//! Search popup state
//!
//! Tracks the last query, its results and the keyboard selection. Applying
//! a result produces a focus event for the other views.

use super::engine::{ScalarValue, SearchEngine, SearchOutcome, SearchResult};
use super::query::normalize;
use crate::dom::XmlDocument;
use crate::focus::{FocusEvent, ViewOrigin};
use crate::xpath::XPathEvaluator;

/// Rows shown before the result list scrolls
pub const DEFAULT_MAX_VISIBLE: usize = 20;

/// What the host should do with the popup after a query
#[derive(Debug, Clone, PartialEq)]
pub enum PanelUpdate {
    /// Query was empty or matched nothing
    Hidden,
    /// Same query as the one on screen
    Unchanged,
    /// Show the result list; `overflow` when it exceeds the visible rows
    Results { count: usize, overflow: bool },
    /// A single XPath scalar, shown in place of a list
    Inline(ScalarValue),
}

#[derive(Debug)]
pub struct SearchPanel {
    visible: bool,
    last_query: Option<String>,
    last_search: Option<SearchOutcome>,
    selected: usize,
    max_visible: usize,
}

impl Default for SearchPanel {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_VISIBLE)
    }
}

impl SearchPanel {
    pub fn new(max_visible: usize) -> Self {
        SearchPanel {
            visible: false,
            last_query: None,
            last_search: None,
            selected: 0,
            max_visible,
        }
    }

    pub fn perform<E: XPathEvaluator>(
        &mut self,
        engine: &mut SearchEngine<E>,
        doc: &XmlDocument,
        raw_query: &str,
    ) -> PanelUpdate {
        let query = normalize(raw_query);
        if query.is_empty() {
            self.hide();
            return PanelUpdate::Hidden;
        }
        if self.visible && self.last_query.as_deref() == Some(query.as_str()) {
            return PanelUpdate::Unchanged;
        }

        let outcome = engine.search(doc, &query);
        self.last_query = Some(query);
        self.selected = 0;

        let update = match outcome.results.as_deref() {
            None => PanelUpdate::Hidden,
            Some([SearchResult::Scalar(value)]) => PanelUpdate::Inline(value.clone()),
            Some(results) => PanelUpdate::Results {
                count: results.len(),
                overflow: results.len() > self.max_visible,
            },
        };
        self.visible = update != PanelUpdate::Hidden;
        self.last_search = Some(outcome);
        update
    }

    pub fn results(&self) -> &[SearchResult] {
        self.last_search
            .as_ref()
            .and_then(|s| s.results.as_deref())
            .unwrap_or(&[])
    }

    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_result(&self) -> Option<&SearchResult> {
        self.results().get(self.selected)
    }

    /// Move the selection, clamped into the result range
    pub fn select(&mut self, ix: isize) -> usize {
        let last = self.results().len().saturating_sub(1);
        self.selected = usize::try_from(ix.max(0)).unwrap_or(0).min(last);
        self.selected
    }

    pub fn select_next(&mut self) -> usize {
        self.select(self.selected as isize + 1)
    }

    pub fn select_previous(&mut self) -> usize {
        self.select(self.selected as isize - 1)
    }

    /// Focus the result at `ix` (or the selected one) and close the popup
    pub fn apply(&mut self, ix: Option<usize>) -> Option<FocusEvent> {
        let ix = ix.unwrap_or(self.selected);
        let node = self.results().get(ix)?.node()?;
        self.hide();
        Some(FocusEvent::new(node, ViewOrigin::Search))
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn max_visible(&self) -> usize {
        self.max_visible
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }
}
