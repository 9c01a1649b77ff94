//! Node search
//!
//! - `index`: flat, lowercased per-element search strings
//! - `query`: substring vs XPath classification
//! - `engine`: query execution and result labelling
//! - `panel`: popup selection state

pub mod engine;
pub mod index;
pub mod panel;
pub mod query;

pub use engine::{MatchKind, NodeMatch, ScalarValue, SearchEngine, SearchOutcome, SearchResult, MAX_RESULTS};
pub use index::{SearchEntry, SearchIndex};
pub use panel::{PanelUpdate, SearchPanel};
pub use query::{classify, QueryKind};
