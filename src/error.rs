//! Viewer errors

use crate::dom::ParseError;

#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("document is not well-formed: {0}")]
    Parse(#[from] ParseError),

    #[error("no document loaded")]
    NoDocument,

    #[error("session lock poisoned")]
    Poisoned,
}
