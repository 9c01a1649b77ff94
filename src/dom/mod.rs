//! DOM Module - Arena-based XML Document
//!
//! The original (source) side of the viewer:
//! - Arena allocation for nodes
//! - NodeRef (u32) indices for cache-friendly traversal
//! - Closed `NodeData` variant per node kind
//! - Namespace resolution stack and document-wide prefix table

pub mod document;
pub mod namespace;
pub mod node;

pub use crate::core::ParseError;
pub use document::XmlDocument;
pub use namespace::NamespaceMap;
pub use node::{NodeData, NodeKind, NodeRef, XmlAttribute, XmlNode, DOCUMENT_NODE};
