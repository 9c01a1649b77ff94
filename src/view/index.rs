//! Node identity
//!
//! `NodeIndex` hands out `NodeId`s for original nodes the first time they
//! are rendered and maps them back. Every index instance draws a fresh
//! generation from a process-wide counter, so an id minted for one loaded
//! document never resolves against another.

use crate::dom::NodeRef;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_GENERATION: AtomicU32 = AtomicU32::new(1);

fn next_generation() -> u32 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// Opaque, process-unique node identifier: generation in the high 32 bits,
/// sequence number in the low 32 bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    fn new(generation: u32, sequence: u32) -> Self {
        NodeId((u64::from(generation) << 32) | u64::from(sequence))
    }

    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    #[inline]
    pub fn sequence(self) -> u32 {
        self.0 as u32
    }

    /// Raw value, as handed to the host
    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Rebuild an id received from the host. Unknown values simply fail to resolve.
    #[inline]
    pub fn from_u64(raw: u64) -> Self {
        NodeId(raw)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bidirectional NodeRef <-> NodeId mapping for one loaded document
#[derive(Debug)]
pub struct NodeIndex {
    generation: u32,
    ids: HashMap<NodeRef, NodeId>,
    /// Sequence number -> node
    nodes: Vec<NodeRef>,
}

impl Default for NodeIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeIndex {
    pub fn new() -> Self {
        NodeIndex {
            generation: next_generation(),
            ids: HashMap::new(),
            nodes: Vec::new(),
        }
    }

    /// Existing id for `node`, or the next sequential one
    pub fn id_of(&mut self, node: NodeRef) -> NodeId {
        if let Some(&id) = self.ids.get(&node) {
            return id;
        }
        let id = NodeId::new(self.generation, self.nodes.len() as u32);
        self.nodes.push(node);
        self.ids.insert(node, id);
        id
    }

    /// Id for `node` if one was already assigned
    pub fn get(&self, node: NodeRef) -> Option<NodeId> {
        self.ids.get(&node).copied()
    }

    /// Original node for `id`; `None` for unknown ids and ids of other generations
    pub fn resolve(&self, id: NodeId) -> Option<NodeRef> {
        if id.generation() != self.generation {
            return None;
        }
        self.nodes.get(id.sequence() as usize).copied()
    }

    /// Start a new id space; every previously issued id stops resolving
    pub fn reset(&mut self) {
        self.generation = next_generation();
        self.ids.clear();
        self.nodes.clear();
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
