//! Per-net connectivity graph
//!
//! Holds the node pool and the "hard" edges that stand for copper that is
//! already on the board: track segments and the helper links found between
//! zones/pads and the positions they cover.

use indexmap::IndexMap;

use super::node::{NodeId, NodePool};
use crate::board::Point;

/// Handle to a hard edge; never reused within a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(u64);

/// Existing copper connection between two nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub weight: u64,
}

impl HardEdge {
    pub fn touches(&self, node: NodeId) -> bool {
        self.source == node || self.target == node
    }
}

/// Nodes plus hard edges of one net
#[derive(Debug, Default, Clone)]
pub struct Links {
    nodes: NodePool,
    edges: IndexMap<EdgeId, HardEdge>,
    next_edge: u64,
}

impl Links {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, pos: Point) -> NodeId {
        self.nodes.add_node(pos)
    }

    /// Free an unreferenced node together with every hard edge touching it
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        if !self.nodes.remove_node(id) {
            return false;
        }
        self.edges.retain(|_, edge| !edge.touches(id));
        true
    }

    pub fn add_connection(&mut self, a: NodeId, b: NodeId, weight: u64) -> EdgeId {
        debug_assert!(a != b, "hard edge must join two different nodes");
        debug_assert!(
            self.nodes.contains(a) && self.nodes.contains(b),
            "hard edge endpoints must be live nodes"
        );

        let id = EdgeId(self.next_edge);
        self.next_edge += 1;
        self.edges.insert(
            id,
            HardEdge {
                source: a,
                target: b,
                weight,
            },
        );
        id
    }

    /// Removes the edge; `None` if it is already gone
    pub fn remove_connection(&mut self, id: EdgeId) -> Option<HardEdge> {
        self.edges.shift_remove(&id)
    }

    pub fn connection(&self, id: EdgeId) -> Option<&HardEdge> {
        self.edges.get(&id)
    }

    /// Hard edges in insertion order
    pub fn connections(&self) -> impl Iterator<Item = &HardEdge> {
        self.edges.values()
    }

    pub fn connection_count(&self) -> usize {
        self.edges.len()
    }

    pub fn has_connection_between(&self, a: NodeId, b: NodeId) -> bool {
        self.edges
            .values()
            .any(|e| (e.source == a && e.target == b) || (e.source == b && e.target == a))
    }

    pub fn nodes(&self) -> &NodePool {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut NodePool {
        &mut self.nodes
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }
}
