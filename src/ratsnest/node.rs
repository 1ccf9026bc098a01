//! Geometric node pool
//!
//! Every board position that anchors a pad, via, track end or zone outline is
//! represented by exactly one node per net. Nodes live in a slab and are
//! referred to through [`NodeId`] handles; a node is freed once the last item
//! anchored to it lets go.

use std::collections::HashMap;
use std::ops::{Index, IndexMut};

use crate::board::{ItemRef, LayerSet, Point};

/// Stable handle to a node in a [`NodePool`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A shared board position
#[derive(Debug, Clone)]
pub struct Node {
    pos: Point,
    parents: Vec<(ItemRef, LayerSet)>,
    tag: Option<u32>,
    no_line: bool,
    blocked: bool,
}

impl Node {
    fn new(pos: Point) -> Self {
        Self {
            pos,
            parents: Vec::new(),
            tag: None,
            no_line: false,
            blocked: false,
        }
    }

    pub fn pos(&self) -> Point {
        self.pos
    }

    /// Number of board items anchored here
    pub fn ref_count(&self) -> usize {
        self.parents.len()
    }

    /// Union of the layers of all anchored items
    pub fn layers(&self) -> LayerSet {
        self.parents
            .iter()
            .fold(LayerSet::EMPTY, |acc, (_, layers)| acc | *layers)
    }

    pub fn parents(&self) -> impl Iterator<Item = ItemRef> + '_ {
        self.parents.iter().map(|(item, _)| *item)
    }

    /// Connected component id from the last solve
    pub fn tag(&self) -> Option<u32> {
        self.tag
    }

    pub fn set_tag(&mut self, tag: u32) {
        self.tag = Some(tag);
    }

    pub fn no_line(&self) -> bool {
        self.no_line
    }

    pub fn set_no_line(&mut self, no_line: bool) {
        self.no_line = no_line;
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub(crate) fn set_blocked(&mut self, blocked: bool) {
        self.blocked = blocked;
    }

    /// May terminate a drawn ratsnest line
    pub fn is_line_target(&self) -> bool {
        !self.no_line && !self.blocked
    }

    pub fn add_parent(&mut self, item: ItemRef, layers: LayerSet) {
        self.parents.push((item, layers));
    }

    /// Drop one anchor of `item`; false if it was not anchored here
    pub fn remove_parent(&mut self, item: ItemRef) -> bool {
        match self.parents.iter().position(|(p, _)| *p == item) {
            Some(i) => {
                self.parents.swap_remove(i);
                true
            }
            None => false,
        }
    }
}

/// Position-keyed node set of one net
#[derive(Debug, Default, Clone)]
pub struct NodePool {
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
    by_pos: HashMap<Point, NodeId>,
}

impl NodePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing node at `pos`, or a fresh one
    pub fn add_node(&mut self, pos: Point) -> NodeId {
        if let Some(&id) = self.by_pos.get(&pos) {
            return id;
        }

        let id = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(Node::new(pos));
                NodeId(slot)
            }
            None => {
                self.slots.push(Some(Node::new(pos)));
                NodeId(self.slots.len() - 1)
            }
        };
        self.by_pos.insert(pos, id);
        id
    }

    /// Free the node if nothing is anchored to it any more
    ///
    /// Returns true when the node was removed; the caller must then purge
    /// anything else that refers to it.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        let unreferenced = matches!(self.get(id), Some(node) if node.ref_count() == 0);
        if !unreferenced {
            return false;
        }

        if let Some(node) = self.slots[id.index()].take() {
            self.by_pos.remove(&node.pos);
            self.free.push(id.0);
        }
        true
    }

    pub fn find(&self, pos: Point) -> Option<NodeId> {
        self.by_pos.get(&pos).copied()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.by_pos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_pos.is_empty()
    }

    /// Live nodes in slab order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|n| (NodeId(i), n)))
    }

    /// Live node ids ordered by position, independent of insertion history
    pub fn sorted_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<(Point, NodeId)> = self.by_pos.iter().map(|(p, id)| (*p, *id)).collect();
        ids.sort_unstable_by_key(|(p, _)| *p);
        ids.into_iter().map(|(_, id)| id).collect()
    }

    /// Upper bound for dense per-node side tables indexed by [`NodeId::index`]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.by_pos.clear();
    }
}

impl Index<NodeId> for NodePool {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        match self.get(id) {
            Some(node) => node,
            None => unreachable!("stale node handle {:?}", id),
        }
    }
}

impl IndexMut<NodeId> for NodePool {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        match self.get_mut(id) {
            Some(node) => node,
            None => unreachable!("stale node handle {:?}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{ItemKind, F_CU};

    fn pad_ref(id: u64) -> ItemRef {
        ItemRef::new(ItemKind::Pad, id)
    }

    #[test]
    fn test_nodes_are_deduplicated_by_position() {
        let mut pool = NodePool::new();
        let a = pool.add_node(Point::new(10, 20));
        let b = pool.add_node(Point::new(10, 20));
        let c = pool.add_node(Point::new(11, 20));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_remove_only_when_unreferenced() {
        let mut pool = NodePool::new();
        let id = pool.add_node(Point::new(0, 0));
        pool[id].add_parent(pad_ref(1), LayerSet::single(F_CU));
        pool[id].add_parent(pad_ref(2), LayerSet::single(F_CU));

        assert!(!pool.remove_node(id), "still referenced twice");
        assert!(pool[id].remove_parent(pad_ref(1)));
        assert!(!pool.remove_node(id), "still referenced once");
        assert!(pool[id].remove_parent(pad_ref(2)));
        assert!(pool.remove_node(id));
        assert!(pool.is_empty());
        assert!(pool.find(Point::new(0, 0)).is_none());
    }

    #[test]
    fn test_freed_slots_are_reused() {
        let mut pool = NodePool::new();
        let a = pool.add_node(Point::new(0, 0));
        assert!(pool.remove_node(a));
        let b = pool.add_node(Point::new(5, 5));
        assert_eq!(a.index(), b.index());
        assert_eq!(pool[b].pos(), Point::new(5, 5));
    }

    #[test]
    fn test_ids_follow_slab_growth() {
        let mut pool = NodePool::new();
        let ids: Vec<NodeId> = (0..5).map(|i| pool.add_node(Point::new(i, 0))).collect();
        assert_eq!(ids.iter().map(|id| id.index()).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
        assert_eq!(pool.capacity(), 5);

        assert!(pool.remove_node(ids[1]));
        let reused = pool.add_node(Point::new(9, 9));
        let fresh = pool.add_node(Point::new(10, 10));
        assert_eq!(reused.index(), 1);
        assert_eq!(fresh.index(), 5);
        assert!(pool.iter().all(|(id, n)| pool[id].pos() == n.pos()));
    }

    #[test]
    fn test_sorted_ids_ignore_insertion_order() {
        let mut first = NodePool::new();
        let mut second = NodePool::new();
        let points = [Point::new(3, 1), Point::new(-2, 7), Point::new(3, 0)];

        for p in points {
            first.add_node(p);
        }
        for p in points.iter().rev() {
            second.add_node(*p);
        }

        let pos = |pool: &NodePool| -> Vec<Point> {
            pool.sorted_ids().into_iter().map(|id| pool[id].pos()).collect()
        };
        assert_eq!(pos(&first), pos(&second));
        assert_eq!(pos(&first)[0], Point::new(-2, 7));
    }
}
