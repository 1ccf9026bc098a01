//! Spatial index over a net's nodes
//!
//! R-tree of node positions used for zone/pad hit-testing candidates and for
//! nearest-node searches while validating ratsnest edges. The index is a
//! snapshot: rebuild it after nodes are added or removed.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use super::filter::NodeFilter;
use super::node::{NodeId, NodePool};
use crate::board::{BBox, Point};

/// Node wrapper for R-tree spatial indexing
#[derive(Clone, Copy, Debug)]
pub struct NodeEntry {
    pub id: NodeId,
    pub pos: [i64; 2],
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[i64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.pos)
    }
}

impl PointDistance for NodeEntry {
    fn distance_2(&self, point: &[i64; 2]) -> i64 {
        let dx = self.pos[0] - point[0];
        let dy = self.pos[1] - point[1];
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }
}

fn to_rstar(p: Point) -> [i64; 2] {
    [i64::from(p.x), i64::from(p.y)]
}

/// Snapshot index of node positions
pub struct NodeIndex {
    tree: RTree<NodeEntry>,
}

impl NodeIndex {
    pub fn build(nodes: &NodePool) -> Self {
        let entries: Vec<NodeEntry> = nodes
            .sorted_ids()
            .into_iter()
            .map(|id| NodeEntry {
                id,
                pos: to_rstar(nodes[id].pos()),
            })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Nodes inside `bbox` (inclusive), ordered by id
    pub fn in_box(&self, bbox: &BBox) -> Vec<NodeId> {
        let envelope = AABB::from_corners(to_rstar(bbox.min), to_rstar(bbox.max));
        let mut ids: Vec<NodeId> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|e| e.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Nearest node to `origin` (excluding it) accepted by `filter`
    pub fn nearest(
        &self,
        nodes: &NodePool,
        origin: NodeId,
        filter: &NodeFilter,
    ) -> Option<NodeId> {
        let pos = to_rstar(nodes.get(origin)?.pos());
        self.tree
            .nearest_neighbor_iter(&pos)
            .filter(|e| e.id != origin)
            .find(|e| nodes.get(e.id).is_some_and(|n| filter.matches(n)))
            .map(|e| e.id)
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_box_and_nearest() {
        let mut pool = NodePool::new();
        let a = pool.add_node(Point::new(0, 0));
        let b = pool.add_node(Point::new(10, 0));
        let c = pool.add_node(Point::new(100, 100));
        pool[b].set_no_line(true);

        let index = NodeIndex::build(&pool);
        assert_eq!(index.len(), 3);

        let hits = index.in_box(&BBox::around(Point::new(5, 0), 5, 5));
        assert_eq!(hits.len(), 2);
        assert!(hits.contains(&a) && hits.contains(&b));

        assert_eq!(index.nearest(&pool, a, &NodeFilter::Any), Some(b));
        assert_eq!(index.nearest(&pool, a, &NodeFilter::LineTarget), Some(c));
    }
}
