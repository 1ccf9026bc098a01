//! Minimum spanning tree over existing copper plus Delaunay candidates
//!
//! Hard edges (weight zero) are merged first and only join components.
//! Every later merge is a missing connection and becomes a ratsnest edge.

use super::links::Links;
use super::node::NodeId;
use super::triangulate::delaunay_edges;

/// A missing connection between two copper components
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatsnestEdge {
    pub source: NodeId,
    pub target: NodeId,
    /// Squared length, only meaningful for ordering
    pub weight: u64,
    /// Component tag of the source side
    pub tag: u32,
}

impl RatsnestEdge {
    pub fn touches(&self, node: NodeId) -> bool {
        self.source == node || self.target == node
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    source: NodeId,
    target: NodeId,
    weight: u64,
}

/// Tag the net's nodes by copper component and compute the missing edges
pub fn solve(links: &mut Links) -> Vec<RatsnestEdge> {
    let ids = links.nodes().sorted_ids();

    match ids.len() {
        0 => Vec::new(),
        1 => {
            links.nodes_mut()[ids[0]].set_tag(0);
            Vec::new()
        }
        2 => solve_pair(links, ids[0], ids[1]),
        _ => {
            let positions: Vec<_> = ids.iter().map(|&id| links.nodes()[id].pos()).collect();

            // Existing copper goes first, the stable sort keeps it ahead of ties
            let mut candidates: Vec<Candidate> = links
                .connections()
                .map(|e| Candidate {
                    source: e.source,
                    target: e.target,
                    weight: e.weight,
                })
                .collect();

            candidates.extend(delaunay_edges(&positions).into_iter().map(|(a, b)| Candidate {
                source: ids[a],
                target: ids[b],
                weight: positions[a].distance_2(&positions[b]),
            }));

            kruskal(links, &ids, candidates)
        }
    }
}

fn solve_pair(links: &mut Links, a: NodeId, b: NodeId) -> Vec<RatsnestEdge> {
    if links.has_connection_between(a, b) {
        links.nodes_mut()[a].set_tag(0);
        links.nodes_mut()[b].set_tag(0);
        return Vec::new();
    }

    links.nodes_mut()[a].set_tag(0);
    links.nodes_mut()[b].set_tag(1);
    let weight = links.nodes()[a].pos().distance_2(&links.nodes()[b].pos());
    vec![RatsnestEdge {
        source: a,
        target: b,
        weight,
        tag: 0,
    }]
}

fn kruskal(links: &mut Links, ids: &[NodeId], mut candidates: Vec<Candidate>) -> Vec<RatsnestEdge> {
    let n = ids.len();
    let nodes = links.nodes_mut();

    // NodeId -> position in `ids`
    let mut local = vec![usize::MAX; nodes.capacity()];
    for (i, &id) in ids.iter().enumerate() {
        local[id.index()] = i;
        nodes[id].set_tag(i as u32);
    }

    let mut tags: Vec<usize> = (0..n).collect();
    let mut members: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();

    candidates.sort_by_key(|c| c.weight);

    let mut expected = n - 1;
    let mut mst = Vec::with_capacity(expected);
    let mut ratsnest_lines = false;

    for edge in candidates {
        if mst.len() >= expected {
            break;
        }

        let (s, t) = (local[edge.source.index()], local[edge.target.index()]);
        if s == usize::MAX || t == usize::MAX {
            debug_assert!(false, "edge references a node outside the net");
            continue;
        }

        let (src_tag, trg_tag) = (tags[s], tags[t]);
        if src_tag == trg_tag {
            continue;
        }

        // Sorted by weight: once a non-zero edge shows up, the rest are ratsnest
        if !ratsnest_lines && edge.weight != 0 {
            ratsnest_lines = true;
        }

        if ratsnest_lines {
            debug_assert!(
                nodes[edge.source].tag() != nodes[edge.target].tag(),
                "ratsnest edge inside one copper component"
            );
            mst.push(RatsnestEdge {
                source: edge.source,
                target: edge.target,
                weight: edge.weight,
                tag: nodes[edge.source].tag().unwrap_or(0),
            });
        } else {
            expected -= 1;
        }

        let (keep, gone) = if members[src_tag].len() >= members[trg_tag].len() {
            (src_tag, trg_tag)
        } else {
            (trg_tag, src_tag)
        };

        let moved = std::mem::take(&mut members[gone]);
        for &m in &moved {
            tags[m] = keep;
            // Node tags only follow copper, not the ratsnest that joins them
            if !ratsnest_lines {
                nodes[ids[m]].set_tag(keep as u32);
            }
        }
        members[keep].extend(moved);
    }

    mst
}
