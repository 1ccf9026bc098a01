//! Ratsnest of a single net
//!
//! Tracks which board items of one net are anchored to which nodes, keeps the
//! hard edges they imply, and recomputes the missing connections on demand.

use std::collections::{BTreeSet, HashSet};
use std::time::Instant;

use indexmap::IndexMap;

use super::filter::NodeFilter;
use super::links::{EdgeId, Links};
use super::mst::{self, RatsnestEdge};
use super::node::{Node, NodeId, NodePool};
use super::settings::RatsnestSettings;
use super::spatial::NodeIndex;
use crate::board::{
    BBox, BoardItem, ItemKind, ItemRef, ItemTypes, LayerSet, Pad, Point, Track, Via, Zone,
    ZonePolygon,
};

#[derive(Debug, Clone)]
struct PadData {
    node: NodeId,
    /// Helper links to copper under the pad, rebuilt on every update
    edges: Vec<EdgeId>,
    pad: Pad,
}

#[derive(Debug, Clone, Copy)]
struct TrackData {
    edge: EdgeId,
    start: NodeId,
    end: NodeId,
}

#[derive(Debug, Clone)]
struct ZonePoly {
    /// Representative outline vertex, flagged no-line
    node: NodeId,
    polygon: ZonePolygon,
    bbox: BBox,
}

#[derive(Debug, Clone)]
struct ZoneData {
    layers: LayerSet,
    polygons: Vec<ZonePoly>,
    /// Helper links to copper inside the zone, rebuilt on every update
    edges: Vec<EdgeId>,
}

/// Connectivity graph, item bookkeeping and solved ratsnest of one net
#[derive(Debug, Clone)]
pub struct RatsnestNet {
    links: Links,
    pads: IndexMap<u64, PadData>,
    vias: IndexMap<u64, NodeId>,
    tracks: IndexMap<u64, TrackData>,
    zones: IndexMap<u64, ZoneData>,
    rn_edges: Option<Vec<RatsnestEdge>>,
    dirty: bool,
    blocked: BTreeSet<NodeId>,
    simple: BTreeSet<NodeId>,
    max_substitution_rounds: usize,
}

impl Default for RatsnestNet {
    fn default() -> Self {
        Self::new()
    }
}

impl RatsnestNet {
    pub fn new() -> Self {
        Self::with_settings(&RatsnestSettings::default())
    }

    pub fn with_settings(settings: &RatsnestSettings) -> Self {
        Self {
            links: Links::new(),
            pads: IndexMap::new(),
            vias: IndexMap::new(),
            tracks: IndexMap::new(),
            zones: IndexMap::new(),
            rn_edges: None,
            dirty: false,
            blocked: BTreeSet::new(),
            simple: BTreeSet::new(),
            max_substitution_rounds: settings.max_substitution_rounds.max(1),
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn links(&self) -> &Links {
        &self.links
    }

    pub fn nodes(&self) -> &NodePool {
        self.links.nodes()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.links.nodes().get(id)
    }

    /// Solved ratsnest edges; `None` until the first update
    pub fn unconnected(&self) -> Option<&[RatsnestEdge]> {
        self.rn_edges.as_deref()
    }

    /// Endpoints of every solved ratsnest edge, for drawing
    pub fn ratsnest_lines(&self) -> Vec<(Point, Point)> {
        let nodes = self.links.nodes();
        self.unconnected()
            .unwrap_or_default()
            .iter()
            .filter_map(|e| Some((nodes.get(e.source)?.pos(), nodes.get(e.target)?.pos())))
            .collect()
    }

    /// Register an item; false if it cannot take part or is already tracked
    pub fn add_item(&mut self, item: BoardItem<'_>) -> bool {
        match item {
            BoardItem::Pad(pad) => self.add_pad(pad),
            BoardItem::Via(via) => self.add_via(via),
            BoardItem::Track(track) => self.add_track(track),
            BoardItem::Zone(zone) => self.add_zone(zone),
            // Footprints are expanded into pads by the board-wide store
            BoardItem::Module(_) => false,
        }
    }

    fn add_pad(&mut self, pad: &Pad) -> bool {
        // No ratsnest for pads without copper (e.g. mask-only or NPTH)
        if !pad.layers.has_copper() || self.pads.contains_key(&pad.id) {
            return false;
        }

        let node = self.links.add_node(pad.position);
        self.links.nodes_mut()[node].add_parent(ItemRef::new(ItemKind::Pad, pad.id), pad.layers.copper());
        self.pads.insert(
            pad.id,
            PadData {
                node,
                edges: Vec::new(),
                pad: pad.clone(),
            },
        );
        self.dirty = true;
        true
    }

    fn add_via(&mut self, via: &Via) -> bool {
        if self.vias.contains_key(&via.id) {
            return false;
        }

        let node = self.links.add_node(via.position);
        self.links.nodes_mut()[node].add_parent(ItemRef::new(ItemKind::Via, via.id), via.layers);
        self.vias.insert(via.id, node);
        self.dirty = true;
        true
    }

    fn add_track(&mut self, track: &Track) -> bool {
        if track.start == track.end || self.tracks.contains_key(&track.id) {
            return false;
        }

        let item = ItemRef::new(ItemKind::Track, track.id);
        let start = self.links.add_node(track.start);
        let end = self.links.add_node(track.end);
        self.links.nodes_mut()[start].add_parent(item, track.layers());
        self.links.nodes_mut()[end].add_parent(item, track.layers());

        let edge = self.links.add_connection(start, end, 0);
        self.tracks.insert(track.id, TrackData { edge, start, end });
        self.dirty = true;
        true
    }

    fn add_zone(&mut self, zone: &Zone) -> bool {
        if self.zones.contains_key(&zone.id) {
            return false;
        }

        let item = ItemRef::new(ItemKind::Zone, zone.id);
        let layers = zone.layers.copper();
        let mut polygons = Vec::with_capacity(zone.filled_polygons.len());

        // A zone without fill is still recorded as tracked
        for polygon in &zone.filled_polygons {
            let Some(bbox) = polygon.bbox() else {
                continue;
            };
            let node = self.links.add_node(polygon.outline[0]);
            let n = &mut self.links.nodes_mut()[node];
            n.add_parent(item, layers);
            // Ratsnest lines leaving a polygon corner look wrong
            n.set_no_line(true);

            polygons.push(ZonePoly {
                node,
                polygon: polygon.clone(),
                bbox,
            });
        }

        self.zones.insert(
            zone.id,
            ZoneData {
                layers,
                polygons,
                edges: Vec::new(),
            },
        );
        self.dirty = true;
        true
    }

    /// Unregister an item; false if it was not tracked
    pub fn remove_item(&mut self, item: ItemRef) -> bool {
        match item.kind {
            ItemKind::Pad => {
                let Some(data) = self.pads.shift_remove(&item.id) else {
                    return false;
                };
                for edge in data.edges {
                    self.links.remove_connection(edge);
                }
                self.release_node(data.node, item);
            }
            ItemKind::Via => {
                let Some(node) = self.vias.shift_remove(&item.id) else {
                    return false;
                };
                self.release_node(node, item);
            }
            ItemKind::Track => {
                let Some(data) = self.tracks.shift_remove(&item.id) else {
                    return false;
                };
                self.links.remove_connection(data.edge);
                self.release_node(data.start, item);
                self.release_node(data.end, item);
            }
            ItemKind::Zone => {
                let Some(data) = self.zones.shift_remove(&item.id) else {
                    return false;
                };
                for edge in data.edges {
                    self.links.remove_connection(edge);
                }
                for poly in data.polygons {
                    self.release_node(poly.node, item);
                }
            }
        }

        self.dirty = true;
        true
    }

    fn release_node(&mut self, id: NodeId, parent: ItemRef) {
        if let Some(node) = self.links.nodes_mut().get_mut(id) {
            node.remove_parent(parent);
            if parent.kind == ItemKind::Zone && !node.parents().any(|p| p.kind == ItemKind::Zone) {
                node.set_no_line(false);
            }
        }

        if self.links.remove_node(id) {
            self.clear_node(id);
        }
    }

    /// Forget everything that referred to a freed node
    fn clear_node(&mut self, id: NodeId) {
        if let Some(edges) = self.rn_edges.as_mut() {
            edges.retain(|e| !e.touches(id));
        }
        self.blocked.remove(&id);
        self.simple.remove(&id);
    }

    /// Recompute the ratsnest if anything changed since the last solve
    pub fn update(&mut self) {
        if !self.dirty && self.rn_edges.is_some() {
            return;
        }
        self.recompute();
    }

    /// Recompute helper links and the ratsnest unconditionally
    pub fn recompute(&mut self) {
        let start = Instant::now();

        // Positions do not change while helper links are rebuilt
        let index = NodeIndex::build(self.links.nodes());
        self.process_zones(&index);
        self.process_pads(&index);

        let mut edges = mst::solve(&mut self.links);
        for edge in edges.iter_mut() {
            *edge = self.validate_edge(*edge, &index);
        }

        tracing::trace!(
            "[Ratsnest] Net solved: {} nodes, {} hard edges, {} missing in {:?}",
            self.links.nodes().len(),
            self.links.connection_count(),
            edges.len(),
            start.elapsed()
        );

        self.rn_edges = Some(edges);
        self.dirty = false;
    }

    /// Link every zone polygon to the nodes it covers
    fn process_zones(&mut self, index: &NodeIndex) {
        for zone in self.zones.values_mut() {
            for edge in zone.edges.drain(..) {
                self.links.remove_connection(edge);
            }

            // Small polygons first: they are cheap and claim points early
            let mut order: Vec<usize> = (0..zone.polygons.len()).collect();
            order.sort_by_key(|&i| zone.polygons[i].bbox.area());
            let mut claimed: HashSet<NodeId> = HashSet::new();

            for poly in order.into_iter().map(|i| &zone.polygons[i]) {
                for candidate in index.in_box(&poly.bbox) {
                    if candidate == poly.node || claimed.contains(&candidate) {
                        continue;
                    }
                    let covered = self.links.nodes().get(candidate).is_some_and(|n| {
                        n.layers().intersects(zone.layers) && poly.polygon.contains(n.pos())
                    });
                    if covered {
                        zone.edges.push(self.links.add_connection(poly.node, candidate, 0));
                        claimed.insert(candidate);
                    }
                }
            }
        }
    }

    /// Link every pad to the nodes lying on its copper
    fn process_pads(&mut self, index: &NodeIndex) {
        for data in self.pads.values_mut() {
            for edge in data.edges.drain(..) {
                self.links.remove_connection(edge);
            }

            let layers = data.pad.layers.copper();
            for candidate in index.in_box(&data.pad.bbox()) {
                if candidate == data.node {
                    continue;
                }
                let touching = self.links.nodes().get(candidate).is_some_and(|n| {
                    n.layers().intersects(layers) && data.pad.hit_test(n.pos())
                });
                if touching {
                    data.edges.push(self.links.add_connection(data.node, candidate, 0));
                }
            }
        }
    }

    /// Move no-line endpoints to the nearest drawable node of the same component
    fn validate_edge(&self, edge: RatsnestEdge, index: &NodeIndex) -> RatsnestEdge {
        let nodes = self.links.nodes();
        let (mut source, mut target) = (edge.source, edge.target);
        let mut updated = false;
        let mut changed = false;

        for _ in 0..self.max_substitution_rounds {
            if changed || !nodes[source].is_line_target() {
                changed = false;
                if let Some(tag) = nodes[source].tag() {
                    let filter = NodeFilter::LineTargetSameTag(tag);
                    if let Some(node) = index.nearest(nodes, target, &filter) {
                        if node != source {
                            changed = true;
                            updated = true;
                            source = node;
                        }
                    }
                }
            }

            if changed || !nodes[target].is_line_target() {
                changed = false;
                if let Some(tag) = nodes[target].tag() {
                    let filter = NodeFilter::LineTargetSameTag(tag);
                    if let Some(node) = index.nearest(nodes, source, &filter) {
                        if node != target {
                            changed = true;
                            updated = true;
                            target = node;
                        }
                    }
                }
            }

            if !changed {
                break;
            }
        }

        debug_assert!(source != target, "ratsnest edge collapsed to a point");
        debug_assert!(
            nodes[source].tag() != nodes[target].tag(),
            "substitution crossed component boundaries"
        );

        if !updated {
            return edge;
        }
        RatsnestEdge {
            source,
            target,
            weight: nodes[source].pos().distance_2(&nodes[target].pos()),
            tag: edge.tag,
        }
    }

    /// Closest node to `node` accepted by `filter`
    pub fn get_closest_node(&self, node: NodeId, filter: &NodeFilter) -> Option<NodeId> {
        let origin = self.node(node)?.pos();
        self.links
            .nodes()
            .iter()
            .filter(|(id, n)| *id != node && filter.matches(n))
            .min_by_key(|(_, n)| (n.pos().distance_2(&origin), n.pos()))
            .map(|(id, _)| id)
    }

    /// Nodes accepted by `filter`, nearest first; `count == 0` returns all
    pub fn get_closest_nodes(&self, node: NodeId, filter: &NodeFilter, count: usize) -> Vec<NodeId> {
        let Some(origin) = self.node(node).map(Node::pos) else {
            return Vec::new();
        };

        let mut found: Vec<(u64, Point, NodeId)> = self
            .links
            .nodes()
            .iter()
            .filter(|(id, n)| *id != node && filter.matches(n))
            .map(|(id, n)| (n.pos().distance_2(&origin), n.pos(), id))
            .collect();
        found.sort_unstable_by_key(|(d, p, _)| (*d, *p));

        if count > 0 {
            found.truncate(count);
        }
        found.into_iter().map(|(_, _, id)| id).collect()
    }

    /// Nodes an item is anchored to (both ends for tracks)
    pub fn get_nodes(&self, item: ItemRef) -> Vec<NodeId> {
        match item.kind {
            ItemKind::Pad => self.pads.get(&item.id).map(|d| vec![d.node]).unwrap_or_default(),
            ItemKind::Via => self.vias.get(&item.id).map(|&n| vec![n]).unwrap_or_default(),
            ItemKind::Track => self
                .tracks
                .get(&item.id)
                .map(|d| vec![d.start, d.end])
                .unwrap_or_default(),
            ItemKind::Zone => self
                .zones
                .get(&item.id)
                .map(|d| d.polygons.iter().map(|p| p.node).collect())
                .unwrap_or_default(),
        }
    }

    /// Every tracked item of the selected kinds
    pub fn get_all_items(&self, types: ItemTypes) -> Vec<ItemRef> {
        let mut out = Vec::new();
        if types.contains(ItemTypes::PADS) {
            out.extend(self.pads.keys().map(|&id| ItemRef::new(ItemKind::Pad, id)));
        }
        if types.contains(ItemTypes::VIAS) {
            out.extend(self.vias.keys().map(|&id| ItemRef::new(ItemKind::Via, id)));
        }
        if types.contains(ItemTypes::TRACKS) {
            out.extend(self.tracks.keys().map(|&id| ItemRef::new(ItemKind::Track, id)));
        }
        if types.contains(ItemTypes::ZONES) {
            out.extend(self.zones.keys().map(|&id| ItemRef::new(ItemKind::Zone, id)));
        }
        out
    }

    /// Items sharing a copper component with `item` (including itself)
    pub fn get_connected_items(&self, item: ItemRef, types: ItemTypes) -> Vec<ItemRef> {
        // Every polygon of a zone may sit on its own component
        let tags: BTreeSet<u32> = self
            .get_nodes(item)
            .into_iter()
            .filter_map(|id| self.node(id)?.tag())
            .collect();
        if tags.is_empty() {
            return Vec::new();
        }
        let has_tag = |id: NodeId| self.node(id).and_then(Node::tag).is_some_and(|t| tags.contains(&t));

        let mut out = Vec::new();
        if types.contains(ItemTypes::PADS) {
            out.extend(
                self.pads
                    .iter()
                    .filter(|(_, d)| has_tag(d.node))
                    .map(|(&id, _)| ItemRef::new(ItemKind::Pad, id)),
            );
        }
        if types.contains(ItemTypes::VIAS) {
            out.extend(
                self.vias
                    .iter()
                    .filter(|(_, &n)| has_tag(n))
                    .map(|(&id, _)| ItemRef::new(ItemKind::Via, id)),
            );
        }
        if types.contains(ItemTypes::TRACKS) {
            out.extend(
                self.tracks
                    .iter()
                    .filter(|(_, d)| has_tag(d.start))
                    .map(|(&id, _)| ItemRef::new(ItemKind::Track, id)),
            );
        }
        if types.contains(ItemTypes::ZONES) {
            out.extend(
                self.zones
                    .iter()
                    .filter(|(_, d)| d.polygons.iter().any(|p| has_tag(p.node)))
                    .map(|(&id, _)| ItemRef::new(ItemKind::Zone, id)),
            );
        }
        out
    }

    /// Both items are tracked here and share a copper component
    pub fn are_connected(&self, a: ItemRef, b: ItemRef) -> bool {
        match (self.item_tag(a), self.item_tag(b)) {
            (Some(ta), Some(tb)) => ta == tb,
            _ => false,
        }
    }

    fn item_tag(&self, item: ItemRef) -> Option<u32> {
        let first = *self.get_nodes(item).first()?;
        self.node(first)?.tag()
    }

    /// Block an item's nodes as ratsnest targets and remember its free ends
    pub fn add_simple(&mut self, item: ItemRef) {
        for node in self.get_nodes(item) {
            self.add_blocked_node(node);

            // Junctions are not free ends
            if self.node(node).is_some_and(|n| n.ref_count() == 1) {
                self.simple.insert(node);
            }
        }
    }

    pub fn add_blocked(&mut self, item: ItemRef) {
        for node in self.get_nodes(item) {
            self.add_blocked_node(node);
        }
    }

    pub fn add_blocked_node(&mut self, id: NodeId) {
        if let Some(node) = self.links.nodes_mut().get_mut(id) {
            node.set_blocked(true);
            self.blocked.insert(id);
        }
    }

    /// Undo every `add_simple`/`add_blocked` call
    pub fn clear_simple(&mut self) {
        for &id in &self.blocked {
            if let Some(node) = self.links.nodes_mut().get_mut(id) {
                node.set_blocked(false);
            }
        }
        self.blocked.clear();
        self.simple.clear();
    }

    /// Free ends recorded by `add_simple`
    pub fn simple_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.simple.iter().copied()
    }

    pub fn blocked_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.blocked.iter().copied()
    }

    /// Drop all items and results, keeping the settings
    pub fn clear(&mut self) {
        self.links.clear();
        self.pads.clear();
        self.vias.clear();
        self.tracks.clear();
        self.zones.clear();
        self.rn_edges = None;
        self.dirty = false;
        self.blocked.clear();
        self.simple.clear();
    }
}
