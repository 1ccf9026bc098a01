//! Board-wide ratsnest store
//!
//! Owns one [`RatsnestNet`] per net code and routes item edits and queries to
//! the net that owns them. Net 0 is the unconnected net and never tracks items.

use std::time::Instant;

use rayon::prelude::*;

use super::net::RatsnestNet;
use super::settings::RatsnestSettings;
use crate::board::{Board, BoardItem, ItemRef, ItemTypes, UNCONNECTED_NET};

#[derive(Debug, Clone, Default)]
pub struct RatsnestData {
    nets: Vec<RatsnestNet>,
    settings: RatsnestSettings,
}

impl RatsnestData {
    pub fn new(settings: RatsnestSettings) -> Self {
        Self {
            nets: Vec::new(),
            settings,
        }
    }

    /// Number of net slots, including net 0
    pub fn net_count(&self) -> usize {
        self.nets.len()
    }

    /// Grow the store to hold at least `count` nets
    pub fn reserve_nets(&mut self, count: usize) {
        if self.nets.len() < count {
            let settings = &self.settings;
            self.nets.resize_with(count, || RatsnestNet::with_settings(settings));
        }
    }

    pub fn net(&self, net_code: u32) -> Option<&RatsnestNet> {
        self.nets.get(net_code as usize)
    }

    pub fn net_mut(&mut self, net_code: u32) -> Option<&mut RatsnestNet> {
        self.nets.get_mut(net_code as usize)
    }

    fn owning_net(&mut self, net_code: u32) -> &mut RatsnestNet {
        self.reserve_nets(net_code as usize + 1);
        &mut self.nets[net_code as usize]
    }

    /// Start tracking an item; modules are expanded into their pads
    pub fn add(&mut self, item: BoardItem<'_>) -> bool {
        if let BoardItem::Module(module) = item {
            for pad in &module.pads {
                self.add(BoardItem::Pad(pad));
            }
            return true;
        }

        match item.net_code() {
            Some(net) if net != UNCONNECTED_NET => self.owning_net(net).add_item(item),
            _ => false,
        }
    }

    /// Stop tracking an item; false if its net never knew it
    pub fn remove(&mut self, item: BoardItem<'_>) -> bool {
        if let BoardItem::Module(module) = item {
            for pad in &module.pads {
                self.remove(BoardItem::Pad(pad));
            }
            return true;
        }

        let (Some(net), Some(item_ref)) = (item.net_code(), item.item_ref()) else {
            return false;
        };
        if net == UNCONNECTED_NET {
            return false;
        }
        if net as usize >= self.nets.len() {
            self.reserve_nets(net as usize + 1);
            return false;
        }
        self.nets[net as usize].remove_item(item_ref)
    }

    /// Refresh an item after its geometry changed
    ///
    /// The item is looked up under its current net code, so a net change must
    /// be applied as an explicit `remove` before the edit and `add` after it.
    pub fn update(&mut self, item: BoardItem<'_>) -> bool {
        if !self.remove(item) {
            return false;
        }
        let added = self.add(item);
        debug_assert!(added, "item removed but could not be re-added");
        added
    }

    /// Rebuild every net from the board's current items and solve them all
    pub fn process_board(&mut self, board: &Board) {
        let start = Instant::now();

        for net in &mut self.nets {
            net.clear();
        }
        self.reserve_nets(board.net_count as usize);

        let declared = self.nets.len();
        let items = board
            .pads()
            .map(BoardItem::Pad)
            .chain(board.tracks.iter().map(BoardItem::Track))
            .chain(board.vias.iter().map(BoardItem::Via))
            .chain(board.zones.iter().map(BoardItem::Zone));

        let mut added = 0usize;
        for item in items {
            if let Some(net) = item.net_code() {
                if net as usize >= declared {
                    tracing::warn!(
                        "[Ratsnest] {:?} uses net {} beyond the board's {} nets",
                        item.item_ref(),
                        net,
                        declared
                    );
                }
            }
            if self.add(item) {
                added += 1;
            }
        }

        tracing::debug!(
            "[Ratsnest] Board loaded: {} items into {} nets in {:?}",
            added,
            self.nets.len(),
            start.elapsed()
        );

        self.recalculate(None);
    }

    /// Solve dirty nets, or one specific net unconditionally
    ///
    /// `None` and `Some(0)` mean every dirty net.
    pub fn recalculate(&mut self, net_code: Option<u32>) {
        match net_code {
            Some(net) if net != UNCONNECTED_NET => {
                if let Some(net) = self.net_mut(net) {
                    net.clear_simple();
                    net.recompute();
                }
            }
            _ => self.recalculate_dirty(),
        }
    }

    fn recalculate_dirty(&mut self) {
        let start = Instant::now();
        let dirty = self.nets.iter().skip(1).filter(|n| n.is_dirty()).count();
        if dirty == 0 {
            return;
        }

        let parallel = dirty >= self.settings.parallel_threshold;
        if parallel {
            self.nets
                .par_iter_mut()
                .skip(1)
                .filter(|n| n.is_dirty())
                .for_each(|net| {
                    net.clear_simple();
                    net.update();
                });
        } else {
            for net in self.nets.iter_mut().skip(1).filter(|n| n.is_dirty()) {
                net.clear_simple();
                net.update();
            }
        }

        tracing::debug!(
            "[Ratsnest] Recalculated {} dirty nets ({}) in {:?}",
            dirty,
            if parallel { "parallel" } else { "sequential" },
            start.elapsed()
        );
    }

    /// Missing connections across all nets
    pub fn get_unconnected_count(&self) -> usize {
        self.nets
            .iter()
            .skip(1)
            .filter_map(|n| n.unconnected())
            .map(<[_]>::len)
            .sum()
    }

    /// Both items are on one net and share a copper component
    pub fn are_connected(&self, a: BoardItem<'_>, b: BoardItem<'_>) -> bool {
        let (Some(net_a), Some(net_b)) = (a.net_code(), b.net_code()) else {
            return false;
        };
        if net_a != net_b || net_a == UNCONNECTED_NET {
            return false;
        }
        let (Some(ra), Some(rb)) = (a.item_ref(), b.item_ref()) else {
            return false;
        };
        self.net(net_a).is_some_and(|net| net.are_connected(ra, rb))
    }

    /// Items on the same copper component as `item`
    pub fn get_connected_items(&self, item: BoardItem<'_>, types: ItemTypes) -> Vec<ItemRef> {
        let (Some(net), Some(item_ref)) = (item.net_code(), item.item_ref()) else {
            return Vec::new();
        };
        if net == UNCONNECTED_NET {
            return Vec::new();
        }
        self.net(net)
            .map(|n| n.get_connected_items(item_ref, types))
            .unwrap_or_default()
    }

    /// Every tracked item of a net
    pub fn get_net_items(&self, net_code: u32, types: ItemTypes) -> Vec<ItemRef> {
        self.net(net_code)
            .map(|n| n.get_all_items(types))
            .unwrap_or_default()
    }

    /// Enter simple mode for an item (interactive drag preview)
    pub fn add_simple(&mut self, item: BoardItem<'_>) {
        self.route_simple(item, RatsnestNet::add_simple);
    }

    pub fn add_blocked(&mut self, item: BoardItem<'_>) {
        self.route_simple(item, RatsnestNet::add_blocked);
    }

    fn route_simple(&mut self, item: BoardItem<'_>, apply: fn(&mut RatsnestNet, ItemRef)) {
        if let BoardItem::Module(module) = item {
            for pad in &module.pads {
                self.route_simple(BoardItem::Pad(pad), apply);
            }
            return;
        }

        let (Some(net), Some(item_ref)) = (item.net_code(), item.item_ref()) else {
            return;
        };
        if net == UNCONNECTED_NET {
            return;
        }
        if let Some(net) = self.net_mut(net) {
            apply(net, item_ref);
        }
    }

    /// Leave simple mode on every net
    pub fn clear_simple(&mut self) {
        for net in &mut self.nets {
            net.clear_simple();
        }
    }
}
