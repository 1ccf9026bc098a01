// Board-wide store: full rebuilds, incremental edits and parallel recalculation
use pcb_ratsnest::board::{
    Board, BoardItem, ItemKind, ItemRef, ItemTypes, LayerSet, Module, Pad, PadShape, Point, Track,
    F_CU,
};
use pcb_ratsnest::ratsnest::{RatsnestData, RatsnestSettings};
use std::time::Instant;

#[cfg(test)]
mod tests {
    use super::*;

    fn load_fixture() -> Board {
        let text = std::fs::read_to_string("tests/fixtures/two_nets.json").expect("Failed to read fixture");
        serde_json::from_str(&text).expect("Failed to parse fixture")
    }

    /// Deterministic board with `nets` nets laid out as rows of pads
    fn grid_board(nets: u32, pads_per_net: u32) -> Board {
        let mut modules = Vec::new();
        let mut tracks = Vec::new();
        let mut next_id = 1u64;

        for net in 1..=nets {
            let mut pads = Vec::new();
            for i in 0..pads_per_net {
                // Jitter keeps the rows from being perfectly collinear
                let x = (i as i32) * 1000 + ((i * 7 + net * 3) % 11) as i32 * 13;
                let y = (net as i32) * 1500 + ((i * 5) % 9) as i32 * 40;
                pads.push(Pad {
                    id: next_id,
                    net_code: net,
                    position: Point::new(x, y),
                    layers: LayerSet::single(F_CU),
                    shape: PadShape::Circle { radius: 50 },
                });
                next_id += 1;
            }
            // Join every third pair with copper
            for pair in pads.windows(2).step_by(3) {
                tracks.push(Track {
                    id: next_id,
                    net_code: net,
                    start: pair[0].position,
                    end: pair[1].position,
                    width: 20,
                    layer: F_CU,
                });
                next_id += 1;
            }
            modules.push(Module {
                id: net as u64,
                reference: format!("U{}", net),
                pads,
            });
        }

        Board {
            net_count: nets + 1,
            modules,
            tracks,
            vias: Vec::new(),
            zones: Vec::new(),
        }
    }

    fn all_lines(data: &RatsnestData) -> Vec<Vec<(Point, Point)>> {
        (0..data.net_count() as u32)
            .map(|code| {
                let mut lines: Vec<(Point, Point)> = data
                    .net(code)
                    .map(|n| n.ratsnest_lines())
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(a, b)| (a.min(b), a.max(b)))
                    .collect();
                lines.sort();
                lines
            })
            .collect()
    }

    #[test]
    fn test_process_fixture_board() {
        let board = load_fixture();
        let mut data = RatsnestData::default();
        data.process_board(&board);

        assert_eq!(data.net_count(), 3);
        assert_eq!(data.get_unconnected_count(), 2);

        assert_eq!(all_lines(&data)[1], vec![(Point::new(1000, 0), Point::new(2000, 0))]);

        // Via on pad 3 shares its node
        let net2 = data.net(2).unwrap();
        assert_eq!(net2.nodes().len(), 2);
        assert_eq!(net2.get_all_items(ItemTypes::ALL).len(), 3);

        // Net 0 pad is never tracked
        assert!(data.net(0).unwrap().get_all_items(ItemTypes::ALL).is_empty());

        let pads: Vec<&Pad> = board.pads().collect();
        assert!(data.are_connected(BoardItem::Pad(pads[0]), BoardItem::Pad(pads[1])));
        assert!(!data.are_connected(BoardItem::Pad(pads[0]), BoardItem::Pad(pads[4])));
    }

    #[test]
    fn test_rebuild_is_repeatable() {
        let board = grid_board(5, 9);
        let mut data = RatsnestData::default();
        data.process_board(&board);
        let first = all_lines(&data);
        let count = data.get_unconnected_count();

        data.process_board(&board);
        assert_eq!(all_lines(&data), first);
        assert_eq!(data.get_unconnected_count(), count);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let board = grid_board(24, 30);

        let mut sequential = RatsnestData::new(RatsnestSettings {
            parallel_threshold: usize::MAX,
            ..RatsnestSettings::default()
        });
        let start = Instant::now();
        sequential.process_board(&board);
        let seq_time = start.elapsed();

        let mut parallel = RatsnestData::new(RatsnestSettings {
            parallel_threshold: 1,
            ..RatsnestSettings::default()
        });
        let start = Instant::now();
        parallel.process_board(&board);
        let par_time = start.elapsed();

        assert_eq!(all_lines(&sequential), all_lines(&parallel));
        assert_eq!(sequential.get_unconnected_count(), parallel.get_unconnected_count());

        // 30 pads, 10 tracks joining disjoint pairs: 20 clusters per net
        assert_eq!(parallel.get_unconnected_count(), 24 * 19);

        println!("Sequential: {:.3}ms", seq_time.as_secs_f64() * 1000.0);
        println!("Parallel:   {:.3}ms", par_time.as_secs_f64() * 1000.0);
    }

    #[test]
    fn test_incremental_edit_matches_rebuild() {
        let mut board = grid_board(3, 8);
        let mut data = RatsnestData::default();
        data.process_board(&board);

        let new_track = Track {
            id: 10_000,
            net_code: 2,
            start: board.modules[1].pads[2].position,
            end: board.modules[1].pads[3].position,
            width: 20,
            layer: F_CU,
        };
        let before = data.get_unconnected_count();
        assert!(data.add(BoardItem::Track(&new_track)));
        assert!(data.net(2).unwrap().is_dirty());
        data.recalculate(None);
        assert_eq!(data.get_unconnected_count(), before - 1);

        board.tracks.push(new_track);
        let mut rebuilt = RatsnestData::default();
        rebuilt.process_board(&board);
        assert_eq!(all_lines(&data), all_lines(&rebuilt));
    }

    #[test]
    fn test_module_operations() {
        let board = grid_board(2, 4);
        let mut data = RatsnestData::default();
        data.process_board(&board);

        let module = &board.modules[0];
        let connected = data.get_connected_items(BoardItem::Pad(&module.pads[0]), ItemTypes::PADS);
        assert!(connected.contains(&ItemRef::new(ItemKind::Pad, module.pads[1].id)));

        data.add_simple(BoardItem::Module(module));
        assert!(data.net(1).unwrap().blocked_nodes().count() >= module.pads.len());
        data.clear_simple();
        assert_eq!(data.net(1).unwrap().blocked_nodes().count(), 0);

        assert!(data.remove(BoardItem::Module(module)));
        data.recalculate(None);
        assert!(data.get_net_items(1, ItemTypes::PADS).is_empty());
        // Tracks of net 1 stay behind without their pads
        assert_eq!(data.get_net_items(1, ItemTypes::TRACKS).len(), 1);
    }
}
