//! Board model consumed by the ratsnest engine
//!
//! # Submodules
//! - `geometry` - Integer points, boxes and polygon containment
//! - `layers` - Layer id sets
//! - `types` - Pads, vias, tracks, zones, modules and the board container

mod geometry;
mod layers;
mod types;

pub use geometry::{ring_boundary_contains, ring_contains, BBox, Point};
pub use layers::{LayerSet, B_CU, COPPER_LAYER_COUNT, F_CU};
pub use types::{
    Board, BoardItem, ItemKind, ItemRef, ItemTypes, Module, Pad, PadShape, Track, Via, Zone,
    ZonePolygon, UNCONNECTED_NET,
};
