//! Net connectivity and ratsnest computation for printed circuit boards
//!
//! [`board`] holds the item model (pads, vias, tracks, zones, footprints) and
//! [`ratsnest`] the engine that tracks which copper is already joined and
//! which connections are still missing on every net.

pub mod board;
pub mod ratsnest;

pub use board::{Board, BoardItem, ItemKind, ItemRef, ItemTypes};
pub use ratsnest::{NodeFilter, RatsnestData, RatsnestEdge, RatsnestNet, RatsnestSettings};
