//! Incremental ratsnest engine
//!
//! Keeps a per-net connectivity graph of item anchor points, closes it with
//! Delaunay candidates and Kruskal's algorithm, and reports the minimal set of
//! missing connections as ratsnest edges.
//!
//! # Submodules
//! - `node` - Position-deduplicated node pool
//! - `links` - Hard (copper) edges between nodes
//! - `filter` - Node predicates for closest-node queries
//! - `triangulate` - Delaunay candidate edges
//! - `mst` - Component tagging and ratsnest solving
//! - `spatial` - R-tree over node positions
//! - `settings` - Engine tunables
//! - `net` - Per-net manager
//! - `data` - Board-wide store

mod data;
mod filter;
mod links;
mod mst;
mod net;
mod node;
mod settings;
mod spatial;
mod triangulate;

pub use data::RatsnestData;
pub use filter::NodeFilter;
pub use links::{EdgeId, HardEdge, Links};
pub use mst::RatsnestEdge;
pub use net::RatsnestNet;
pub use node::{Node, NodeId, NodePool};
pub use settings::RatsnestSettings;
pub use spatial::NodeIndex;
pub use triangulate::delaunay_edges;
